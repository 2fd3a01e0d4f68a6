//! CLI binary for study-assistant.
//!
//! A thin shim over the library crate: `serve` runs the HTTP shell, `ask`
//! runs the pipeline once and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use study_assistant::config::{parse_origins, DEFAULT_MAX_UPLOAD_BYTES};
use study_assistant::pipeline::extract::read_pdf_file;
use study_assistant::{
    server, AppState, AssistantConfig, CompletionRequest, Mode, PdfTextExtractor, ServerConfig,
    StudyAssistant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP backend for the web front end
  study-assistant serve --port 4000

  # Quiz from a PDF
  study-assistant ask --mode quiz --file lecture.pdf

  # Summary of raw text, as JSON
  study-assistant ask --mode summary --text "Osmosis is ..." --json

MODES:
  quiz      multiple choice, true/false and short-answer questions
  summary   key points, main concepts, important details
  podcast   an engaging conversational script
  tutor     step-by-step explanation with examples and analogies

ENVIRONMENT VARIABLES:
  GROQ_API_KEY            Groq API key (required, starts with gsk_)
  GROQ_API_URL            Override the chat-completion endpoint
  GROQ_MODEL              Override the model ID
  PORT                    HTTP port for `serve` (default 4000)
  APP_ENV                 Environment label logged at startup
  CORS_ALLOWED_ORIGINS    Comma-separated origins allowed by CORS
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)

A .env file in the working directory is loaded first.
"#;

/// Generate quizzes, summaries, podcast scripts and tutoring from study material.
#[derive(Parser, Debug)]
#[command(
    name = "study-assistant",
    version,
    about = "Generate quizzes, summaries, podcast scripts and tutoring from study material",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "STUDY_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID.
    #[arg(long, global = true, env = "GROQ_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "STUDY_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "STUDY_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: u32,

    /// Whole-request timeout in seconds (none by default).
    #[arg(long, global = true, env = "STUDY_API_TIMEOUT")]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP backend.
    Serve {
        /// Listen port.
        #[arg(long, env = "PORT", default_value_t = 4000)]
        port: u16,

        /// Comma-separated CORS origins.
        #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
        allowed_origins: Option<String>,
    },
    /// Run the pipeline once and print the result.
    Ask {
        /// quiz, summary, podcast or tutor.
        #[arg(short, long)]
        mode: String,

        /// PDF file to read the material from.
        #[arg(short, long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,

        /// Material given directly.
        #[arg(short, long)]
        text: Option<String>,

        /// Print the completion before sanitisation.
        #[arg(long)]
        raw: bool,

        /// Output the full result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential check: refuse to start without a usable key ───────────
    let config = build_config(&cli.llm).context("Configuration error")?;
    info!(
        "Environment variables loaded: hasGroqKey=true, groqKeyPrefix={}",
        config.api_key.prefix()
    );
    let assistant = StudyAssistant::from_config(&config).context("Failed to create Groq client")?;

    match cli.command {
        Command::Serve {
            port,
            allowed_origins,
        } => run_server(assistant, port, allowed_origins).await,
        Command::Ask {
            mode,
            file,
            text,
            raw,
            json,
        } => run_ask(&assistant, &mode, file, text, raw, json, cli.quiet).await,
    }
}

/// Map CLI args onto the environment-derived config.
fn build_config(llm: &LlmArgs) -> Result<AssistantConfig> {
    let base = AssistantConfig::from_env()?;
    let mut builder = AssistantConfig::builder()
        .api_key(base.api_key.expose())
        .endpoint(base.endpoint)
        .model(llm.model.clone().unwrap_or(base.model))
        .temperature(llm.temperature)
        .max_tokens(llm.max_tokens);
    if let Some(secs) = llm.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    Ok(builder.build()?)
}

async fn run_server(
    assistant: StudyAssistant,
    port: u16,
    allowed_origins: Option<String>,
) -> Result<()> {
    let mut server_config = ServerConfig::from_env()?;
    server_config.port = port;
    if let Some(origins) = allowed_origins {
        server_config.allowed_origins = parse_origins(&origins);
    }
    info!(
        "Environment: {}, port {}, origins {:?}",
        server_config.environment, server_config.port, server_config.allowed_origins
    );

    let state = AppState::new(
        Arc::new(assistant),
        PdfTextExtractor::new(server_config.pdfium_lib_path.clone()),
        server_config.max_upload_bytes,
    );
    server::serve(&server_config, state)
        .await
        .context("HTTP server error")
}

async fn run_ask(
    assistant: &StudyAssistant,
    mode: &str,
    file: Option<PathBuf>,
    text: Option<String>,
    raw: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mode: Mode = mode.parse()?;

    let material = match (file, text) {
        (Some(path), _) => {
            let bytes = read_pdf_file(&path, DEFAULT_MAX_UPLOAD_BYTES)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let extractor = PdfTextExtractor::new(std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));
            extractor
                .extract(bytes)
                .await
                .context("Failed to extract text from PDF")?
        }
        (None, Some(text)) => text,
        (None, None) => anyhow::bail!("Provide --file or --text"),
    };
    let request = CompletionRequest::with_mode(material, mode)?;

    let spinner = (!quiet && !json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("Generating {mode}…"));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = assistant.process(&request).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            if !quiet {
                eprintln!("{} {}", red("✘"), e);
            }
            return Err(e.into());
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{out}");
        return Ok(());
    }

    let body = if raw { &result.raw_text } else { &result.cleaned_text };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    if !body.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }

    if !quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            mode,
            dim(&format!("{} chars in {}ms", result.cleaned_text.len(), result.duration_ms)),
        );
    }
    Ok(())
}
