//! Configuration types for the completion pipeline and the HTTP shell.
//!
//! Completion behaviour is controlled through [`AssistantConfig`], built via
//! its [`AssistantConfigBuilder`]. The credential is part of the config and is
//! handed to the client constructor explicitly; nothing in the pipeline reads
//! the process environment. [`AssistantConfig::from_env`] and
//! [`ServerConfig::from_env`] exist for the binary, which owns the
//! environment.

use crate::error::StudyError;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Groq's OpenAI-compatible chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used for every completion unless overridden.
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Every Groq key starts with this.
pub const API_KEY_PREFIX: &str = "gsk_";

pub const DEFAULT_PORT: u16 = 4000;

/// Upload cap for PDF files: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] =
    &["http://localhost:3000", "https://assem-dotcom.github.io"];

// ── Credential ───────────────────────────────────────────────────────────

/// A validated Groq API key.
///
/// Construction fails unless the key is present and starts with
/// [`API_KEY_PREFIX`]. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate a raw key. The value is taken as-is: surrounding whitespace
    /// is not stripped, so `" gsk_…"` fails the prefix check.
    pub fn parse(raw: impl Into<String>) -> Result<Self, StudyError> {
        let key = raw.into();
        Self::check(&key)?;
        Ok(Self(key))
    }

    /// Validate an optional key, as read from the environment.
    pub fn from_optional(raw: Option<String>) -> Result<Self, StudyError> {
        match raw {
            Some(k) => Self::parse(k),
            None => Err(StudyError::Unauthorized {
                reason: "GROQ_API_KEY is not configured in environment variables".into(),
            }),
        }
    }

    /// Re-check the invariant. Cheap; the client calls it before every request.
    pub fn validate(&self) -> Result<(), StudyError> {
        Self::check(&self.0)
    }

    fn check(key: &str) -> Result<(), StudyError> {
        if key.trim().is_empty() {
            return Err(StudyError::Unauthorized {
                reason: "GROQ_API_KEY is not configured in environment variables".into(),
            });
        }
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(StudyError::Unauthorized {
                reason: format!("API key should start with \"{API_KEY_PREFIX}\""),
            });
        }
        Ok(())
    }

    /// The secret itself. Only the HTTP client should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters, safe to log.
    pub fn prefix(&self) -> &str {
        self.0.get(..4).unwrap_or("")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}…)", self.prefix())
    }
}

// ── Completion config ────────────────────────────────────────────────────

/// Configuration for the completion pipeline.
///
/// # Example
/// ```rust
/// use study_assistant::AssistantConfig;
///
/// let config = AssistantConfig::builder()
///     .api_key("gsk_example")
///     .temperature(0.7)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "deepseek-r1-distill-llama-70b");
/// ```
#[derive(Clone)]
pub struct AssistantConfig {
    /// Bearer credential for the provider.
    pub api_key: ApiKey,

    /// Full chat-completion URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2000.
    ///
    /// Long podcast scripts hit this cap first; raising it raises cost and
    /// latency linearly.
    pub max_tokens: u32,

    /// System instruction. Default: [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: String,

    /// Whole-request timeout in seconds. Default: none.
    ///
    /// With `None` the call waits as long as the transport allows. There is
    /// no retry in either case.
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AssistantConfig {
    /// Create a new builder for `AssistantConfig`.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout_secs: None,
        }
    }

    /// Read `GROQ_API_KEY`, `GROQ_API_URL` and `GROQ_MODEL`.
    ///
    /// Fails with [`StudyError::Unauthorized`] when the key is missing or
    /// malformed, so the binary can refuse to start.
    pub fn from_env() -> Result<Self, StudyError> {
        let mut builder = Self::builder();
        if let Ok(key) = env::var("GROQ_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Ok(url) = env::var("GROQ_API_URL") {
            builder = builder.endpoint(url);
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            builder = builder.model(model);
        }
        builder.build()
    }
}

/// Builder for [`AssistantConfig`].
#[derive(Debug)]
pub struct AssistantConfigBuilder {
    api_key: Option<String>,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    request_timeout_secs: Option<u64>,
}

impl AssistantConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The credential is checked first so a bad key is always reported as
    /// [`StudyError::Unauthorized`].
    pub fn build(self) -> Result<AssistantConfig, StudyError> {
        let api_key = ApiKey::from_optional(self.api_key)?;
        if self.max_tokens == 0 {
            return Err(StudyError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if self.model.trim().is_empty() {
            return Err(StudyError::InvalidConfig("model must not be empty".into()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(StudyError::InvalidConfig(format!(
                "endpoint must be an HTTP(S) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(StudyError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(AssistantConfig {
            api_key,
            endpoint: self.endpoint,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt,
            request_timeout_secs: self.request_timeout_secs,
        })
    }
}

// ── Server config ────────────────────────────────────────────────────────

/// Settings for the HTTP shell around the pipeline.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port. Default: 4000.
    pub port: u16,
    /// Free-form environment label, logged at startup. Default: "development".
    pub environment: String,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Largest accepted PDF upload. Default: 10 MiB.
    pub max_upload_bytes: usize,
    /// Explicit pdfium library location; system library when `None`.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pdfium_lib_path: None,
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `APP_ENV`, `CORS_ALLOWED_ORIGINS` and `PDFIUM_LIB_PATH`.
    pub fn from_env() -> Result<Self, StudyError> {
        let mut config = Self::default();
        if let Ok(port) = env::var("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| StudyError::InvalidConfig(format!("PORT is not a valid port: '{port}'")))?;
        }
        if let Ok(label) = env::var("APP_ENV") {
            config.environment = label;
        }
        if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins);
        }
        config.pdfium_lib_path = env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);
        Ok(config)
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
