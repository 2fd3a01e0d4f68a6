//! PDF text extraction: turn uploaded bytes into the plain text the
//! pipeline consumes.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. Extraction runs on Tokio's blocking pool so request handlers
//! stay responsive while a large document is being read.
//!
//! ## Binding pdfium
//!
//! pdfium is a shared library loaded at runtime. An explicit path
//! (`PDFIUM_LIB_PATH`) wins; otherwise the system library search path is
//! used. Binding happens per extraction, so a missing library only fails
//! PDF uploads (as an internal error, HTTP 500) and never the text-only path.

use crate::error::{Stage, StudyError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extracts text from PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfTextExtractor {
    /// `lib_path` may point at the library file or at its directory.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }

    /// Extract the text of every page, pages separated by a blank line.
    pub async fn extract(&self, bytes: Vec<u8>) -> Result<String, StudyError> {
        ensure_pdf_magic(&bytes)?;
        let lib_path = self.lib_path.clone();

        tokio::task::spawn_blocking(move || extract_blocking(lib_path.as_deref(), &bytes))
            .await
            .map_err(|e| StudyError::internal(Stage::Extraction, format!("task panicked: {e}")))?
    }
}

/// Reject anything that does not start with `%PDF`.
pub fn ensure_pdf_magic(bytes: &[u8]) -> Result<(), StudyError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(StudyError::NotAPdf);
    }
    Ok(())
}

/// Read a PDF from disk for the CLI, enforcing the size limit and magic bytes.
pub async fn read_pdf_file(path: &Path, max_bytes: usize) -> Result<Vec<u8>, StudyError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| StudyError::internal(Stage::Upload, format!("{}: {e}", path.display())))?;
    if meta.len() > max_bytes as u64 {
        return Err(StudyError::FileTooLarge {
            limit_bytes: max_bytes,
        });
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StudyError::internal(Stage::Upload, format!("{}: {e}", path.display())))?;
    ensure_pdf_magic(&bytes)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn bind(lib_path: Option<&Path>) -> Result<Pdfium, StudyError> {
    let bindings = match lib_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| {
        StudyError::internal(
            Stage::Extraction,
            format!("pdfium library unavailable ({e:?}). Install libpdfium or set PDFIUM_LIB_PATH."),
        )
    })?;
    Ok(Pdfium::new(bindings))
}

fn extract_blocking(lib_path: Option<&Path>, bytes: &[u8]) -> Result<String, StudyError> {
    let pdfium = bind(lib_path)?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        let detail = if err_str.contains("Password") || err_str.contains("password") {
            "document is encrypted; upload an unprotected copy".to_string()
        } else {
            err_str
        };
        StudyError::PdfExtraction { detail }
    })?;

    let mut page_texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| StudyError::PdfExtraction {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            page_texts.push(trimmed.to_string());
        }
    }

    info!(
        "Extracted text from {} pages ({} with text)",
        document.pages().len(),
        page_texts.len()
    );
    Ok(page_texts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn magic_bytes_checked() {
        assert!(ensure_pdf_magic(b"%PDF-1.7\n...").is_ok());
        assert!(matches!(ensure_pdf_magic(b"PK\x03\x04"), Err(StudyError::NotAPdf)));
        assert!(matches!(ensure_pdf_magic(b"%PD"), Err(StudyError::NotAPdf)));
        assert!(matches!(ensure_pdf_magic(b""), Err(StudyError::NotAPdf)));
    }

    #[tokio::test]
    async fn extract_rejects_non_pdf_before_binding() {
        let extractor = PdfTextExtractor::new(Some(PathBuf::from("/nonexistent/libpdfium.so")));
        let err = extractor.extract(b"hello world".to_vec()).await.unwrap_err();
        assert!(matches!(err, StudyError::NotAPdf));
    }

    #[tokio::test]
    async fn read_pdf_file_enforces_limit_and_magic() {
        let mut big = tempfile::NamedTempFile::new().unwrap();
        big.write_all(b"%PDF-1.4\n").unwrap();
        big.write_all(&[b'x'; 64]).unwrap();
        let err = read_pdf_file(big.path(), 16).await.unwrap_err();
        assert!(matches!(err, StudyError::FileTooLarge { limit_bytes: 16 }));

        let mut text = tempfile::NamedTempFile::new().unwrap();
        text.write_all(b"just some notes").unwrap();
        let err = read_pdf_file(text.path(), 1024).await.unwrap_err();
        assert!(matches!(err, StudyError::NotAPdf));

        let bytes = read_pdf_file(big.path(), 1024).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn read_missing_file_names_upload_stage() {
        let err = read_pdf_file(Path::new("/definitely/not/here.pdf"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::Internal { stage: Stage::Upload, .. }));
    }
}
