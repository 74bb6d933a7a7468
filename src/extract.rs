//! Text extraction from uploaded documents.
//!
//! Extraction is a collaborator of the generation pipeline, not part of it:
//! the service turns an upload into plain text here, and everything after
//! that only ever sees a `&str`.

use crate::error::StudyError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upload formats the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// Classify an upload by MIME type, then by file extension.
    pub fn detect(mime: &str, filename: &str) -> Result<Self, StudyError> {
        let mime = mime.trim().to_ascii_lowercase();
        let lower = filename.to_ascii_lowercase();

        if mime == "application/pdf" || lower.ends_with(".pdf") {
            Ok(DocumentFormat::Pdf)
        } else if mime == DOCX_MIME || lower.ends_with(".docx") {
            Ok(DocumentFormat::Docx)
        } else if mime.starts_with("text/plain") || lower.ends_with(".txt") || lower.ends_with(".md")
        {
            Ok(DocumentFormat::PlainText)
        } else {
            Err(StudyError::UnsupportedFormat {
                mime,
                filename: filename.to_string(),
            })
        }
    }
}

/// Document title: the filename without a trailing `.pdf` or `.docx`.
pub fn title_from_filename(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    for ext in [".pdf", ".docx"] {
        if lower.ends_with(ext) && filename.len() > ext.len() {
            return filename[..filename.len() - ext.len()].to_string();
        }
    }
    filename.to_string()
}

/// Turns uploaded bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, format: DocumentFormat, bytes: Vec<u8>) -> Result<String, StudyError>;
}

/// UTF-8 plain text only; other formats are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, format: DocumentFormat, bytes: Vec<u8>) -> Result<String, StudyError> {
        match format {
            DocumentFormat::PlainText => non_empty(decode_utf8(bytes)?),
            other => Err(StudyError::ExtractionFailed {
                detail: format!("{:?} extraction is not available", other),
            }),
        }
    }
}

/// PDF text via pdfium, plus plain text. DOCX needs a dedicated extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    /// Directory holding the pdfium shared library; `None` = system library.
    library_dir: Option<PathBuf>,
}

impl PdfiumExtractor {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    /// Use `PDFIUM_LIB_PATH` when set, else the system library.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os("PDFIUM_LIB_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        )
    }
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, format: DocumentFormat, bytes: Vec<u8>) -> Result<String, StudyError> {
        match format {
            DocumentFormat::Pdf => {
                let dir = self.library_dir.clone();
                let text = tokio::task::spawn_blocking(move || pdf_text_blocking(dir, &bytes))
                    .await
                    .map_err(|e| StudyError::Internal(format!("PDF extraction task panicked: {}", e)))??;
                non_empty(text)
            }
            DocumentFormat::PlainText => non_empty(decode_utf8(bytes)?),
            DocumentFormat::Docx => Err(StudyError::ExtractionFailed {
                detail: "DOCX extraction requires a DOCX-capable extractor".to_string(),
            }),
        }
    }
}

/// Blocking implementation of PDF text extraction.
fn pdf_text_blocking(library_dir: Option<PathBuf>, bytes: &[u8]) -> Result<String, StudyError> {
    let bindings = match library_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| StudyError::Internal(format!("pdfium library unavailable: {:?}", e)))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| StudyError::ExtractionFailed {
            detail: format!("{:?}", e),
        })?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| StudyError::ExtractionFailed {
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        pages.push(text.all());
    }
    debug!("Extracted text from {} PDF pages", pages.len());

    Ok(pages.join("\n"))
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String, StudyError> {
    String::from_utf8(bytes).map_err(|e| StudyError::ExtractionFailed {
        detail: format!("not valid UTF-8: {}", e),
    })
}

fn non_empty(text: String) -> Result<String, StudyError> {
    if text.trim().is_empty() {
        Err(StudyError::ExtractionFailed {
            detail: "document contains no text".to_string(),
        })
    } else {
        Ok(text)
    }
}
