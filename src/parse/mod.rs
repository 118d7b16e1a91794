//! Stored-document text extraction
//!
//! Turns downloaded blob bytes into plain text by inferred format. PDF
//! support is built in behind the `pdf` feature; DOCX needs an external
//! extractor implementation supplied through the trait.

#[cfg(feature = "pdf")]
mod pdf;

use crate::error::{Error, Result};

/// Recognized stored-document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Pdf,
    Docx,
    Markdown,
    Text,
}

/// Infer a document's format from its locator
///
/// Query strings are stripped first; anything unrecognized is treated as
/// plain text.
pub fn infer_format(locator: &str) -> DocFormat {
    let path = locator.split('?').next().unwrap_or(locator);
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "pdf" => DocFormat::Pdf,
        "docx" => DocFormat::Docx,
        "md" => DocFormat::Markdown,
        _ => DocFormat::Text,
    }
}

/// Format-specific extraction backends
pub trait DocumentExtractor: Send + Sync {
    /// Extract text per page, in order
    fn extract_pdf(&self, bytes: &[u8]) -> Result<Vec<String>>;

    /// Extract the raw text of a DOCX document
    fn extract_docx(&self, bytes: &[u8]) -> Result<String>;
}

/// Built-in extractor
///
/// PDF works when the `pdf` feature is enabled; DOCX always reports
/// unsupported here.
pub struct LocalExtractor;

impl DocumentExtractor for LocalExtractor {
    #[cfg(feature = "pdf")]
    fn extract_pdf(&self, bytes: &[u8]) -> Result<Vec<String>> {
        pdf::extract_pages(bytes)
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(&self, _bytes: &[u8]) -> Result<Vec<String>> {
        Err(Error::Parse(
            "PDF extraction requires the 'pdf' feature".to_string(),
        ))
    }

    fn extract_docx(&self, _bytes: &[u8]) -> Result<String> {
        Err(Error::Parse(
            "DOCX extraction requires an external extractor".to_string(),
        ))
    }
}

/// Extract the full text of a stored document
///
/// PDF page texts are joined with blank lines; markdown and unknown
/// formats decode as (lossy) UTF-8. Whitespace-only output is an error.
pub fn extract_document_text(
    extractor: &dyn DocumentExtractor,
    locator: &str,
    bytes: &[u8],
) -> Result<String> {
    let text = match infer_format(locator) {
        DocFormat::Pdf => extractor.extract_pdf(bytes)?.join("\n\n"),
        DocFormat::Docx => extractor.extract_docx(bytes)?,
        DocFormat::Markdown | DocFormat::Text => String::from_utf8_lossy(bytes).into_owned(),
    };

    if text.trim().is_empty() {
        return Err(Error::EmptyExtraction(locator.to_string()));
    }

    Ok(text)
}
