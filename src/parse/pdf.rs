//! PDF text extraction (behind the `pdf` feature)

use crate::error::{Error, Result};

/// Extract per-page text from PDF bytes
///
/// `pdf-extract` emits form feeds between pages; splitting on them
/// recovers the page sequence.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Parse(format!("PDF extraction failed: {}", e)))?;

    Ok(text
        .split('\x0C')
        .map(|page| page.trim().to_string())
        .filter(|page| !page.is_empty())
        .collect())
}
