//! PDF text extraction.
//!
//! Pages are read in page order and their text is concatenated without any
//! separator between pages.

use crate::error::{PdfcastError, Result};
use lopdf::Document as PdfDocument;
use tracing::{debug, instrument, warn};

/// Extract the text of every page, in page order.
///
/// A page whose text cannot be decoded contributes an empty string.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = PdfDocument::load_mem(bytes)
        .map_err(|e| PdfcastError::Format(format!("Failed to load PDF: {}", e)))?;

    if doc.is_encrypted() {
        return Err(PdfcastError::Format("PDF is encrypted".to_string()));
    }

    // BTreeMap keyed by 1-based page number, so iteration is page order
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(PdfcastError::Format("PDF has no pages".to_string()));
    }

    let texts: Vec<String> = pages
        .keys()
        .map(|&page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("No extractable text on page {}: {}", page_number, e);
                String::new()
            }
        })
        .collect();

    debug!("Extracted {} pages", texts.len());
    Ok(texts)
}

/// Extract the whole document as one string.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    Ok(extract_pages(bytes)?.concat())
}
