//! PDF text extraction for document uploads.

use cairn_core::{Error, Result};

/// Extract plain text from an in-memory PDF.
///
/// Extraction failures are a client problem (corrupt or non-PDF upload) and
/// map to a 400. A well-formed PDF with no text layer extracts to an empty
/// string, which is accepted; the record is still stored and retrievable.
pub fn extract_pdf_text(data: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::InvalidInput(format!("Could not extract text from PDF: {}", e)))?;
    Ok(text.trim().to_string())
}
