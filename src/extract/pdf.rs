use crate::extract::{panic_message, ExtractionError};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Extracts the text of every page of a PDF document
///
/// The underlying parser can panic on malformed input; such panics are caught
/// and reported as `ExtractionError::Panicked`.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match result {
        Ok(Ok(text)) => Ok(text.trim().to_string()),
        Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
        Err(payload) => Err(ExtractionError::Panicked(panic_message(payload))),
    }
}
