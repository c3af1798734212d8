//! PDF text extraction
//!
//! Menus are one page long; only the first page is converted. `pdf_extract`
//! can panic on malformed input, so calls run inside `catch_unwind`.

use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Text of the first page of a PDF document
pub fn first_page_text(bytes: &[u8]) -> ParsingResult<String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    let pages = match result {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(ParsingError::conversion_failed(format!("PDF extraction failed: {e}"))),
        Err(_) => {
            return Err(ParsingError::conversion_failed(
                "PDF extraction panicked (malformed document)",
            ));
        }
    };

    debug!("PDF has {} page(s)", pages.len());
    match pages.into_iter().next() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ParsingError::EmptyDocument),
    }
}
