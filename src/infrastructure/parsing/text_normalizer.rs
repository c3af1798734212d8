//! Canonical line endings and blank-line structure for raw document text

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static pattern"));

/// Normalize raw extracted text.
///
/// `\r\n` and `\r` become `\n`, non-breaking spaces become plain spaces and
/// two or more consecutive blank lines collapse to a single one. No content
/// character is removed.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00A0}', " ");
    BLANK_RUN.replace_all(&unified, "\n\n").into_owned()
}
