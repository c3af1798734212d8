//! Cleanup of a single day's text into its final description

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static pattern"));

/// Normalize the raw text of one day block.
///
/// Whitespace runs inside a line become single spaces, line breaks between
/// dishes are kept, a line identical to the one before it is dropped (PDF
/// extraction sometimes emits lines twice) and blank runs shrink to one
/// blank line. Idempotent.
pub fn normalize_description(block: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in block.trim().lines() {
        let line = collapse_whitespace(line);
        if lines.last() != Some(&line) {
            lines.push(line);
        }
    }
    let joined = lines.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
