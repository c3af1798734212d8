//! Parsing error types for menu extraction and document conversion
//!
//! The extraction engine itself never fails on text input; these errors are
//! raised by profile validation, date token parsing (recovered per entry) and
//! the document collaborators around the engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Malformed date token '{token}': {reason}")]
    MalformedDate { token: String, reason: String },

    #[error("Invalid format profile field '{field}': {reason}")]
    InvalidProfile { field: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No element matches '{selector}' in the page")]
    FragmentNotFound { selector: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Document conversion failed: {reason}")]
    DocumentConversionFailed { reason: String },

    #[error("Document contains no text")]
    EmptyDocument,

    #[error("HTTP request failed: {status} - {message}")]
    HttpRequestFailed {
        status: u16,
        message: String,
        url: String,
    },
}

impl ParsingError {
    pub fn malformed_date(token: &str, reason: &str) -> Self {
        Self::MalformedDate {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_profile(field: &str, reason: &str) -> Self {
        Self::InvalidProfile {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn conversion_failed(reason: impl std::fmt::Display) -> Self {
        Self::DocumentConversionFailed {
            reason: reason.to_string(),
        }
    }

    /// Check if this error only affects a single entry or document
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MalformedDate { .. } => true,
            Self::InvalidProfile { .. } => false,
            Self::InvalidPattern { .. } => false,
            Self::InvalidSelector { .. } => false,
            Self::FragmentNotFound { .. } => true,
            Self::UrlResolutionFailed { .. } => true,
            Self::DocumentConversionFailed { .. } => true,
            Self::EmptyDocument => true,
            Self::HttpRequestFailed { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
