//! Parsing error module re-export
//!
//! This module re-exports the parsing error types shared with the document collaborators.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
