//! Parsing context for menu extraction
//!
//! Carries the per-invocation facts the engine cannot derive from the text.

use chrono::{Datelike, Local, NaiveDate};

/// Context information for one extraction
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Source name, used only for log correlation
    pub source: String,

    /// "Today" for the purpose of year assumptions when the text has no year
    pub reference_date: NaiveDate,
}

impl ParseContext {
    /// Create new parse context anchored on today's local date
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reference_date: Local::now().date_naive(),
        }
    }

    /// Set the reference date
    pub const fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_date.year()
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}
