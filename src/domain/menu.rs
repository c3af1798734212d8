//! Menu records produced by the extraction engine
//!
//! All of these are transient: they are built fresh for one document and
//! handed to the caller, nothing here is shared between documents.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One weekday of a weekly menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    /// Canonical weekday label, e.g. "Lundi"
    pub day_of_week: String,

    /// Calendar date of that weekday, absent when the week could not be anchored
    pub date: Option<NaiveDate>,

    /// Cleaned dish description, one dish per line
    pub description: String,
}

impl MenuEntry {
    pub fn new(day_of_week: impl Into<String>, date: Option<NaiveDate>, description: impl Into<String>) -> Self {
        Self {
            day_of_week: day_of_week.into(),
            date,
            description: description.into(),
        }
    }

    pub fn is_dated(&self) -> bool {
        self.date.is_some()
    }
}

/// Calendar date of the first weekday of a parsed week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekAnchor {
    pub first_day: NaiveDate,
}

impl WeekAnchor {
    pub const fn new(first_day: NaiveDate) -> Self {
        Self { first_day }
    }

    /// Date of the weekday `offset` days after the first one
    pub fn date_for(&self, offset: usize) -> Option<NaiveDate> {
        self.first_day.checked_add_days(Days::new(offset as u64))
    }

    /// Anchor implied by a known date of the weekday at `offset`
    pub fn from_day(date: NaiveDate, offset: usize) -> Option<Self> {
        date.checked_sub_days(Days::new(offset as u64)).map(Self::new)
    }
}

/// Text span `[start, end)` attributed to one weekday occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBlock {
    /// Weekday token as configured in the profile
    pub weekday: String,

    /// Position of the token in the profile, i.e. day offset from the week start
    pub weekday_index: usize,

    /// Byte offset just after the weekday token
    pub start: usize,

    /// Exclusive byte offset where the block stops
    pub end: usize,
}

impl DayBlock {
    /// Slice of `text` covered by this block
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or_default()
    }

    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Capitalized display label of a weekday token ("LUNDI" -> "Lundi")
pub fn day_label(token: &str) -> String {
    let lower = token.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_label() {
        assert_eq!(day_label("LUNDI"), "Lundi");
        assert_eq!(day_label("mercredi"), "Mercredi");
        assert_eq!(day_label(""), "");
    }

    #[test]
    fn test_anchor_offsets() {
        let monday = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        let anchor = WeekAnchor::new(monday);
        assert_eq!(anchor.date_for(4), NaiveDate::from_ymd_opt(2025, 8, 8));

        let thursday = NaiveDate::from_ymd_opt(2025, 8, 7).unwrap();
        assert_eq!(WeekAnchor::from_day(thursday, 3), Some(anchor));
    }

    #[test]
    fn test_block_text() {
        let block = DayBlock {
            weekday: "lundi".to_string(),
            weekday_index: 0,
            start: 5,
            end: 9,
        };
        assert_eq!(block.text("lundi Riz\n"), " Riz");
        assert!(!block.is_empty());
    }
}
