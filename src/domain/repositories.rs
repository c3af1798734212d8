//! Repository interfaces for menu storage
//!
//! Persistence reports an explicit outcome per entry so that a job can count
//! saved, duplicate, skipped and failed entries instead of swallowing errors.

use crate::domain::MenuEntry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// A menu entry as stored, with its storage identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMenu {
    pub id: String,
    pub source: String,
    pub collection: String,
    pub entry: MenuEntry,
}

/// Why a single entry was not stored
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveFailure {
    #[error("{day_of_week} {date} is already stored in '{collection}'")]
    Duplicate {
        collection: String,
        day_of_week: String,
        date: NaiveDate,
    },

    #[error("{day_of_week} has no date and dateless entries are not stored")]
    Dateless { day_of_week: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// Storage identity of the new record, or why there is none
pub type SaveOutcome = std::result::Result<String, SaveFailure>;

/// Per-job aggregate of [`SaveOutcome`]s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: usize,
    pub duplicates: usize,
    pub skipped_dateless: usize,
    pub failed: usize,
}

impl SaveReport {
    pub fn record(&mut self, outcome: &SaveOutcome) {
        match outcome {
            Ok(_) => self.saved += 1,
            Err(SaveFailure::Duplicate { .. }) => self.duplicates += 1,
            Err(SaveFailure::Dateless { .. }) => self.skipped_dateless += 1,
            Err(SaveFailure::Database(_)) => self.failed += 1,
        }
    }

    pub const fn total(&self) -> usize {
        self.saved + self.duplicates + self.skipped_dateless + self.failed
    }
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Store one entry; duplicates of (collection, date, weekday) are rejected
    async fn save_menu(&self, source: &str, collection: &str, entry: &MenuEntry) -> SaveOutcome;

    /// Entries of a collection, dated ones first in date order
    async fn list_menus(&self, collection: &str) -> Result<Vec<StoredMenu>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_each_outcome() {
        let mut report = SaveReport::default();
        report.record(&Ok("id-1".to_string()));
        report.record(&Ok("id-2".to_string()));
        report.record(&Err(SaveFailure::Dateless {
            day_of_week: "Lundi".to_string(),
        }));
        report.record(&Err(SaveFailure::Database("locked".to_string())));
        report.record(&Err(SaveFailure::Duplicate {
            collection: "cver".to_string(),
            day_of_week: "Lundi".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
        }));

        assert_eq!(
            report,
            SaveReport {
                saved: 2,
                duplicates: 1,
                skipped_dateless: 1,
                failed: 1,
            }
        );
        assert_eq!(report.total(), 5);
    }
}
