//! Domain module - menu records, source format profiles and storage interfaces
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod menu;
pub mod profile;
pub mod repositories;

pub use menu::{DayBlock, MenuEntry, WeekAnchor};
pub use profile::{AnchorStrategy, FormatProfile, Locale};
pub use repositories::{MenuRepository, SaveFailure, SaveOutcome, SaveReport, StoredMenu};
