//! Cafeteria Menus - weekly menu extraction from provider PDFs and web pages
//!
//! The core is a profile-driven extraction engine
//! ([`infrastructure::parsing`]) turning the plain text of a weekly menu into
//! dated [`domain::MenuEntry`] values. Around it sit the document
//! collaborators (HTTP, HTML, PDF), SQLite storage and the ingestion jobs.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the extraction boundary for easier access
pub use domain::{AnchorStrategy, FormatProfile, Locale, MenuEntry};
pub use infrastructure::parsing::{extract, MenuExtractor, ParseContext, ParsingError, ParsingResult};
