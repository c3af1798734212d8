//! Menu text extraction engine
//!
//! Turns the plain text of a weekly cafeteria menu into dated
//! [`MenuEntry`](crate::domain::MenuEntry) values, driven entirely by a
//! [`FormatProfile`](crate::domain::FormatProfile).

pub mod context;
pub mod date_tokens;
pub mod day_segmenter;
pub mod description;
pub mod error;
pub mod menu_extractor;
pub mod noise_filter;
pub mod text_normalizer;
pub mod week_anchor;

// Re-export public types
pub use context::ParseContext;
pub use day_segmenter::DayBlockSegmenter;
pub use description::normalize_description;
pub use error::{ParsingError, ParsingResult};
pub use menu_extractor::{extract, MenuExtractor};
pub use noise_filter::NoiseFilter;
pub use text_normalizer::normalize_text;
pub use week_anchor::{iso_week_start, WeekAnchorResolver};
