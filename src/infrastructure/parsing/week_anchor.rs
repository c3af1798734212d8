//! Resolution of the calendar date of a menu week's first day
//!
//! Three closed strategies, one per profile, never combined:
//! - date range header ("Semaine du 04.08.2025 au 08.08.2025")
//! - ISO week number ("Semaine N° 32" plus a four-digit year)
//! - inline day+month right after each weekday token, resolved per block

use super::context::ParseContext;
use super::date_tokens::{
    find_plausible_year, parse_date_range, parse_date_token, DATE_TOKEN_PATTERN,
    DAY_MONTH_TOKEN_PATTERN,
};
use super::{ParsingError, ParsingResult};
use crate::domain::{AnchorStrategy, FormatProfile, Locale, WeekAnchor};
use chrono::{NaiveDate, Weekday};
use regex::Regex;
use tracing::{debug, warn};

/// Compiled form of an [`AnchorStrategy`]
#[derive(Debug, Clone)]
enum CompiledStrategy {
    DateRange(Regex),
    IsoWeek(Regex),
    Inline(Regex),
}

/// Resolver for the week anchor of one profile
#[derive(Debug, Clone)]
pub struct WeekAnchorResolver {
    strategy: CompiledStrategy,
    locale: Locale,
}

/// Date found inline at the top of a day block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineDate {
    pub anchor: WeekAnchor,

    /// Bytes of the block consumed by the date token
    pub consumed: usize,
}

impl WeekAnchorResolver {
    /// Compile a strategy.
    ///
    /// `weekday_tokens` may precede the dates of a range header, as in
    /// "du lundi 4 au vendredi 8 août 2025".
    pub fn new(
        strategy: &AnchorStrategy,
        locale: Locale,
        weekday_tokens: &[String],
    ) -> ParsingResult<Self> {
        let strategy = match strategy {
            AnchorStrategy::DateRangeHeader { lead, separator } => {
                let lead = words_pattern(lead, "anchor_strategy.lead")?;
                let separator = words_pattern(separator, "anchor_strategy.separator")?;
                let day = weekday_prefix(weekday_tokens);
                let pattern = format!(
                    r"(?i)\b{lead}\s+{day}(?P<start>{DATE_TOKEN_PATTERN})\s+{separator}\s+{day}(?P<end>{DATE_TOKEN_PATTERN})"
                );
                CompiledStrategy::DateRange(compile(&pattern)?)
            }
            AnchorStrategy::IsoWeekNumber { label } => {
                let label = words_pattern(label, "anchor_strategy.label")?;
                // a year printed right after the week number, e.g. "Semaine N° 32 2025"
                let pattern = format!(
                    r"(?i){label}\s*(?P<week>\d{{1,2}})\b(?:[^\d\n]{{0,5}}?(?P<year>\d{{4}})\b)?"
                );
                CompiledStrategy::IsoWeek(compile(&pattern)?)
            }
            AnchorStrategy::InlineDayMonth => {
                let pattern = format!(r"^[\s,:\-–]*(?P<date>{DAY_MONTH_TOKEN_PATTERN})");
                CompiledStrategy::Inline(compile(&pattern)?)
            }
        };
        Ok(Self { strategy, locale })
    }

    pub fn from_profile(profile: &FormatProfile) -> ParsingResult<Self> {
        Self::new(&profile.anchor_strategy, profile.locale, &profile.weekday_tokens)
    }

    /// Whether dates come from each block instead of a document-level anchor
    pub const fn is_per_block(&self) -> bool {
        matches!(self.strategy, CompiledStrategy::Inline(_))
    }

    /// Resolve the document-level anchor from normalized, unfiltered text
    pub fn resolve(&self, text: &str, context: &ParseContext) -> Option<WeekAnchor> {
        let resolved = match &self.strategy {
            CompiledStrategy::DateRange(re) => self.resolve_date_range(re, text, context),
            CompiledStrategy::IsoWeek(re) => Self::resolve_iso_week(re, text, context),
            CompiledStrategy::Inline(_) => return None,
        };

        match resolved {
            Ok(anchor) => {
                debug!("[{}] week anchored on {}", context.source, anchor.first_day);
                Some(anchor)
            }
            Err(e) => {
                warn!("[{}] week anchor unresolved: {}", context.source, e);
                None
            }
        }
    }

    /// Resolve the anchor of one block from a day+month token at its start.
    ///
    /// `offset` is the weekday's position in the profile and `year` the year
    /// to assume when the token carries none.
    pub fn resolve_inline(&self, block: &str, offset: usize, year: i32) -> Option<InlineDate> {
        let CompiledStrategy::Inline(re) = &self.strategy else {
            return None;
        };
        let caps = re.captures(block)?;
        let token = caps.name("date")?;

        let parsed = parse_date_token(token.as_str(), self.locale)
            .and_then(|partial| partial.to_date(year))
            .and_then(|date| {
                WeekAnchor::from_day(date, offset)
                    .ok_or_else(|| ParsingError::malformed_date(token.as_str(), "out of calendar range"))
            });

        match parsed {
            Ok(anchor) => Some(InlineDate {
                anchor,
                consumed: token.end(),
            }),
            Err(e) => {
                debug!("inline date token ignored: {}", e);
                None
            }
        }
    }

    fn resolve_date_range(
        &self,
        re: &Regex,
        text: &str,
        context: &ParseContext,
    ) -> ParsingResult<WeekAnchor> {
        let caps = re
            .captures(text)
            .ok_or_else(|| ParsingError::malformed_date("", "no week range header found"))?;
        let (start, _end) = parse_date_range(
            &caps["start"],
            &caps["end"],
            self.locale,
            context.reference_year(),
        )?;
        Ok(WeekAnchor::new(start))
    }

    fn resolve_iso_week(
        re: &Regex,
        text: &str,
        context: &ParseContext,
    ) -> ParsingResult<WeekAnchor> {
        let caps = re
            .captures(text)
            .ok_or_else(|| ParsingError::malformed_date("", "no week number found"))?;
        let week: u32 = caps["week"]
            .parse()
            .map_err(|_| ParsingError::malformed_date(&caps["week"], "week number is not numeric"))?;

        let year = match caps.name("year") {
            Some(year) => year.as_str().parse::<i32>().ok(),
            None => find_plausible_year(text, context.reference_year()),
        }
        .ok_or_else(|| ParsingError::malformed_date(&caps[0], "no four-digit year found"))?;

        iso_week_start(year, week).map(WeekAnchor::new).ok_or_else(|| {
            ParsingError::malformed_date(&format!("{year}-W{week}"), "no such ISO week")
        })
    }
}

/// Monday of ISO week `week` of `year`
pub fn iso_week_start(year: i32, week: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

/// Optional weekday word in front of a date, e.g. the "lundi" of "du lundi 4"
fn weekday_prefix(weekday_tokens: &[String]) -> String {
    let mut tokens: Vec<&str> = weekday_tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return String::new();
    }
    tokens.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?:(?:{alternation})\.?,?\s+)?")
}

/// Case-insensitive pattern for a phrase, tolerant to whitespace differences
fn words_pattern(phrase: &str, field: &str) -> ParsingResult<String> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(ParsingError::invalid_profile(field, "must not be empty"));
    }
    Ok(words.join(r"\s*"))
}

fn compile(pattern: &str) -> ParsingResult<Regex> {
    Regex::new(pattern).map_err(|e| ParsingError::invalid_pattern(pattern, e))
}
