//! Splitting filtered menu text into one span per weekday occurrence

use super::{ParsingError, ParsingResult};
use crate::domain::{DayBlock, FormatProfile};
use regex::Regex;
use tracing::debug;

/// Segmenter for the weekday vocabulary of one profile
#[derive(Debug, Clone)]
pub struct DayBlockSegmenter {
    /// Weekday tokens as configured
    tokens: Vec<String>,

    /// Lower-cased tokens for index lookup
    folded: Vec<String>,

    /// Weekday token at line start, followed by a word boundary
    day_header: Regex,

    sentinel: Option<Regex>,
}

impl DayBlockSegmenter {
    pub fn new(weekday_tokens: &[String], trailing_sentinel: Option<&str>) -> ParsingResult<Self> {
        if weekday_tokens.is_empty() {
            return Err(ParsingError::invalid_profile(
                "weekday_tokens",
                "at least one weekday token is required",
            ));
        }
        let tokens: Vec<String> = weekday_tokens.iter().map(|t| t.trim().to_string()).collect();
        if tokens.iter().any(String::is_empty) {
            return Err(ParsingError::invalid_profile(
                "weekday_tokens",
                "weekday tokens must not be blank",
            ));
        }

        // longest first so that a token never shadows a longer one sharing its prefix
        let mut alternatives: Vec<&String> = tokens.iter().collect();
        alternatives.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
        let alternation = alternatives
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        // `\b` alone never matches after a token ending in punctuation ("Lun.")
        let pattern = format!(r"(?mi)^[ \t]*(?P<day>{alternation})(?:\b|\s|$)");
        let day_header =
            Regex::new(&pattern).map_err(|e| ParsingError::invalid_pattern(&pattern, e))?;

        let sentinel = match trailing_sentinel.map(str::trim) {
            Some(s) if !s.is_empty() => {
                let pattern = format!("(?i){}", regex::escape(s));
                Some(Regex::new(&pattern).map_err(|e| ParsingError::invalid_pattern(&pattern, e))?)
            }
            _ => None,
        };

        let folded = tokens.iter().map(|t| t.to_lowercase()).collect();
        Ok(Self {
            tokens,
            folded,
            day_header,
            sentinel,
        })
    }

    pub fn from_profile(profile: &FormatProfile) -> ParsingResult<Self> {
        Self::new(&profile.weekday_tokens, profile.trailing_sentinel.as_deref())
    }

    /// Locate weekday blocks in document order.
    ///
    /// A block runs from the end of its weekday token to the next weekday
    /// token, the first sentinel after it, or the end of the text, whichever
    /// comes first. Empty and duplicate blocks are kept.
    pub fn segment(&self, text: &str) -> Vec<DayBlock> {
        let headers: Vec<(usize, usize, usize)> = self
            .day_header
            .captures_iter(text)
            .filter_map(|caps| {
                let header = caps.get(0)?;
                let day = caps.name("day")?;
                let index = self.index_of(day.as_str())?;
                Some((index, header.start(), day.end()))
            })
            .collect();

        let mut blocks = Vec::with_capacity(headers.len());
        for (i, &(index, header_start, start)) in headers.iter().enumerate() {
            let next = headers.get(i + 1).map_or(text.len(), |&(_, next_start, _)| next_start);
            let end = self
                .sentinel
                .as_ref()
                .and_then(|re| re.find_at(text, start))
                .map_or(next, |m| m.start().min(next));

            debug!(
                "day block '{}' at {}..{} (header at {})",
                self.tokens[index], start, end, header_start
            );
            blocks.push(DayBlock {
                weekday: self.tokens[index].clone(),
                weekday_index: index,
                start,
                end,
            });
        }
        blocks
    }

    fn index_of(&self, matched: &str) -> Option<usize> {
        let matched = matched.to_lowercase();
        self.folded.iter().position(|t| *t == matched)
    }
}
