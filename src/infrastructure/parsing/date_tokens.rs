//! Day/month/year token parsing for French and English menus
//!
//! Tokens are always day-first: "04.08.2025", "4/8/25", "4 août 2025",
//! "1er août". Missing month or year parts are kept open so a caller can
//! complete them from a neighbouring token.

use super::{ParsingError, ParsingResult};
use crate::domain::Locale;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Date token as it may appear in a menu header, numeric or textual
pub const DATE_TOKEN_PATTERN: &str =
    r"\d{1,2}(?:er)?(?:[./-]\d{1,2}(?:[./-]\d{2,4})?|(?:\s+\p{L}+\.?)?(?:\s+\d{4})?)";

/// Same as [`DATE_TOKEN_PATTERN`] but the month is mandatory
pub const DAY_MONTH_TOKEN_PATTERN: &str =
    r"\d{1,2}(?:er)?(?:[./-]\d{1,2}(?:[./-]\d{2,4})?|\s+\p{L}+\.?(?:\s+\d{4})?)";

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[./-](\d{1,2})(?:[./-](\d{4}|\d{2}))?$").expect("static pattern")
});

static TEXTUAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?:er)?(?:\s+(\p{L}+)\.?)?(?:\s+(\d{4}))?$").expect("static pattern")
});

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("static pattern"));

/// A day with optionally known month and year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub day: u32,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PartialDate {
    /// Fill missing month/year from `other`
    pub fn complete_with(self, other: &Self) -> Self {
        Self {
            day: self.day,
            month: self.month.or(other.month),
            year: self.year.or(other.year),
        }
    }

    /// Resolve to a calendar date, using `default_year` when no year is known
    pub fn to_date(self, default_year: i32) -> ParsingResult<NaiveDate> {
        let month = self.month.ok_or_else(|| {
            ParsingError::malformed_date(&self.day.to_string(), "month is missing")
        })?;
        let year = self.year.unwrap_or(default_year);
        NaiveDate::from_ymd_opt(year, month, self.day).ok_or_else(|| {
            ParsingError::malformed_date(
                &format!("{}.{}.{}", self.day, month, year),
                "no such calendar date",
            )
        })
    }
}

/// Parse a single day-first date token
pub fn parse_date_token(token: &str, locale: Locale) -> ParsingResult<PartialDate> {
    let token = token.trim();

    if let Some(caps) = NUMERIC.captures(token) {
        let day = parse_number(&caps[1], token)?;
        let month = parse_number(&caps[2], token)?;
        let year = match caps.get(3) {
            Some(y) => Some(expand_year(y.as_str(), token)?),
            None => None,
        };
        return checked(PartialDate { day, month: Some(month), year }, token);
    }

    if let Some(caps) = TEXTUAL.captures(token) {
        let day = parse_number(&caps[1], token)?;
        let month = match caps.get(2) {
            Some(name) => Some(month_from_name(name.as_str(), locale).ok_or_else(|| {
                ParsingError::malformed_date(token, &format!("unknown month '{}'", name.as_str()))
            })?),
            None => None,
        };
        let year = match caps.get(3) {
            Some(y) => Some(expand_year(y.as_str(), token)?),
            None => None,
        };
        return checked(PartialDate { day, month, year }, token);
    }

    Err(ParsingError::malformed_date(token, "not a day-first date"))
}

/// Parse the start/end of a range; the start borrows what it lacks from the end
pub fn parse_date_range(
    start: &str,
    end: &str,
    locale: Locale,
    default_year: i32,
) -> ParsingResult<(NaiveDate, NaiveDate)> {
    let end_partial = parse_date_token(end, locale)?;
    let start_partial = parse_date_token(start, locale)?;
    let end_date = end_partial.to_date(default_year)?;

    let completed = start_partial.complete_with(&end_partial);

    // "du 29 au 2 janvier 2026": the end's month, else the month before it
    if start_partial.month.is_none() {
        let in_end_month = completed
            .to_date(end_date.year())
            .ok()
            .filter(|date| *date <= end_date);
        let start_date = match in_end_month {
            Some(date) => date,
            None => day_in_previous_month(completed.day, end_date)
                .ok_or_else(|| ParsingError::malformed_date(start, "no such calendar date"))?,
        };
        return Ok((start_date, end_date));
    }

    let mut start_date = completed.to_date(end_date.year())?;

    // "du 29 décembre au 2 janvier 2026" starts in the previous year
    if start_partial.year.is_none() && start_date > end_date {
        start_date = start_date
            .with_year(start_date.year() - 1)
            .ok_or_else(|| ParsingError::malformed_date(start, "no such calendar date"))?;
    }

    Ok((start_date, end_date))
}

fn day_in_previous_month(day: u32, date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = match date.month() {
        1 => (date.year() - 1, 12),
        month => (date.year(), month - 1),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Years further than this from the reference year are not taken as years
pub const PLAUSIBLE_YEAR_SPAN: i32 = 1;

/// First standalone four-digit number close to `reference_year`.
///
/// Postal codes and phone number fragments ("1004 Lausanne") are skipped.
pub fn find_plausible_year(text: &str, reference_year: i32) -> Option<i32> {
    YEAR.captures_iter(text)
        .filter_map(|caps| caps[1].parse::<i32>().ok())
        .find(|year| (year - reference_year).abs() <= PLAUSIBLE_YEAR_SPAN)
}

/// Month number for a month name or abbreviation
pub fn month_from_name(name: &str, locale: Locale) -> Option<u32> {
    let folded = fold_accents(&name.trim().trim_end_matches('.').to_lowercase());
    let table: &[(&str, u32)] = match locale {
        Locale::Fr => &[
            ("janvier", 1), ("janv", 1), ("jan", 1),
            ("fevrier", 2), ("fevr", 2), ("fev", 2),
            ("mars", 3),
            ("avril", 4), ("avr", 4),
            ("mai", 5),
            ("juin", 6),
            ("juillet", 7), ("juil", 7),
            ("aout", 8),
            ("septembre", 9), ("sept", 9), ("sep", 9),
            ("octobre", 10), ("oct", 10),
            ("novembre", 11), ("nov", 11),
            ("decembre", 12), ("dec", 12),
        ],
        Locale::En => &[
            ("january", 1), ("jan", 1),
            ("february", 2), ("feb", 2),
            ("march", 3), ("mar", 3),
            ("april", 4), ("apr", 4),
            ("may", 5),
            ("june", 6), ("jun", 6),
            ("july", 7), ("jul", 7),
            ("august", 8), ("aug", 8),
            ("september", 9), ("sept", 9), ("sep", 9),
            ("october", 10), ("oct", 10),
            ("november", 11), ("nov", 11),
            ("december", 12), ("dec", 12),
        ],
    };
    table
        .iter()
        .find(|(candidate, _)| *candidate == folded)
        .map(|(_, month)| *month)
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'û' | 'ù' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn parse_number(digits: &str, token: &str) -> ParsingResult<u32> {
    digits
        .parse::<u32>()
        .map_err(|e| ParsingError::malformed_date(token, &e.to_string()))
}

fn expand_year(digits: &str, token: &str) -> ParsingResult<i32> {
    let value = digits
        .parse::<i32>()
        .map_err(|e| ParsingError::malformed_date(token, &e.to_string()))?;
    Ok(if digits.len() == 2 { 2000 + value } else { value })
}

fn checked(date: PartialDate, token: &str) -> ParsingResult<PartialDate> {
    if !(1..=31).contains(&date.day) {
        return Err(ParsingError::malformed_date(token, "day out of range"));
    }
    if let Some(month) = date.month {
        if !(1..=12).contains(&month) {
            return Err(ParsingError::malformed_date(token, "month out of range"));
        }
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("04.08.2025", 4, Some(8), Some(2025))]
    #[case("4/8/25", 4, Some(8), Some(2025))]
    #[case("04-08", 4, Some(8), None)]
    #[case("4 août 2025", 4, Some(8), Some(2025))]
    #[case("1er AOUT", 1, Some(8), None)]
    #[case("12 déc. 2024", 12, Some(12), Some(2024))]
    #[case("8", 8, None, None)]
    fn test_parse_french_tokens(
        #[case] token: &str,
        #[case] day: u32,
        #[case] month: Option<u32>,
        #[case] year: Option<i32>,
    ) {
        let parsed = parse_date_token(token, Locale::Fr).unwrap();
        assert_eq!(parsed, PartialDate { day, month, year });
    }

    #[rstest]
    #[case("32.08.2025")]
    #[case("04.13.2025")]
    #[case("4 brumaire 2025")]
    #[case("semaine")]
    fn test_malformed_tokens(#[case] token: &str) {
        let err = parse_date_token(token, Locale::Fr).unwrap_err();
        assert!(matches!(err, ParsingError::MalformedDate { .. }));
    }

    #[test]
    fn test_english_month_names() {
        let parsed = parse_date_token("4 August 2025", Locale::En).unwrap();
        assert_eq!(parsed.to_date(2000).unwrap(), ymd(2025, 8, 4));
        assert!(parse_date_token("4 août 2025", Locale::En).is_err());
    }

    #[test]
    fn test_range_borrows_month_and_year() {
        let (start, end) = parse_date_range("4", "8 août 2025", Locale::Fr, 1999).unwrap();
        assert_eq!(start, ymd(2025, 8, 4));
        assert_eq!(end, ymd(2025, 8, 8));
    }

    #[test]
    fn test_range_across_new_year() {
        let (start, end) =
            parse_date_range("29 décembre", "2 janvier 2026", Locale::Fr, 1999).unwrap();
        assert_eq!(start, ymd(2025, 12, 29));
        assert_eq!(end, ymd(2026, 1, 2));
    }

    #[test]
    fn test_range_without_year_uses_default() {
        let (start, _) = parse_date_range("04.08", "08.08", Locale::Fr, 2031).unwrap();
        assert_eq!(start, ymd(2031, 8, 4));
    }

    #[test]
    fn test_invalid_calendar_date() {
        let partial = parse_date_token("31.02.2025", Locale::Fr).unwrap();
        assert!(partial.to_date(2025).is_err());
    }

    #[test]
    fn test_range_borrowing_month_across_new_year() {
        let (start, end) = parse_date_range("29", "2 janvier 2026", Locale::Fr, 1999).unwrap();
        assert_eq!(start, ymd(2025, 12, 29));
        assert_eq!(end, ymd(2026, 1, 2));
    }

    #[test]
    fn test_range_borrowing_month_into_shorter_month() {
        // 31 April does not exist, the week starts on 31 March
        let (start, _) = parse_date_range("31", "4 avril 2025", Locale::Fr, 1999).unwrap();
        assert_eq!(start, ymd(2025, 3, 31));
    }

    #[test]
    fn test_find_plausible_year() {
        assert_eq!(find_plausible_year("Semaine N° 32 2025", 2025), Some(2025));
        assert_eq!(find_plausible_year("1004 Lausanne, menus 2026", 2025), Some(2026));
        assert_eq!(find_plausible_year("Crèche, 1004 Lausanne", 2025), None);
        assert_eq!(find_plausible_year("menu 12345 sans année", 2025), None);
    }
}
