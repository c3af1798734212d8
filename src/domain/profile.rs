//! Format profiles describing how one provider lays out its weekly menu
//!
//! A profile is plain data: the extraction engine has no per-provider code,
//! every difference between providers is expressed here.

use serde::{Deserialize, Serialize};

/// How the calendar date of the week's first day is found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// "<lead> <date1> <separator> <date2>", e.g. "Semaine du 04.08.2025 au 08.08.2025"
    DateRangeHeader { lead: String, separator: String },

    /// "<label> <n>" plus a standalone four-digit year, e.g. "Semaine N° 32 ... 2025"
    IsoWeekNumber { label: String },

    /// A day+month token right after each weekday token, e.g. "Lundi 4 août"
    InlineDayMonth,
}

impl AnchorStrategy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DateRangeHeader { .. } => "date_range_header",
            Self::IsoWeekNumber { .. } => "iso_week_number",
            Self::InlineDayMonth => "inline_day_month",
        }
    }
}

/// Month-name vocabulary used when parsing textual dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

/// Static description of one source variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatProfile {
    /// Weekday labels in week order; the index is the day offset from the anchor
    pub weekday_tokens: Vec<String>,

    /// Lines starting with one of these (case-insensitive, trimmed) are dropped
    #[serde(default)]
    pub noise_prefixes: Vec<String>,

    /// Lines containing one of these (case-insensitive) are dropped
    #[serde(default)]
    pub noise_substrings: Vec<String>,

    pub anchor_strategy: AnchorStrategy,

    #[serde(default)]
    pub locale: Locale,

    /// Token that closes a weekday block even without a following weekday
    #[serde(default)]
    pub trailing_sentinel: Option<String>,
}

impl FormatProfile {
    pub fn new(weekday_tokens: &[&str], anchor_strategy: AnchorStrategy) -> Self {
        Self {
            weekday_tokens: weekday_tokens.iter().map(|t| (*t).to_string()).collect(),
            noise_prefixes: Vec::new(),
            noise_substrings: Vec::new(),
            anchor_strategy,
            locale: Locale::Fr,
            trailing_sentinel: None,
        }
    }

    pub fn with_noise_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.noise_prefixes = prefixes.iter().map(|p| (*p).to_string()).collect();
        self
    }

    pub fn with_noise_substrings(mut self, substrings: &[&str]) -> Self {
        self.noise_substrings = substrings.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_trailing_sentinel(mut self, sentinel: &str) -> Self {
        self.trailing_sentinel = Some(sentinel.to_string());
        self
    }

    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Day offset of a weekday token from the start of the week
    pub fn weekday_offset(&self, token: &str) -> Option<usize> {
        let token = token.trim().to_lowercase();
        self.weekday_tokens
            .iter()
            .position(|t| t.trim().to_lowercase() == token)
    }

    /// CVER: weekly PDF, "Semaine du dd.mm.yyyy au dd.mm.yyyy", colour legend noise
    pub fn cver() -> Self {
        Self::new(
            &["lundi", "mardi", "mercredi", "jeudi", "vendredi"],
            AnchorStrategy::DateRangeHeader {
                lead: "semaine du".to_string(),
                separator: "au".to_string(),
            },
        )
        .with_noise_prefixes(&[
            "rouge :",
            "jaune :",
            "bleu :",
            "brun :",
            "vert :",
            "provenance :",
            "poulet, ",
            "poisson :",
            "les menus de laure et françois",
        ])
        .with_noise_substrings(&["semaine du"])
    }

    /// Green Kids: weekly PDF, "Semaine N° 32", allergy section after Friday
    pub fn greenkids() -> Self {
        Self::new(
            &["LUNDI", "MARDI", "MERCREDI", "JEUDI", "VENDREDI"],
            AnchorStrategy::IsoWeekNumber {
                label: "Semaine N°".to_string(),
            },
        )
        .with_trailing_sentinel("Allergies")
    }

    /// La Coccinelle Verte: HTML page, "du 4 au 8 août 2025" above Monday
    pub fn la_coccinelle_verte() -> Self {
        Self::new(
            &["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi"],
            AnchorStrategy::DateRangeHeader {
                lead: "du".to_string(),
                separator: "au".to_string(),
            },
        )
    }
}
