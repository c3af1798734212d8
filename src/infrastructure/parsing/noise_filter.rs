//! Removal of legend, boilerplate and footnote lines

use crate::domain::FormatProfile;
use tracing::trace;

/// Line filter built from a profile's noise patterns
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    prefixes: Vec<String>,
    substrings: Vec<String>,
}

impl NoiseFilter {
    pub fn new(prefixes: &[String], substrings: &[String]) -> Self {
        let lowered = |patterns: &[String]| -> Vec<String> {
            patterns
                .iter()
                .map(|p| p.trim_start().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            prefixes: lowered(prefixes),
            substrings: lowered(substrings),
        }
    }

    pub fn from_profile(profile: &FormatProfile) -> Self {
        Self::new(&profile.noise_prefixes, &profile.noise_substrings)
    }

    /// Check a single line against the configured patterns
    pub fn is_noise(&self, line: &str) -> bool {
        let content = line.trim().to_lowercase();
        if content.is_empty() {
            return false;
        }
        self.prefixes.iter().any(|p| content.starts_with(p.as_str()))
            || self.substrings.iter().any(|s| content.contains(s.as_str()))
    }

    /// Drop noise lines; whitespace-only lines are kept as empty lines.
    ///
    /// Must run after the week anchor has been resolved, since the week
    /// header is often one of the filtered lines.
    pub fn filter(&self, text: &str) -> String {
        let mut kept = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                kept.push("");
            } else if self.is_noise(line) {
                trace!("dropping noise line: {}", line.trim());
            } else {
                kept.push(line);
            }
        }
        kept.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cver_filter() -> NoiseFilter {
        NoiseFilter::from_profile(&FormatProfile::cver())
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let filter = cver_filter();
        assert!(filter.is_noise("Rouge : porc"));
        assert!(filter.is_noise("   PROVENANCE : Suisse"));
        assert!(!filter.is_noise("Filet de porc rouge"));
    }

    #[test]
    fn test_substring_match() {
        let filter = cver_filter();
        assert!(filter.is_noise("Menus - Semaine du 04.08.2025 au 08.08.2025"));
    }

    #[test]
    fn test_blank_lines_preserved() {
        let filter = cver_filter();
        let text = "lundi\n   \nRiz\nRouge : porc\n\nmardi";
        assert_eq!(filter.filter(text), "lundi\n\nRiz\n\nmardi");
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = NoiseFilter::default();
        assert_eq!(filter.filter("a\n b \n"), "a\n b ");
    }
}
