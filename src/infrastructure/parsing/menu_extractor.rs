//! Profile-driven weekly menu extraction
//!
//! Fixed pipeline, never reordered:
//! text normalization -> week anchor (on unfiltered text) -> noise filter
//! -> day segmentation -> description cleanup per block.

use super::context::ParseContext;
use super::date_tokens::find_plausible_year;
use super::day_segmenter::DayBlockSegmenter;
use super::description::normalize_description;
use super::noise_filter::NoiseFilter;
use super::text_normalizer::normalize_text;
use super::week_anchor::WeekAnchorResolver;
use super::ParsingResult;
use crate::domain::menu::day_label;
use crate::domain::{DayBlock, FormatProfile, MenuEntry, WeekAnchor};
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Extractor compiled from one [`FormatProfile`]; cheap to share across threads
#[derive(Debug, Clone)]
pub struct MenuExtractor {
    profile: FormatProfile,
    anchor_resolver: WeekAnchorResolver,
    noise_filter: NoiseFilter,
    segmenter: DayBlockSegmenter,
}

impl MenuExtractor {
    /// Compile a profile; fails only when the profile itself is unusable
    pub fn new(profile: FormatProfile) -> ParsingResult<Self> {
        let anchor_resolver = WeekAnchorResolver::from_profile(&profile)?;
        let segmenter = DayBlockSegmenter::from_profile(&profile)?;
        let noise_filter = NoiseFilter::from_profile(&profile);
        Ok(Self {
            profile,
            anchor_resolver,
            noise_filter,
            segmenter,
        })
    }

    pub const fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    /// Extract entries assuming today as the reference date
    pub fn extract(&self, raw_text: &str) -> Vec<MenuEntry> {
        self.extract_with_context(raw_text, &ParseContext::default())
    }

    /// Extract entries from one document.
    ///
    /// Never fails: an unresolved anchor yields dateless entries and a text
    /// without weekday tokens yields an empty vector.
    pub fn extract_with_context(&self, raw_text: &str, context: &ParseContext) -> Vec<MenuEntry> {
        let normalized = normalize_text(raw_text);

        // the week header is usually a noise line, so anchor before filtering
        let anchor = self.anchor_resolver.resolve(&normalized, context);
        let document_year = find_plausible_year(&normalized, context.reference_year())
            .unwrap_or_else(|| context.reference_year());

        let filtered = self.noise_filter.filter(&normalized);
        let blocks = self.segmenter.segment(&filtered);
        if blocks.is_empty() {
            info!("[{}] no weekday blocks found", context.source);
            return Vec::new();
        }
        if anchor.is_none() && !self.anchor_resolver.is_per_block() {
            warn!(
                "[{}] {} entries will have no date ({} anchor not found)",
                context.source,
                blocks.len(),
                self.profile.anchor_strategy.name()
            );
        }

        let entries: Vec<MenuEntry> = blocks
            .iter()
            .map(|block| self.build_entry(block, &filtered, anchor, document_year))
            .collect();

        debug!(
            "[{}] extracted {} entries ({} dated)",
            context.source,
            entries.len(),
            entries.iter().filter(|e| e.is_dated()).count()
        );
        entries
    }

    /// Extract several independent documents in parallel, keeping input order
    pub fn extract_batch<S>(&self, raw_texts: &[S], context: &ParseContext) -> Vec<Vec<MenuEntry>>
    where
        S: AsRef<str> + Sync,
    {
        raw_texts
            .par_iter()
            .map(|text| self.extract_with_context(text.as_ref(), context))
            .collect()
    }

    fn build_entry(
        &self,
        block: &DayBlock,
        text: &str,
        anchor: Option<WeekAnchor>,
        document_year: i32,
    ) -> MenuEntry {
        let body = block.text(text);
        let (date, body) = if self.anchor_resolver.is_per_block() {
            self.inline_date(body, block.weekday_index, document_year)
        } else {
            (anchor.and_then(|a| a.date_for(block.weekday_index)), body)
        };

        MenuEntry::new(day_label(&block.weekday), date, normalize_description(body))
    }

    fn inline_date<'a>(
        &self,
        body: &'a str,
        offset: usize,
        year: i32,
    ) -> (Option<NaiveDate>, &'a str) {
        match self.anchor_resolver.resolve_inline(body, offset, year) {
            Some(found) => (
                found.anchor.date_for(offset),
                body.get(found.consumed..).unwrap_or_default(),
            ),
            None => (None, body),
        }
    }
}

/// One-shot extraction; errors only on an invalid profile
pub fn extract(raw_text: &str, profile: &FormatProfile) -> ParsingResult<Vec<MenuEntry>> {
    let extractor = MenuExtractor::new(profile.clone())?;
    Ok(extractor.extract(raw_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnchorStrategy, Locale};

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn context() -> ParseContext {
        ParseContext::new("test").with_reference_date(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
    }

    #[test]
    fn test_cver_style_document() {
        let raw = "Les menus de Laure et François\r\n\
                   Semaine du 04.08.2025 au 08.08.2025\r\n\
                   lundi\r\n  Potage   de légumes\r\nRiz\r\nRiz\r\n\
                   mardi\r\nPoulet rôti\r\nRouge : porc\r\n\
                   Jaune : contient du Gluten\r\n";
        let extractor = MenuExtractor::new(FormatProfile::cver()).unwrap();
        let entries = extractor.extract_with_context(raw, &context());

        assert_eq!(
            entries,
            vec![
                MenuEntry::new("Lundi", ymd(2025, 8, 4), "Potage de légumes\nRiz"),
                MenuEntry::new("Mardi", ymd(2025, 8, 5), "Poulet rôti"),
            ]
        );
    }

    #[test]
    fn test_missing_anchor_keeps_entries() {
        let extractor = MenuExtractor::new(FormatProfile::cver()).unwrap();
        let entries = extractor.extract_with_context("lundi\nRiz\nmardi\nPoulet", &context());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.date.is_none()));
    }

    #[test]
    fn test_inline_day_month_per_block() {
        let profile = FormatProfile::new(
            &["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi"],
            AnchorStrategy::InlineDayMonth,
        );
        let extractor = MenuExtractor::new(profile).unwrap();
        let raw = "Lundi 4 août\nRiz\nMardi 5 août\nPoulet\nMercredi\nPâtes";
        let entries = extractor.extract_with_context(raw, &context());

        assert_eq!(
            entries,
            vec![
                MenuEntry::new("Lundi", ymd(2025, 8, 4), "Riz"),
                MenuEntry::new("Mardi", ymd(2025, 8, 5), "Poulet"),
                MenuEntry::new("Mercredi", None, "Pâtes"),
            ]
        );
    }

    #[test]
    fn test_inline_uses_document_year() {
        let profile = FormatProfile::new(&["Monday", "Tuesday"], AnchorStrategy::InlineDayMonth)
            .with_locale(Locale::En);
        let extractor = MenuExtractor::new(profile).unwrap();
        let raw = "Menu 2024\nMonday 30 December\nSoup\nTuesday 31.12\nFish";
        let entries = extractor.extract_with_context(raw, &context());
        assert_eq!(entries[0].date, ymd(2024, 12, 30));
        assert_eq!(entries[1].date, ymd(2024, 12, 31));
        assert_eq!(entries[1].description, "Fish");
    }

    #[test]
    fn test_inline_ignores_postal_code() {
        let profile = FormatProfile::new(&["Lundi", "Mardi"], AnchorStrategy::InlineDayMonth);
        let extractor = MenuExtractor::new(profile).unwrap();
        let raw = "Crèche Les Lutins, 1004 Lausanne\nLundi 4 août\nRiz\nMardi 5 août\nPoulet";
        let entries = extractor.extract_with_context(raw, &context());
        assert_eq!(entries[0].date, ymd(2025, 8, 4));
        assert_eq!(entries[1].date, ymd(2025, 8, 5));
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let extractor = MenuExtractor::new(FormatProfile::cver()).unwrap();
        let docs = vec![
            "Semaine du 04.08.2025 au 08.08.2025\nlundi\nRiz".to_string(),
            "rien".to_string(),
            "Semaine du 11.08.2025 au 15.08.2025\nvendredi\nPoisson".to_string(),
        ];
        let results = extractor.extract_batch(&docs, &context());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0][0].date, ymd(2025, 8, 4));
        assert!(results[1].is_empty());
        assert_eq!(results[2][0].date, ymd(2025, 8, 15));
    }

    #[test]
    fn test_invalid_profile() {
        let profile = FormatProfile::new(&[], AnchorStrategy::InlineDayMonth);
        assert!(extract("lundi", &profile).is_err());
    }
}
