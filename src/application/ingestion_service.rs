//! Menu ingestion jobs
//!
//! One job per source: discover documents on the listing page, fetch and
//! convert each one to text, extract entries, then persist them. A document
//! that fails to fetch or convert is logged and skipped; the others still
//! count.

#![allow(clippy::uninlined_format_args)]

use crate::domain::{MenuEntry, MenuRepository, SaveFailure, SaveOutcome, SaveReport};
use crate::infrastructure::config::{DocumentKind, IngestionConfig, LinkDiscovery, SourceConfig};
use crate::infrastructure::html_parser::{discover_links, fragment_text};
use crate::infrastructure::parsing::{MenuExtractor, ParseContext};
use crate::infrastructure::pdf_text::first_page_text;
use crate::infrastructure::simple_http_client::DocumentFetcher;
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Entries extracted from every document of one source
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectedMenus {
    pub documents_found: usize,
    pub documents_failed: usize,
    pub entries: Vec<MenuEntry>,
}

/// Result of one ingestion job
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub source: String,
    pub documents_found: usize,
    pub documents_failed: usize,
    pub entries_extracted: usize,
    pub saves: SaveReport,
}

impl IngestionReport {
    pub const fn has_new_menus(&self) -> bool {
        self.saves.saved > 0
    }
}

/// Runs ingestion jobs against a document fetcher and a menu repository
#[derive(Clone)]
pub struct MenuIngestionService {
    fetcher: Arc<dyn DocumentFetcher>,
    repository: Arc<dyn MenuRepository>,
    settings: IngestionConfig,
}

impl MenuIngestionService {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        repository: Arc<dyn MenuRepository>,
        settings: IngestionConfig,
    ) -> Self {
        Self {
            fetcher,
            repository,
            settings,
        }
    }

    /// Discover, fetch, convert and extract; nothing is persisted
    pub async fn collect(&self, source: &SourceConfig) -> Result<CollectedMenus> {
        let extractor = MenuExtractor::new(source.profile.clone())
            .with_context(|| format!("Invalid profile for source '{}'", source.name))?;

        let listing = self
            .fetcher
            .fetch_text(&source.listing_url)
            .await
            .with_context(|| format!("[{}] Failed to fetch listing page", source.name))?;

        let mut links = discover_links(&listing, &source.listing_url, &source.discovery)
            .with_context(|| format!("[{}] Failed to discover documents", source.name))?;
        if let Some(limit) = self.settings.max_documents_per_source {
            links.truncate(limit);
        }
        info!("[{}] {} document(s) to process", source.name, links.len());

        let context = ParseContext::new(source.name.as_str());
        let mut collected = CollectedMenus {
            documents_found: links.len(),
            ..CollectedMenus::default()
        };

        for link in &links {
            match self.document_text(source, link, &listing).await {
                Ok(text) => {
                    let entries = extractor.extract_with_context(&text, &context);
                    debug!("[{}] {} entries from {}", source.name, entries.len(), link);
                    collected.entries.extend(entries);
                }
                Err(e) => {
                    warn!("[{}] Skipping document {}: {:#}", source.name, link, e);
                    collected.documents_failed += 1;
                }
            }
        }
        Ok(collected)
    }

    /// Collect then persist every entry, one [`SaveOutcome`] each
    pub async fn ingest(&self, source: &SourceConfig) -> Result<IngestionReport> {
        let collected = self.collect(source).await?;
        let mut saves = SaveReport::default();

        for entry in &collected.entries {
            let outcome = self.save_entry(source, entry).await;
            match &outcome {
                Ok(id) => info!("[{}] Saved {} {:?} ({})", source.name, entry.day_of_week, entry.date, id),
                Err(SaveFailure::Duplicate { .. }) => {
                    debug!("[{}] {} {:?} already stored", source.name, entry.day_of_week, entry.date);
                }
                Err(failure @ SaveFailure::Dateless { .. }) => warn!("[{}] {}", source.name, failure),
                Err(failure @ SaveFailure::Database(_)) => error!("[{}] {}", source.name, failure),
            }
            saves.record(&outcome);
        }

        let report = IngestionReport {
            source: source.name.clone(),
            documents_found: collected.documents_found,
            documents_failed: collected.documents_failed,
            entries_extracted: collected.entries.len(),
            saves,
        };
        if !report.has_new_menus() {
            error!("[{}] No new menus found", source.name);
        }
        info!(
            "[{}] saved {}, duplicates {}, dateless skipped {}, failed {}",
            source.name, saves.saved, saves.duplicates, saves.skipped_dateless, saves.failed
        );
        Ok(report)
    }

    /// Run independent sources concurrently; results keep the input order
    pub async fn ingest_all(&self, sources: &[SourceConfig]) -> Vec<(String, Result<IngestionReport>)> {
        join_all(sources.iter().map(|source| async move {
            let result = self.ingest(source).await;
            if let Err(e) = &result {
                error!("[{}] Ingestion failed: {:#}", source.name, e);
            }
            (source.name.clone(), result)
        }))
        .await
    }

    async fn save_entry(&self, source: &SourceConfig, entry: &MenuEntry) -> SaveOutcome {
        if !entry.is_dated() && !self.settings.persist_dateless {
            return Err(SaveFailure::Dateless {
                day_of_week: entry.day_of_week.clone(),
            });
        }
        self.repository
            .save_menu(&source.name, &source.collection, entry)
            .await
    }

    async fn document_text(&self, source: &SourceConfig, link: &str, listing: &str) -> Result<String> {
        match &source.document {
            DocumentKind::Pdf => {
                let bytes = self.fetcher.fetch_bytes(link).await?;
                // PDF decoding is CPU bound
                let text = tokio::task::spawn_blocking(move || first_page_text(&bytes))
                    .await
                    .context("PDF conversion task failed")??;
                Ok(text)
            }
            DocumentKind::HtmlFragment {
                selector,
                unwrap_tags,
                skip_leading_nodes,
            } => {
                let page = if source.discovery == LinkDiscovery::ListingPage {
                    listing.to_string()
                } else {
                    self.fetcher.fetch_text(link).await?
                };
                Ok(fragment_text(&page, selector, unwrap_tags, *skip_leading_nodes)?)
            }
        }
    }
}
