//! Ingestion jobs against a stub fetcher and an in-memory SQLite repository
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cafeteria_menus_lib::application::MenuIngestionService;
use cafeteria_menus_lib::domain::MenuRepository;
use cafeteria_menus_lib::infrastructure::config::IngestionConfig;
use cafeteria_menus_lib::infrastructure::{
    DatabaseConnection, DocumentFetcher, DocumentKind, LinkDiscovery, SourceConfig,
    SqliteMenuRepository,
};
use cafeteria_menus_lib::FormatProfile;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

const LISTING: &str = "https://menus.example.test/nos-menus";
const PDF_LISTING: &str = "https://pdf.example.test/menus";

#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
    documents: HashMap<String, Vec<u8>>,
}

impl StubFetcher {
    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn with_document(mut self, url: &str, bytes: &[u8]) -> Self {
        self.documents.insert(url.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {}", url))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {}", url))
    }
}

fn menu_page(header: &str) -> String {
    format!(
        r#"<html><body><div class="entry-content">
        <p>{header}</p>
        <p>Lundi</p><p>Riz <strong>cantonais</strong></p>
        <p>Mardi</p><p>Gratin</p>
        </div></body></html>"#
    )
}

fn html_source(name: &str, url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        collection: "menus-test".to_string(),
        listing_url: url.to_string(),
        discovery: LinkDiscovery::ListingPage,
        document: DocumentKind::HtmlFragment {
            selector: ".entry-content".to_string(),
            unwrap_tags: vec!["strong".to_string()],
            skip_leading_nodes: 0,
        },
        profile: FormatProfile::la_coccinelle_verte(),
    }
}

async fn setup(
    fetcher: StubFetcher,
    settings: IngestionConfig,
) -> (MenuIngestionService, Arc<SqliteMenuRepository>) {
    let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let repository = Arc::new(SqliteMenuRepository::new(db.pool().clone()));
    let service = MenuIngestionService::new(Arc::new(fetcher), repository.clone(), settings);
    (service, repository)
}

fn default_settings() -> IngestionConfig {
    IngestionConfig {
        persist_dateless: false,
        max_documents_per_source: None,
    }
}

#[tokio::test]
async fn test_dated_entries_are_saved() {
    let fetcher = StubFetcher::default().with_page(LISTING, &menu_page("Nos menus du 4 au 8 août 2025"));
    let (service, repository) = setup(fetcher, default_settings()).await;

    let report = service.ingest(&html_source("coccinelle", LISTING)).await.unwrap();
    assert_eq!(report.documents_found, 1);
    assert_eq!(report.documents_failed, 0);
    assert_eq!(report.entries_extracted, 2);
    assert_eq!(report.saves.saved, 2);
    assert!(report.has_new_menus());

    let stored = repository.list_menus("menus-test").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].entry.day_of_week, "Lundi");
    assert_eq!(stored[0].entry.date, NaiveDate::from_ymd_opt(2025, 8, 4));
    assert_eq!(stored[0].entry.description, "Riz cantonais");
    assert_eq!(stored[1].entry.date, NaiveDate::from_ymd_opt(2025, 8, 5));
    assert_eq!(stored[1].source, "coccinelle");
}

#[tokio::test]
async fn test_second_run_reports_duplicates() {
    let fetcher = StubFetcher::default().with_page(LISTING, &menu_page("Nos menus du 4 au 8 août 2025"));
    let (service, repository) = setup(fetcher, default_settings()).await;
    let source = html_source("coccinelle", LISTING);

    service.ingest(&source).await.unwrap();
    let second = service.ingest(&source).await.unwrap();

    assert_eq!(second.saves.saved, 0);
    assert_eq!(second.saves.duplicates, 2);
    assert!(!second.has_new_menus());
    assert_eq!(repository.list_menus("menus-test").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_dateless_entries_skipped_by_default() {
    let fetcher = StubFetcher::default().with_page(LISTING, &menu_page("Cette semaine"));
    let (service, repository) = setup(fetcher, default_settings()).await;

    let report = service.ingest(&html_source("coccinelle", LISTING)).await.unwrap();
    assert_eq!(report.entries_extracted, 2);
    assert_eq!(report.saves.skipped_dateless, 2);
    assert_eq!(report.saves.saved, 0);
    assert!(repository.list_menus("menus-test").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dateless_entries_persisted_when_enabled() {
    let fetcher = StubFetcher::default().with_page(LISTING, &menu_page("Cette semaine"));
    let settings = IngestionConfig {
        persist_dateless: true,
        ..default_settings()
    };
    let (service, repository) = setup(fetcher, settings).await;

    let report = service.ingest(&html_source("coccinelle", LISTING)).await.unwrap();
    assert_eq!(report.saves.saved, 2);

    let stored = repository.list_menus("menus-test").await.unwrap();
    assert!(stored.iter().all(|m| m.entry.date.is_none()));
}

#[tokio::test]
async fn test_listing_failure_fails_the_job() {
    let (service, _) = setup(StubFetcher::default(), default_settings()).await;
    let err = service.ingest(&html_source("coccinelle", LISTING)).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to fetch listing page"));
}

#[tokio::test]
async fn test_unreadable_document_is_counted_and_skipped() {
    let listing = r#"<a href="/files/menu-32.pdf">Semaine 32</a><a href="/files/menu-33.pdf">Semaine 33</a>"#;
    let fetcher = StubFetcher::default()
        .with_page(PDF_LISTING, listing)
        .with_document("https://pdf.example.test/files/menu-32.pdf", b"not a pdf at all");
    let (service, _) = setup(fetcher, default_settings()).await;

    let source = SourceConfig {
        name: "cver".to_string(),
        collection: "menus-test".to_string(),
        listing_url: PDF_LISTING.to_string(),
        discovery: LinkDiscovery::PdfHrefPattern,
        document: DocumentKind::Pdf,
        profile: FormatProfile::cver(),
    };
    let report = service.ingest(&source).await.unwrap();

    // one document is garbage, the other one is missing
    assert_eq!(report.documents_found, 2);
    assert_eq!(report.documents_failed, 2);
    assert_eq!(report.entries_extracted, 0);
}

#[tokio::test]
async fn test_document_limit_is_applied() {
    let listing = r#"<a href="/a.pdf">a</a><a href="/b.pdf">b</a><a href="/c.pdf">c</a>"#;
    let fetcher = StubFetcher::default().with_page(PDF_LISTING, listing);
    let settings = IngestionConfig {
        max_documents_per_source: Some(1),
        ..default_settings()
    };
    let (service, _) = setup(fetcher, settings).await;

    let mut source = html_source("cver", PDF_LISTING);
    source.discovery = LinkDiscovery::PdfHrefPattern;
    source.document = DocumentKind::Pdf;
    let collected = service.collect(&source).await.unwrap();
    assert_eq!(collected.documents_found, 1);
}

#[tokio::test]
async fn test_ingest_all_keeps_source_order() {
    let fetcher = StubFetcher::default().with_page(LISTING, &menu_page("Nos menus du 4 au 8 août 2025"));
    let (service, _) = setup(fetcher, default_settings()).await;

    let sources = vec![
        html_source("unreachable", "https://down.example.test/menus"),
        html_source("coccinelle", LISTING),
    ];
    let results = service.ingest_all(&sources).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "unreachable");
    assert!(results[0].1.is_err());
    assert_eq!(results[1].0, "coccinelle");
    assert_eq!(results[1].1.as_ref().unwrap().saves.saved, 2);
}
