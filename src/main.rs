//! `cafeteria-menus` command line entry point

use anyhow::{Context, Result, anyhow, bail};
use cafeteria_menus_lib::application::{IngestionReport, MenuIngestionService};
use cafeteria_menus_lib::infrastructure::config::{AppConfig, SourceConfig};
use cafeteria_menus_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use cafeteria_menus_lib::infrastructure::{
    ConfigManager, DatabaseConnection, HttpClient, MenuExtractor, ParseContext,
    SqliteMenuRepository, first_page_text,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "cafeteria-menus")]
#[command(about = "Extract weekly cafeteria menus and store them by date", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, extract and store the menus of the configured sources.
    Run {
        /// Only run these sources (repeatable). Default: all
        #[arg(short, long = "source")]
        sources: Vec<String>,
        /// Use a throwaway in-memory database; only report what would be saved.
        #[arg(long)]
        dry_run: bool,
    },

    /// Extract one local document offline and print the entries as JSON.
    Extract {
        /// Source whose format profile is used
        #[arg(short, long)]
        source: String,
        /// Plain text file, or a PDF when the extension is .pdf
        #[arg(short, long)]
        file: PathBuf,
        /// Date assumed as "today" when the document has no year (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },

    /// List the configured sources.
    Sources,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigManager::load(cli.config.as_deref())?;
    init_logging_with_config(&config.logging)?;
    log_system_info();

    match cli.command {
        Command::Run { sources, dry_run } => run_sources(&config, &sources, dry_run).await,
        Command::Extract {
            source,
            file,
            reference_date,
        } => {
            let source = find_source(&config, &source)?;
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let is_pdf = file
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            let text = if is_pdf {
                first_page_text(&bytes)?
            } else {
                String::from_utf8(bytes).context("Document is not valid UTF-8")?
            };

            let mut context = ParseContext::new(source.name.as_str());
            if let Some(date) = reference_date {
                context = context.with_reference_date(date);
            }
            let extractor = MenuExtractor::new(source.profile.clone())?;
            let entries = extractor.extract_with_context(&text, &context);
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Sources => {
            for source in &config.sources {
                println!(
                    "{:<20} {:<20} {:<18} {}",
                    source.name,
                    source.collection,
                    source.profile.anchor_strategy.name(),
                    source.listing_url
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn find_source<'a>(config: &'a AppConfig, name: &str) -> Result<&'a SourceConfig> {
    config
        .source(name)
        .ok_or_else(|| anyhow!("Unknown source '{}'", name))
}

async fn run_sources(config: &AppConfig, names: &[String], dry_run: bool) -> Result<ExitCode> {
    let selected: Vec<SourceConfig> = if names.is_empty() {
        config.sources.clone()
    } else {
        names
            .iter()
            .map(|name| find_source(config, name).cloned())
            .collect::<Result<_>>()?
    };
    if selected.is_empty() {
        bail!("No sources configured");
    }

    let database_url = if dry_run {
        info!("Dry run: menus are stored in a throwaway in-memory database");
        "sqlite::memory:"
    } else {
        config.database.url.as_str()
    };
    let db = DatabaseConnection::new(database_url).await?;
    db.migrate().await.context("Failed to migrate database")?;

    let fetcher = HttpClient::with_settings(config.http.clone())?.with_context_label("ingestion");
    let service = MenuIngestionService::new(
        Arc::new(fetcher),
        Arc::new(SqliteMenuRepository::new(db.pool().clone())),
        config.ingestion.clone(),
    );

    let results = service.ingest_all(&selected).await;
    let mut any_failed = false;
    for (name, result) in &results {
        match result {
            Ok(report) => print_report(report),
            Err(e) => {
                any_failed = true;
                println!("{:<20} FAILED: {:#}", name, e);
            }
        }
    }

    Ok(if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_report(report: &IngestionReport) {
    println!(
        "{:<20} documents {} ({} failed), entries {}, saved {}, duplicates {}, dateless {}, errors {}",
        report.source,
        report.documents_found,
        report.documents_failed,
        report.entries_extracted,
        report.saves.saved,
        report.saves.duplicates,
        report.saves.skipped_dateless,
        report.saves.failed
    );
}
