//! Configuration infrastructure
//!
//! Configuration is layered:
//! 1. Built-in defaults (including the three known menu sources)
//! 2. Optional TOML file (`--config`, else the user config directory)
//! 3. Environment variables `CAFETERIA_MENUS__SECTION__KEY`
//!
//! The merged result is validated before use: a bad source profile fails
//! at startup, not in the middle of an ingestion run.

#![allow(clippy::uninlined_format_args)]

use crate::domain::FormatProfile;
use crate::infrastructure::parsing::MenuExtractor;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Validation { message: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub http: HttpClientSettings,
    pub database: DatabaseConfig,
    pub ingestion: IngestionConfig,

    /// Menu sources; the built-in ones when not configured
    pub sources: Vec<SourceConfig>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; the user data directory when unset
    pub log_dir: Option<PathBuf>,

    /// Number of daily log files to keep
    pub max_files: usize,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

/// HTTP behaviour shared by every source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientSettings {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum retries after the first attempt
    pub max_retries: u32,

    /// Backoff base: the n-th retry waits `backoff_factor_ms * 2^(n-1)`
    pub backoff_factor_ms: u64,

    /// Upper bound for a single wait, including `Retry-After`
    pub max_backoff_ms: u64,

    /// Status codes that trigger a retry
    pub retry_statuses: Vec<u16>,

    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:data/menus.db`
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Store entries whose week anchor could not be resolved
    pub persist_dateless: bool,

    /// Only the first N discovered documents of each source are processed
    pub max_documents_per_source: Option<usize>,
}

/// How the documents of a source are found on its listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkDiscovery {
    /// Every quoted attribute value ending in `.pdf`
    PdfHrefPattern,

    /// Anchors whose text starts with `prefix`
    AnchorTextPrefix { prefix: String },

    /// The listing page itself is the only document
    ListingPage,
}

/// How a fetched document is turned into plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentKind {
    /// Text of the first PDF page
    Pdf,

    /// Text nodes of the first element matching `selector`
    HtmlFragment {
        selector: String,

        /// Inline tags merged into the surrounding text
        #[serde(default)]
        unwrap_tags: Vec<String>,

        /// Leading child nodes of the fragment to ignore
        #[serde(default)]
        skip_leading_nodes: usize,
    },
}

/// One cafeteria menu provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name used on the command line and in logs
    pub name: String,

    /// Collection the menus are stored under
    pub collection: String,

    pub listing_url: String,
    pub discovery: LinkDiscovery,
    pub document: DocumentKind,
    pub profile: FormatProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            http: HttpClientSettings::default(),
            database: DatabaseConfig::default(),
            ingestion: IngestionConfig::default(),
            sources: defaults::builtin_sources(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("pdf_extract".to_string(), "error".to_string());
                filters
            },
        }
    }
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            backoff_factor_ms: defaults::BACKOFF_FACTOR_MS,
            max_backoff_ms: defaults::MAX_BACKOFF_MS,
            retry_statuses: defaults::RETRY_STATUSES.to_vec(),
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            persist_dateless: false,
            max_documents_per_source: None,
        }
    }
}

impl AppConfig {
    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Check cross-field constraints the type system cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::validation("http.timeout_seconds must be greater than 0"));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::validation("database.url must not be empty"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            source.validate()?;
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() || self.collection.trim().is_empty() {
            return Err(ConfigError::validation(
                "source name and collection must not be empty",
            ));
        }
        url::Url::parse(&self.listing_url).map_err(|e| {
            ConfigError::validation(format!(
                "source '{}': invalid listing_url '{}': {}",
                self.name, self.listing_url, e
            ))
        })?;
        if let LinkDiscovery::AnchorTextPrefix { prefix } = &self.discovery {
            if prefix.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "source '{}': anchor prefix must not be empty",
                    self.name
                )));
            }
        }
        MenuExtractor::new(self.profile.clone())
            .map_err(|e| ConfigError::validation(format!("source '{}': {}", self.name, e)))?;
        Ok(())
    }
}

/// Loads the layered configuration
pub struct ConfigManager;

impl ConfigManager {
    /// Default config file location: `<user config dir>/cafeteria-menus/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME).join("config.toml"))
    }

    /// Default directory for log files
    pub fn default_log_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(defaults::APP_DIR_NAME)
            .join("logs")
    }

    /// Load defaults, then the file (required when given explicitly), then the environment
    pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_config_path() {
                    debug!("Looking for optional configuration at {:?}", default_path);
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        info!(
            "Configuration loaded: {} source(s), database {}",
            app_config.sources.len(),
            app_config.database.url
        );
        Ok(app_config)
    }
}

/// Default configuration values
pub mod defaults {
    use super::{DocumentKind, LinkDiscovery, SourceConfig};
    use crate::domain::FormatProfile;

    pub const APP_DIR_NAME: &str = "cafeteria-menus";
    pub const ENV_PREFIX: &str = "CAFETERIA_MENUS";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_MAX_FILES: usize = 7;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_RETRIES: u32 = 5;
    pub const BACKOFF_FACTOR_MS: u64 = 500;
    pub const MAX_BACKOFF_MS: u64 = 60_000;
    pub const RETRY_STATUSES: [u16; 7] = [429, 500, 502, 503, 504, 509, 510];

    /// Some providers reject non-browser clients
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "fr-CH,fr;q=0.9,en;q=0.8";

    pub const DATABASE_URL: &str = "sqlite:data/menus.db";

    pub const CVER_LISTING_URL: &str = "https://cver.ch/?page_id=1467";
    pub const GREENKIDS_LISTING_URL: &str = "https://www.greenkids.biz/nos-menus";
    pub const LA_COCCINELLE_VERTE_LISTING_URL: &str = "https://lacoccinelleverte.net/nos-menus/";

    pub fn builtin_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                name: "cver".to_string(),
                collection: "cver".to_string(),
                listing_url: CVER_LISTING_URL.to_string(),
                discovery: LinkDiscovery::PdfHrefPattern,
                document: DocumentKind::Pdf,
                profile: FormatProfile::cver(),
            },
            SourceConfig {
                name: "greenkids".to_string(),
                collection: "greenkids".to_string(),
                listing_url: GREENKIDS_LISTING_URL.to_string(),
                discovery: LinkDiscovery::AnchorTextPrefix {
                    prefix: "Menus".to_string(),
                },
                document: DocumentKind::Pdf,
                profile: FormatProfile::greenkids(),
            },
            SourceConfig {
                name: "lacoccinelleverte".to_string(),
                collection: "lacoccinelleverte".to_string(),
                listing_url: LA_COCCINELLE_VERTE_LISTING_URL.to_string(),
                discovery: LinkDiscovery::ListingPage,
                document: DocumentKind::HtmlFragment {
                    selector: ".entry-content".to_string(),
                    unwrap_tags: vec!["amp-fit-text".to_string(), "strong".to_string()],
                    skip_leading_nodes: 1,
                },
                profile: FormatProfile::la_coccinelle_verte(),
            },
        ]
    }
}
