//! Infrastructure layer for menu extraction, documents, storage and configuration
//!
//! This module provides the extraction engine, document fetching and
//! conversion, database connections and the logging/config plumbing.

pub mod config; // Layered configuration and built-in sources
pub mod database_connection;
pub mod html_parser; // Link discovery and HTML fragment text
pub mod logging; // Logging infrastructure
pub mod menu_repository;
pub mod parsing; // Menu extraction engine
pub mod parsing_error; // Shared parsing error types
pub mod pdf_text;
pub mod simple_http_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, ConfigManager, DocumentKind, LinkDiscovery, SourceConfig};
pub use database_connection::DatabaseConnection;
pub use html_parser::{discover_links, fragment_text};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use menu_repository::SqliteMenuRepository;
pub use parsing::{extract, MenuExtractor, ParseContext, ParsingError, ParsingResult};
pub use pdf_text::first_page_text;
pub use simple_http_client::{DocumentFetcher, HttpClient};
