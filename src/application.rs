//! Application layer module
//!
//! This module contains the ingestion use cases that orchestrate document
//! fetching, menu extraction and storage.

pub mod ingestion_service;

pub use ingestion_service::{CollectedMenus, IngestionReport, MenuIngestionService};
