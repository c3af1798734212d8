// Database connection and pool management
// This module handles SQLite database connections using sqlx

use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

const MAX_CONNECTIONS: u32 = 10;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            // Create database file directory if it doesn't exist
            let db_path = if database_url.starts_with("sqlite://") {
                database_url.trim_start_matches("sqlite://")
            } else if database_url.starts_with("sqlite:") {
                database_url.trim_start_matches("sqlite:")
            } else {
                database_url
            };
            let db_path = db_path.split('?').next().unwrap_or(db_path);

            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create database directory {:?}", parent))?;
                }
            }

            // Ensure the database file exists by creating it if necessary
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)
                    .with_context(|| format!("Failed to create database file {}", db_path))?;
                info!("Created database file: {}", db_path);
            }
        }

        // every in-memory connection is a separate database
        let mut options = SqlitePoolOptions::new();
        options = if in_memory {
            options.max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            options.max_connections(MAX_CONNECTIONS)
        };

        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {}", database_url))?;
        debug!("Connected to {}", database_url);

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_menus_sql = r#"
            CREATE TABLE IF NOT EXISTS menus (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                collection TEXT NOT NULL,
                day_of_week TEXT NOT NULL,
                menu_date DATE,
                description TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        // NULL dates never collide: dateless entries are not de-duplicated
        let create_indexes_sql = r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_menus_collection_date_day
                ON menus (collection, menu_date, day_of_week);
            CREATE INDEX IF NOT EXISTS idx_menus_menu_date ON menus (menu_date);
        "#;

        sqlx::query(create_menus_sql).execute(&self.pool).await?;
        sqlx::raw_sql(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}
