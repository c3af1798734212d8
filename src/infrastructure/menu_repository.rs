//! SQLite implementation of the menu repository

#![allow(clippy::uninlined_format_args)]

use crate::domain::repositories::{MenuRepository, SaveFailure, SaveOutcome, StoredMenu};
use crate::domain::MenuEntry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteMenuRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteMenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl MenuRepository for SqliteMenuRepository {
    async fn save_menu(&self, source: &str, collection: &str, entry: &MenuEntry) -> SaveOutcome {
        let id = Uuid::new_v4().to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO menus (id, source, collection, day_of_week, menu_date, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(source)
        .bind(collection)
        .bind(&entry.day_of_week)
        .bind(entry.date)
        .bind(&entry.description)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Saved {} {:?} into '{}' as {}", entry.day_of_week, entry.date, collection, id);
                Ok(id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(SaveFailure::Duplicate {
                    collection: collection.to_string(),
                    day_of_week: entry.day_of_week.clone(),
                    date: entry.date.unwrap_or_default(),
                })
            }
            Err(e) => {
                warn!("Failed to save {} into '{}': {}", entry.day_of_week, collection, e);
                Err(SaveFailure::Database(e.to_string()))
            }
        }
    }

    async fn list_menus(&self, collection: &str) -> Result<Vec<StoredMenu>> {
        let rows = sqlx::query(
            r#"
            SELECT id, source, collection, day_of_week, menu_date, description
            FROM menus
            WHERE collection = ?
            ORDER BY menu_date IS NULL, menu_date ASC, created_at ASC, rowid ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&*self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<StoredMenu> {
                let date: Option<NaiveDate> = row.try_get("menu_date")?;
                Ok(StoredMenu {
                    id: row.try_get("id")?,
                    source: row.try_get("source")?,
                    collection: row.try_get("collection")?,
                    entry: MenuEntry::new(
                        row.try_get::<String, _>("day_of_week")?,
                        date,
                        row.try_get::<String, _>("description")?,
                    ),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::DatabaseConnection;

    async fn repository() -> SqliteMenuRepository {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteMenuRepository::new(db.pool().clone())
    }

    fn entry(day: &str, date: Option<(i32, u32, u32)>, description: &str) -> MenuEntry {
        MenuEntry::new(
            day,
            date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            description,
        )
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let repo = repository().await;
        let mardi = entry("Mardi", Some((2025, 8, 5)), "Poulet");
        let lundi = entry("Lundi", Some((2025, 8, 4)), "Riz");

        let id = repo.save_menu("cver", "cver", &mardi).await.unwrap();
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
        repo.save_menu("cver", "cver", &lundi).await.unwrap();

        let stored = repo.list_menus("cver").await.unwrap();
        let entries: Vec<&MenuEntry> = stored.iter().map(|s| &s.entry).collect();
        assert_eq!(entries, vec![&lundi, &mardi]);
        assert!(repo.list_menus("greenkids").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_is_reported() {
        let repo = repository().await;
        let lundi = entry("Lundi", Some((2025, 8, 4)), "Riz");
        repo.save_menu("cver", "cver", &lundi).await.unwrap();

        let again = repo.save_menu("cver", "cver", &lundi).await;
        assert!(matches!(again, Err(SaveFailure::Duplicate { .. })));

        // same day in another collection is not a duplicate
        assert!(repo.save_menu("greenkids", "greenkids", &lundi).await.is_ok());
    }

    #[tokio::test]
    async fn test_dateless_entries_do_not_collide() {
        let repo = repository().await;
        let undated = entry("Lundi", None, "Riz");
        repo.save_menu("cver", "cver", &undated).await.unwrap();
        repo.save_menu("cver", "cver", &undated).await.unwrap();

        let stored = repo.list_menus("cver").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|s| s.entry.date.is_none()));
    }
}
