//! `SQLite` implementation of the `RejectedPlayerRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use papervisor_core::{RejectedPlayer, RejectedPlayerRepository, RepositoryError};

/// Most entries returned by `list`.
pub const REJECTED_LIST_LIMIT: i64 = 50;

/// `SQLite` store of rejected connection attempts.
pub struct SqliteRejectedPlayerRepository {
    pool: SqlitePool,
}

impl SqliteRejectedPlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Timestamps are stored as RFC 3339 in UTC with microseconds, so text
/// order is time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::Storage(format!("invalid timestamp {raw:?}: {e}")))
}

#[async_trait]
impl RejectedPlayerRepository for SqliteRejectedPlayerRepository {
    async fn upsert(&self, username: &str) -> Result<(), RepositoryError> {
        let now = format_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO rejected_players (username, count, last_seen)
            VALUES (?, 1, ?)
            ON CONFLICT(username) DO UPDATE SET
                count = count + 1,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(username)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<RejectedPlayer>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT username, count, last_seen
            FROM rejected_players
            ORDER BY last_seen DESC, username ASC
            LIMIT ?
            "#,
        )
        .bind(REJECTED_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter()
            .map(|row| {
                let last_seen: String = row.get("last_seen");
                Ok(RejectedPlayer {
                    username: row.get("username"),
                    count: row.get("count"),
                    last_seen: parse_timestamp(&last_seen)?,
                })
            })
            .collect()
    }

    async fn delete(&self, username: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM rejected_players WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;
    use std::time::Duration;

    async fn repo() -> SqliteRejectedPlayerRepository {
        SqliteRejectedPlayerRepository::new(setup_test_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_increments_count() {
        let repo = repo().await;
        repo.upsert("Bob").await.unwrap();
        repo.upsert("Bob").await.unwrap();
        repo.upsert("Bob").await.unwrap();

        let list = repo.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].username, "Bob");
        assert_eq!(list[0].count, 3);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let repo = repo().await;
        repo.upsert("Alice").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        repo.upsert("Bob").await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.username)
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);

        tokio::time::sleep(Duration::from_millis(5)).await;
        repo.upsert("Alice").await.unwrap();
        let list = repo.list().await.unwrap();
        assert_eq!(list[0].username, "Alice");
        assert_eq!(list[0].count, 2);
        assert!(list[0].last_seen >= list[1].last_seen);
    }

    #[tokio::test]
    async fn test_list_is_capped() {
        let repo = repo().await;
        for i in 0..60 {
            repo.upsert(&format!("player{i}")).await.unwrap();
        }
        let list = repo.list().await.unwrap();
        assert_eq!(list.len(), usize::try_from(REJECTED_LIST_LIMIT).unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.upsert("Bob").await.unwrap();
        repo.upsert("Alice").await.unwrap();

        repo.delete("Bob").await.unwrap();
        // Unknown names are fine.
        repo.delete("Nobody").await.unwrap();

        let list = repo.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].username, "Alice");
    }

    #[test]
    fn test_parse_legacy_timestamp() {
        let at = parse_timestamp("2024-05-01 10:00:00").unwrap();
        assert_eq!(format_timestamp(at), "2024-05-01T10:00:00.000000Z");
    }
}
