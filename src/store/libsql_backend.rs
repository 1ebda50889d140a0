//! libSQL backend — async `LeadStore` implementation.
//!
//! Supports a local file database and `:memory:` for tests. The `leads`
//! table carries a UNIQUE constraint on `user_id`; that constraint, not the
//! caller's `exists` check, is the source of truth for one-lead-per-user.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::intake::model::{LeadProfile, LeadRecord};
use crate::store::traits::LeadStore;

const LEAD_COLUMNS: &str =
    "id, user_id, username, city, full_name, workplace, citizenship, age, created_at";

/// libSQL lead store.
///
/// A single connection is reused for all operations; `libsql::Connection`
/// is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Lead database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS leads (
                    id TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL UNIQUE,
                    username TEXT,
                    city TEXT,
                    full_name TEXT,
                    workplace TEXT,
                    citizenship TEXT,
                    age INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );",
            )
            .await
            .map_err(|e| StoreError::Open(format!("Schema init failed: {e}")))?;
        Ok(())
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp; rows are always written in that format.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(v) => libsql::Value::Text(v.to_string()),
        None => libsql::Value::Null,
    }
}

/// Map a row to a LeadRecord.
///
/// Column order matches LEAD_COLUMNS. A row with a non-null `city` is a
/// quick-form lead; otherwise the extended columns must all be present.
fn row_to_lead(row: &libsql::Row) -> Result<LeadRecord, StoreError> {
    let id_str: String = row.get(0).map_err(bad_row)?;
    let user_id: i64 = row.get(1).map_err(bad_row)?;
    // Nullable columns read as Ok-or-None.
    let username: Option<String> = row.get(2).ok();
    let city: Option<String> = row.get(3).ok();
    let full_name: Option<String> = row.get(4).ok();
    let workplace: Option<String> = row.get(5).ok();
    let citizenship: Option<String> = row.get(6).ok();
    let age: i64 = row.get(7).map_err(bad_row)?;
    let created_str: String = row.get(8).map_err(bad_row)?;

    let age = u8::try_from(age)
        .map_err(|_| StoreError::Query(format!("lead {id_str}: age {age} out of range")))?;

    let profile = match city {
        Some(city) => LeadProfile::Basic { city, age },
        None => {
            let missing = || StoreError::Query(format!("lead {id_str}: incomplete profile row"));
            LeadProfile::Extended {
                name: full_name.ok_or_else(missing)?,
                age,
                workplace: workplace.ok_or_else(missing)?,
                citizenship: citizenship.ok_or_else(missing)?,
            }
        }
    };

    Ok(LeadRecord {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        user_id,
        username,
        profile,
        created_at: parse_datetime(&created_str),
    })
}

fn bad_row(e: libsql::Error) -> StoreError {
    StoreError::Query(format!("row parse: {e}"))
}

/// Detect a UNIQUE-constraint rejection on insert.
fn is_unique_violation(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE") || msg.contains("unique")
}

#[async_trait]
impl LeadStore for LibSqlBackend {
    async fn exists(&self, user_id: i64) -> Result<bool, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM leads WHERE user_id = ?1", params![user_id])
            .await
            .map_err(|e| StoreError::Query(format!("exists: {e}")))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(StoreError::Query(format!("exists: {e}"))),
        }
    }

    async fn find(&self, user_id: i64) -> Result<Option<LeadRecord>, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_lead(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("find: {e}"))),
        }
    }

    async fn create(&self, record: &LeadRecord) -> Result<(), StoreError> {
        let (city, full_name, workplace, citizenship, age) = match &record.profile {
            LeadProfile::Basic { city, age } => (Some(city.as_str()), None, None, None, *age),
            LeadProfile::Extended {
                name,
                age,
                workplace,
                citizenship,
            } => (
                None,
                Some(name.as_str()),
                Some(workplace.as_str()),
                Some(citizenship.as_str()),
                *age,
            ),
        };

        self.conn
            .execute(
                "INSERT INTO leads (id, user_id, username, city, full_name, workplace, citizenship, age, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.user_id,
                    opt_text(record.username.as_deref()),
                    opt_text(city),
                    opt_text(full_name),
                    opt_text(workplace),
                    opt_text(citizenship),
                    age as i64,
                    record.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate {
                        user_id: record.user_id,
                    }
                } else {
                    StoreError::Query(format!("create: {e}"))
                }
            })?;

        debug!(user_id = record.user_id, "Lead inserted into DB");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user_id: i64) -> LeadRecord {
        LeadRecord::new(
            user_id,
            Some("jon_doe".into()),
            LeadProfile::Basic {
                city: "Oslo".into(),
                age: 30,
            },
        )
    }

    fn extended(user_id: i64) -> LeadRecord {
        LeadRecord::new(
            user_id,
            None,
            LeadProfile::Extended {
                name: "Jon".into(),
                age: 17,
                workplace: "Dock".into(),
                citizenship: "Norway".into(),
            },
        )
    }

    #[tokio::test]
    async fn create_then_find_roundtrip() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let record = basic(100);
        store.create(&record).await.unwrap();

        let found = store.find(100).await.unwrap().expect("lead should exist");
        assert_eq!(found.id, record.id);
        assert_eq!(found.username.as_deref(), Some("jon_doe"));
        assert_eq!(found.profile, record.profile);
        assert_eq!(found.created_at.to_rfc3339(), record.created_at.to_rfc3339());
    }

    #[tokio::test]
    async fn extended_profile_roundtrip() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let record = extended(200);
        store.create(&record).await.unwrap();

        let found = store.find(200).await.unwrap().unwrap();
        assert_eq!(found.profile, record.profile);
        assert_eq!(found.username, None);
    }

    #[tokio::test]
    async fn exists_fast_path() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        assert!(!store.exists(1).await.unwrap());
        store.create(&basic(1)).await.unwrap();
        assert!(store.exists(1).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_user_id_rejected_by_unique_index() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        store.create(&basic(5)).await.unwrap();

        // Same user id, different record — the unique index is the guard.
        let second = extended(5);
        match store.create(&second).await {
            Err(StoreError::Duplicate { user_id }) => assert_eq!(user_id, 5),
            other => panic!("expected Duplicate, got {other:?}"),
        }

        // The first record is untouched.
        let found = store.find(5).await.unwrap().unwrap();
        assert_eq!(
            found.profile,
            LeadProfile::Basic {
                city: "Oslo".into(),
                age: 30
            }
        );
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        assert!(store.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.db");

        {
            let store = LibSqlBackend::new_local(&path).await.unwrap();
            store.create(&basic(77)).await.unwrap();
        }

        let store = LibSqlBackend::new_local(&path).await.unwrap();
        assert!(store.exists(77).await.unwrap());
    }
}
