//! SQLite-backed post registry, the single source of truth for published
//! post metadata. One connection, one writer: the engine runs as a batch
//! process, so there is no contention to manage.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::post::{Category, PostMeta};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate post id: {0}")]
    DuplicateId(String),
    #[error("post not found in the registry: {0}")]
    NotFound(String),
    #[error("registry unavailable at {}: {}", .path.display(), .reason)]
    Unavailable { path: PathBuf, reason: String },
    #[error("registry storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Whether `upsert` created a new record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// A stored post row. Same shape as [`PostMeta`] plus the bookkeeping
/// timestamps the registry maintains itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub category: Category,
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub path: String,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str =
    "id, type, title, date, description, path, content_hash, created_at, updated_at";

pub struct Registry {
    db: Connection,
}

impl Registry {
    /// Open or create the registry database, ensuring the schema is in
    /// place. Failure here is fatal for the caller; nothing downstream
    /// can run without the registry.
    pub fn open(db_path: &Path) -> Result<Registry, RegistryError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| RegistryError::Unavailable {
                path: db_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let db = Connection::open(db_path).map_err(|e| RegistryError::Unavailable {
            path: db_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::ensure_schema(&db)?;

        Ok(Registry { db })
    }

    fn ensure_schema(db: &Connection) -> Result<(), rusqlite::Error> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
              id           TEXT PRIMARY KEY,  -- {YYYYMMDD}_{slug}, doubles as directory name
              type         TEXT NOT NULL CHECK (type IN ('blog', 'works')),
              title        TEXT NOT NULL,
              date         TEXT NOT NULL,     -- YYYY-MM-DD
              description  TEXT,
              path         TEXT NOT NULL,     -- relative to the category directory
              content_hash TEXT,              -- SHA-256 of the artifact bytes
              created_at   TEXT NOT NULL,     -- RFC3339 UTC
              updated_at   TEXT NOT NULL      -- RFC3339 UTC
            );

            CREATE INDEX IF NOT EXISTS idx_posts_type_date ON posts(type, date DESC);
            CREATE INDEX IF NOT EXISTS idx_posts_date ON posts(date DESC);
            "#,
        )?;

        // Databases created by earlier versions predate these two columns.
        let mut stmt = db.prepare("PRAGMA table_info(posts)")?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        for (name, ddl) in [
            ("description", "ALTER TABLE posts ADD COLUMN description TEXT"),
            ("content_hash", "ALTER TABLE posts ADD COLUMN content_hash TEXT"),
        ] {
            if !columns.iter().any(|c| c == name) {
                db.execute(ddl, [])?;
            }
        }

        Ok(())
    }

    fn exists(&self, id: &str) -> Result<bool, rusqlite::Error> {
        let mut stmt = self.db.prepare("SELECT 1 FROM posts WHERE id = ?1")?;
        stmt.exists([id])
    }

    /// Insert a brand new record. Both timestamps are set to now.
    pub fn add(&self, meta: &PostMeta) -> Result<(), RegistryError> {
        if self.exists(&meta.id)? {
            return Err(RegistryError::DuplicateId(meta.id.clone()));
        }

        let now = Utc::now().to_rfc3339();
        self.db.execute(
            r#"
            INSERT INTO posts (id, type, title, date, description, path, content_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            (
                &meta.id,
                meta.category.as_str(),
                &meta.title,
                meta.date.format("%Y-%m-%d").to_string(),
                meta.description.as_deref(),
                &meta.path,
                meta.fingerprint.as_deref(),
                &now,
            ),
        )?;

        Ok(())
    }

    /// Refresh an existing record in place. `created_at` is preserved and
    /// `description` only changes when the incoming metadata carries one,
    /// so a rescan cannot wipe a curated snippet.
    pub fn update(&self, id: &str, meta: &PostMeta) -> Result<(), RegistryError> {
        let now = Utc::now().to_rfc3339();
        let affected = self.db.execute(
            r#"
            UPDATE posts SET
              type         = ?2,
              title        = ?3,
              date         = ?4,
              path         = ?5,
              content_hash = ?6,
              description  = COALESCE(?7, description),
              updated_at   = ?8
            WHERE id = ?1
            "#,
            (
                id,
                meta.category.as_str(),
                &meta.title,
                meta.date.format("%Y-%m-%d").to_string(),
                &meta.path,
                meta.fingerprint.as_deref(),
                meta.description.as_deref(),
                &now,
            ),
        )?;

        if affected == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Insert-or-update, reporting which of the two happened.
    pub fn upsert(&self, meta: &PostMeta) -> Result<Upsert, RegistryError> {
        if self.exists(&meta.id)? {
            self.update(&meta.id, meta)?;
            Ok(Upsert::Updated)
        } else {
            self.add(meta)?;
            Ok(Upsert::Inserted)
        }
    }

    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let affected = self.db.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<PostRecord>, RegistryError> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {} FROM posts WHERE id = ?1", SELECT_COLUMNS))?;
        let mut rows = stmt.query_map([id], row_to_record)?;
        match rows.next() {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    /// Every record, newest first.
    pub fn get_all(&self) -> Result<Vec<PostRecord>, RegistryError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM posts ORDER BY date DESC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// The `count` most recent records across all categories.
    pub fn get_latest(&self, count: u32) -> Result<Vec<PostRecord>, RegistryError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM posts ORDER BY date DESC, created_at DESC LIMIT ?1",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([count as i64], row_to_record)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Records of one category, newest first.
    pub fn get_by_category(&self, category: Category) -> Result<Vec<PostRecord>, RegistryError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM posts WHERE type = ?1 ORDER BY date DESC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([category.as_str()], row_to_record)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

fn row_to_record(row: &rusqlite::Row) -> Result<PostRecord, rusqlite::Error> {
    let category: String = row.get(1)?;
    let category = category
        .parse::<Category>()
        .map_err(|e| conversion_error(1, e))?;

    let date: String = row.get(3)?;
    let date =
        NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| conversion_error(3, e))?;

    Ok(PostRecord {
        id: row.get(0)?,
        category,
        title: row.get(2)?,
        date,
        description: row.get(4)?,
        path: row.get(5)?,
        fingerprint: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
        updated_at: parse_timestamp(row, 8)?,
    })
}

fn parse_timestamp(row: &rusqlite::Row, index: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn conversion_error(
    index: usize,
    source: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(source))
}
