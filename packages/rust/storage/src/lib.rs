//! libSQL storage layer for labeling sessions.
//!
//! The [`Storage`] struct wraps the per-session database holding session
//! metadata and per-slide labeling state. One database lives under each
//! session directory (`indexes/remixstudio.db`); whoever opens the session
//! is the sole writer.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use remixstudio_shared::{RemixStudioError, RemixSuggestion, Result, SlideRecord, SlideStatus};

/// Primary storage handle wrapping a libSQL database.
#[derive(Debug)]
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RemixStudioError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    RemixStudioError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Session operations
    // -----------------------------------------------------------------------

    /// Insert a new session record.
    pub async fn insert_session(
        &self,
        id: &str,
        name: &str,
        source_file: &str,
        start_id: u64,
        config_json: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO sessions (id, name, source_file, start_id, created_at, updated_at, config_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    name,
                    source_file,
                    start_id as i64,
                    now.as_str(),
                    now.as_str(),
                    config_json
                ],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a session by ID. Returns `(name, source_file, start_id)`.
    pub async fn get_session(&self, id: &str) -> Result<Option<(String, String, u64)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, source_file, start_id FROM sessions WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some((
                row.get::<String>(0)
                    .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
                row.get::<String>(1)
                    .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
                row.get::<i64>(2)
                    .map_err(|e| RemixStudioError::Storage(e.to_string()))? as u64,
            ))),
            Ok(None) => Ok(None),
            Err(e) => Err(RemixStudioError::Storage(e.to_string())),
        }
    }

    /// Bump a session's `updated_at` timestamp.
    pub async fn touch_session(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                params![now.as_str(), id],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Slide operations
    // -----------------------------------------------------------------------

    /// Upsert a slide (insert or update on conflict by `session_id + id`).
    pub async fn upsert_slide(&self, slide: &SlideRecord) -> Result<()> {
        let suggestions_json = serde_json::to_string(&slide.suggestions)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO slides (session_id, id, slide_index, image_file, image_sha256,
                                     source_text, caption, suggestions_json, status, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(session_id, id) DO UPDATE SET
                   slide_index = excluded.slide_index,
                   image_file = excluded.image_file,
                   image_sha256 = excluded.image_sha256,
                   source_text = excluded.source_text,
                   caption = excluded.caption,
                   suggestions_json = excluded.suggestions_json,
                   status = excluded.status,
                   updated_at = excluded.updated_at",
                params![
                    slide.session_id.as_str(),
                    slide.id as i64,
                    slide.slide_index as i64,
                    slide.image_file.as_str(),
                    slide.image_sha256.as_str(),
                    slide.source_text.as_str(),
                    slide.caption.as_str(),
                    suggestions_json.as_str(),
                    slide.status.as_str(),
                    slide.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a slide by session ID and dataset id.
    pub async fn get_slide(&self, session_id: &str, id: u64) -> Result<Option<SlideRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, session_id, slide_index, image_file, image_sha256,
                        source_text, caption, suggestions_json, status, updated_at
                 FROM slides WHERE session_id = ?1 AND id = ?2",
                params![session_id, id as i64],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_slide(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(RemixStudioError::Storage(e.to_string())),
        }
    }

    /// List all slides of a session, ordered by dataset id.
    pub async fn list_slides(&self, session_id: &str) -> Result<Vec<SlideRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, session_id, slide_index, image_file, image_sha256,
                        source_text, caption, suggestions_json, status, updated_at
                 FROM slides WHERE session_id = ?1 ORDER BY id",
                params![session_id],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_slide(&row)?);
        }
        Ok(results)
    }

    /// List labeled slides of a session, ordered by dataset id.
    pub async fn labeled_slides(&self, session_id: &str) -> Result<Vec<SlideRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, session_id, slide_index, image_file, image_sha256,
                        source_text, caption, suggestions_json, status, updated_at
                 FROM slides WHERE session_id = ?1 AND status = 'labeled' ORDER BY id",
                params![session_id],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_slide(&row)?);
        }
        Ok(results)
    }

    /// Overwrite a slide's labels and status.
    pub async fn update_labels(
        &self,
        session_id: &str,
        id: u64,
        caption: &str,
        suggestions: &[RemixSuggestion],
        status: SlideStatus,
    ) -> Result<()> {
        let suggestions_json = serde_json::to_string(suggestions)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE slides SET caption = ?1, suggestions_json = ?2, status = ?3, updated_at = ?4
                 WHERE session_id = ?5 AND id = ?6",
                params![
                    caption,
                    suggestions_json.as_str(),
                    status.as_str(),
                    now.as_str(),
                    session_id,
                    id as i64
                ],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Count slides by status. Returns `(pending, labeled)`.
    pub async fn count_by_status(&self, session_id: &str) -> Result<(usize, usize)> {
        let mut rows = self
            .conn
            .query(
                "SELECT status, COUNT(*) FROM slides WHERE session_id = ?1 GROUP BY status",
                params![session_id],
            )
            .await
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

        let mut pending = 0usize;
        let mut labeled = 0usize;
        while let Ok(Some(row)) = rows.next().await {
            let status: String = row
                .get(0)
                .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
            let count: i64 = row
                .get(1)
                .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
            match status.as_str() {
                "labeled" => labeled = count as usize,
                _ => pending += count as usize,
            }
        }
        Ok((pending, labeled))
    }
}

/// Convert a database row to a [`SlideRecord`].
fn row_to_slide(row: &libsql::Row) -> Result<SlideRecord> {
    let suggestions_json: String = row
        .get(7)
        .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
    let status_text: String = row
        .get(8)
        .map_err(|e| RemixStudioError::Storage(e.to_string()))?;

    Ok(SlideRecord {
        id: row
            .get::<i64>(0)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))? as u64,
        session_id: row
            .get::<String>(1)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
        slide_index: row
            .get::<i64>(2)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))? as usize,
        image_file: row
            .get::<String>(3)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
        image_sha256: row
            .get::<String>(4)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
        source_text: row
            .get::<String>(5)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
        caption: row
            .get::<String>(6)
            .map_err(|e| RemixStudioError::Storage(e.to_string()))?,
        suggestions: serde_json::from_str(&suggestions_json)
            .map_err(|e| RemixStudioError::Storage(format!("invalid suggestions json: {e}")))?,
        status: status_text.parse()?,
        updated_at: {
            let s: String = row
                .get(9)
                .map_err(|e| RemixStudioError::Storage(e.to_string()))?;
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| RemixStudioError::Storage(format!("invalid date: {e}")))?
        },
    })
}
