//! Session directory discovery and access.
//!
//! A session lives in one directory under the sessions root, named by its
//! id. `manifest.json` is the source of truth for listing; the per-session
//! database holds slide rows.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use remixstudio_shared::{
    RemixStudioError, Result, SessionId, SessionManifest, CURRENT_SCHEMA_VERSION,
};
use remixstudio_storage::Storage;

/// Database file name inside a session's `indexes/` directory.
pub const DB_FILE_NAME: &str = "remixstudio.db";

/// One row in the session listing.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Human-readable name.
    pub name: String,
    /// Absolute path to the session directory.
    pub path: PathBuf,
    /// Number of slides imported.
    pub slide_count: usize,
    /// Number of slides marked labeled.
    pub labeled: usize,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Manifest I/O
// ---------------------------------------------------------------------------

/// Load and parse `manifest.json` from a session directory.
pub fn load_manifest(session_path: &Path) -> Result<SessionManifest> {
    let manifest_path = session_path.join("manifest.json");
    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|e| RemixStudioError::io(&manifest_path, e))?;
    let manifest: SessionManifest = serde_json::from_str(&content)
        .map_err(|e| RemixStudioError::validation(format!("invalid manifest.json: {e}")))?;
    Ok(manifest)
}

/// Write `manifest.json` atomically (write to temp, then rename).
pub fn save_manifest(session_path: &Path, manifest: &SessionManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| RemixStudioError::validation(format!("JSON serialization failed: {e}")))?;

    let target = session_path.join("manifest.json");
    let temp = session_path.join(".manifest.json.tmp");

    std::fs::write(&temp, json).map_err(|e| RemixStudioError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| RemixStudioError::io(&target, e))?;

    debug!(path = %target.display(), "wrote manifest");
    Ok(())
}

/// Path to a session's database file.
pub fn db_path(session_path: &Path) -> PathBuf {
    session_path.join("indexes").join(DB_FILE_NAME)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Resolve a session selector to a session directory.
///
/// The selector is either a session id (looked up under `root`) or a path
/// to a session directory. Anything without a `manifest.json` is rejected.
pub fn resolve_session(root: &Path, selector: &str) -> Result<PathBuf> {
    let as_path = PathBuf::from(selector);
    if as_path.join("manifest.json").is_file() {
        return Ok(as_path);
    }

    let under_root = root.join(selector);
    if under_root.join("manifest.json").is_file() {
        return Ok(under_root);
    }

    Err(RemixStudioError::validation(format!(
        "no session found for '{selector}' (not a session id under {} or a session directory)",
        root.display()
    )))
}

/// List all sessions under the sessions root, newest first.
///
/// Directories without a readable manifest are skipped with a warning.
/// Label counts come from each session's database; a session whose
/// database cannot be opened still lists, with zero counted as labeled.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn list_sessions(root: &Path) -> Result<Vec<SessionSummary>> {
    let mut summaries = Vec::new();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        // A missing root just means no sessions yet
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
        Err(e) => return Err(RemixStudioError::io(root, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| RemixStudioError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() || !path.join("manifest.json").is_file() {
            continue;
        }

        let manifest = match load_manifest(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable session");
                continue;
            }
        };

        let labeled = match Storage::open(&db_path(&path)).await {
            Ok(storage) => match storage.count_by_status(&manifest.id.to_string()).await {
                Ok((_pending, labeled)) => labeled,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot count slides");
                    0
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open session database");
                0
            }
        };

        summaries.push(SessionSummary {
            id: manifest.id,
            name: manifest.name,
            path,
            slide_count: manifest.slide_count,
            labeled,
            created_at: manifest.created_at,
        });
    }

    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(summaries)
}

/// Open a session for editing: manifest plus database handle.
///
/// Fails when the schema version is unknown or the database does not
/// contain the session row the manifest names.
pub async fn open_session(session_path: &Path) -> Result<(SessionManifest, Storage)> {
    let manifest = load_manifest(session_path)?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(RemixStudioError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }

    let storage = Storage::open(&db_path(session_path)).await?;
    let row = storage.get_session(&manifest.id.to_string()).await?;
    if row.is_none() {
        return Err(RemixStudioError::validation(format!(
            "session database does not contain session {}",
            manifest.id
        )));
    }

    Ok((manifest, storage))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
