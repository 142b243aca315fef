//! Dataset export.
//!
//! Packages labeled slides into a zip bundle: `images/<id>.png` plus a
//! pretty-printed `dataset.json` array ordered by dataset id. The bundle
//! is written atomically and stamped into the session manifest.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

use remixstudio_shared::{DatasetRecord, RemixStudioError, Result};

use crate::session;

/// Configuration for `export_dataset`.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Session directory to export from.
    pub session_path: PathBuf,
    /// Output zip path; defaults to `<session>/exports/dataset.zip`.
    pub out: Option<PathBuf>,
    /// Include slides still marked pending.
    pub include_pending: bool,
}

/// Result of a successful export.
#[derive(Debug)]
pub struct ExportResult {
    /// Where the zip was written.
    pub zip_path: PathBuf,
    /// Checksum of the zip bytes.
    pub sha256: String,
    /// Size of the zip in bytes.
    pub size_bytes: usize,
    /// Records in `dataset.json`.
    pub record_count: usize,
    /// Image files packed into the zip.
    pub image_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Metadata about the last export, recorded in the manifest.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportStamp {
    pub file: String,
    pub sha256: String,
    pub size_bytes: usize,
    pub record_count: usize,
    pub image_count: usize,
    pub exported_at: String,
}

/// Export a session's labeled slides as a dataset zip.
///
/// Records go into `dataset.json` in id order. A slide whose image file
/// has gone missing keeps its record; only the image is dropped from the
/// bundle.
#[instrument(skip_all, fields(session = %config.session_path.display()))]
pub async fn export_dataset(config: &ExportConfig) -> Result<ExportResult> {
    let start = Instant::now();

    let (mut manifest, storage) = session::open_session(&config.session_path).await?;
    let session_key = manifest.id.to_string();

    let slides = if config.include_pending {
        storage.list_slides(&session_key).await?
    } else {
        storage.labeled_slides(&session_key).await?
    };

    if slides.is_empty() {
        return Err(if config.include_pending {
            RemixStudioError::validation("session has no slides to export")
        } else {
            RemixStudioError::validation(
                "mark at least one slide as labeled before exporting",
            )
        });
    }

    // Build the zip in memory; sessions are small enough for that.
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    let images_dir = config.session_path.join("images");
    let mut image_count = 0usize;

    for slide in &slides {
        let image_path = images_dir.join(&slide.image_file);
        match std::fs::read(&image_path) {
            Ok(bytes) => {
                writer
                    .start_file(format!("images/{}", slide.image_file), options)
                    .map_err(|e| RemixStudioError::Export(e.to_string()))?;
                writer
                    .write_all(&bytes)
                    .map_err(|e| RemixStudioError::Export(e.to_string()))?;
                image_count += 1;
            }
            Err(e) => {
                warn!(id = slide.id, file = %slide.image_file, error = %e,
                    "image file missing, keeping record without it");
            }
        }
    }

    let records: Vec<DatasetRecord> = slides.iter().map(DatasetRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| RemixStudioError::validation(format!("JSON serialization failed: {e}")))?;
    writer
        .start_file("dataset.json", options)
        .map_err(|e| RemixStudioError::Export(e.to_string()))?;
    writer
        .write_all(json.as_bytes())
        .map_err(|e| RemixStudioError::Export(e.to_string()))?;

    let bytes = writer
        .finish()
        .map_err(|e| RemixStudioError::Export(e.to_string()))?
        .into_inner();

    // Atomic write: temp file in the target directory, then rename.
    let zip_path = match &config.out {
        Some(path) => path.clone(),
        None => config.session_path.join("exports").join("dataset.zip"),
    };
    if let Some(parent) = zip_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RemixStudioError::io(parent, e))?;
    }
    let file_name = zip_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset.zip".into());
    let temp = zip_path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &bytes).map_err(|e| RemixStudioError::io(&temp, e))?;
    std::fs::rename(&temp, &zip_path).map_err(|e| RemixStudioError::io(&zip_path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());

    let stamp = ExportStamp {
        file: zip_path.display().to_string(),
        sha256: sha256.clone(),
        size_bytes: bytes.len(),
        record_count: records.len(),
        image_count,
        exported_at: Utc::now().to_rfc3339(),
    };
    manifest.export = Some(serde_json::to_value(&stamp).unwrap_or_default());
    manifest.updated_at = Utc::now();
    session::save_manifest(&config.session_path, &manifest)?;

    let result = ExportResult {
        zip_path,
        sha256,
        size_bytes: bytes.len(),
        record_count: records.len(),
        image_count,
        elapsed: start.elapsed(),
    };

    info!(
        path = %result.zip_path.display(),
        records = result.record_count,
        images = result.image_count,
        size = result.size_bytes,
        elapsed_ms = result.elapsed.as_millis(),
        "export complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::Path;

    use zip::ZipArchive;

    use remixstudio_shared::{
        RemixSuggestion, SessionId, SessionManifest, SlideRecord, SlideStatus,
        CURRENT_SCHEMA_VERSION,
    };
    use remixstudio_storage::Storage;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "remixstudio-export-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn seed_session(root: &Path) -> (SessionId, PathBuf, Storage) {
        let id = SessionId::new();
        let path = root.join(id.to_string());
        std::fs::create_dir_all(path.join("images")).unwrap();

        let now = Utc::now();
        let manifest = SessionManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: id.clone(),
            name: "Export Test".into(),
            source_file: "deck.pptx".into(),
            start_id: 453,
            tool_version: "0.1.0-test".into(),
            created_at: now,
            updated_at: now,
            slide_count: 0,
            config: None,
            export: None,
        };
        session::save_manifest(&path, &manifest).unwrap();

        let storage = Storage::open(&session::db_path(&path)).await.unwrap();
        storage
            .insert_session(&id.to_string(), "Export Test", "deck.pptx", 453, None)
            .await
            .unwrap();

        (id, path, storage)
    }

    async fn add_slide(
        session_path: &Path,
        storage: &Storage,
        session_id: &SessionId,
        id: u64,
        status: SlideStatus,
    ) {
        let image_file = format!("{id}.png");
        std::fs::write(
            session_path.join("images").join(&image_file),
            format!("fake-png-{id}").as_bytes(),
        )
        .unwrap();

        let record = SlideRecord {
            id,
            session_id: session_id.to_string(),
            slide_index: id as usize,
            image_file,
            image_sha256: format!("{id:064x}"),
            source_text: format!("slide {id}"),
            caption: format!("Create an image of slide {id}"),
            suggestions: vec![
                RemixSuggestion::new("Zoom out", "Show the wider scene."),
                RemixSuggestion::new("Make it night", "Switch to a night scene."),
                RemixSuggestion::new("Add rain", "Add gentle rain."),
            ],
            status,
            updated_at: Utc::now(),
        };
        storage.upsert_slide(&record).await.unwrap();
    }

    fn read_zip(path: &Path) -> (Vec<String>, Vec<serde_json::Value>) {
        let bytes = std::fs::read(path).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();

        let mut json = String::new();
        archive
            .by_name("dataset.json")
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();

        (names, records)
    }

    #[tokio::test]
    async fn export_writes_zip_with_images_and_dataset() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        // Insert out of id order; export must come back sorted
        add_slide(&path, &storage, &id, 454, SlideStatus::Labeled).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;

        let config = ExportConfig {
            session_path: path.clone(),
            out: None,
            include_pending: false,
        };
        let result = export_dataset(&config).await.unwrap();

        assert_eq!(result.zip_path, path.join("exports").join("dataset.zip"));
        assert_eq!(result.record_count, 2);
        assert_eq!(result.image_count, 2);
        assert_eq!(result.sha256.len(), 64);
        assert!(result.size_bytes > 0);
        assert!(result.elapsed > Duration::ZERO);

        let (names, records) = read_zip(&result.zip_path);
        assert!(names.contains(&"images/453.png".to_string()));
        assert!(names.contains(&"images/454.png".to_string()));
        assert!(names.contains(&"dataset.json".to_string()));

        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["453", "454"]);
        assert_eq!(
            records[0]["prompt"].as_str().unwrap(),
            "Create an image of slide 453"
        );
        let suggestions = records[0]["remixSuggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0]["label"], "Zoom out");
        assert_eq!(suggestions[0]["prompt"], "Show the wider scene.");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_skips_pending_by_default() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;
        add_slide(&path, &storage, &id, 454, SlideStatus::Pending).await;

        let config = ExportConfig {
            session_path: path,
            out: None,
            include_pending: false,
        };
        let result = export_dataset(&config).await.unwrap();

        assert_eq!(result.record_count, 1);
        let (names, records) = read_zip(&result.zip_path);
        assert!(!names.contains(&"images/454.png".to_string()));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "453");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_includes_pending_when_asked() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;
        add_slide(&path, &storage, &id, 454, SlideStatus::Pending).await;

        let out = root.join("custom").join("bundle.zip");
        let config = ExportConfig {
            session_path: path,
            out: Some(out.clone()),
            include_pending: true,
        };
        let result = export_dataset(&config).await.unwrap();

        assert_eq!(result.zip_path, out);
        assert_eq!(result.record_count, 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_errors_without_labels() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Pending).await;

        let config = ExportConfig {
            session_path: path,
            out: None,
            include_pending: false,
        };
        let err = export_dataset(&config).await.unwrap_err();
        assert!(err.to_string().contains("labeled"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_keeps_record_when_image_missing() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;
        add_slide(&path, &storage, &id, 454, SlideStatus::Labeled).await;
        std::fs::remove_file(path.join("images/454.png")).unwrap();

        let config = ExportConfig {
            session_path: path,
            out: None,
            include_pending: false,
        };
        let result = export_dataset(&config).await.unwrap();

        assert_eq!(result.record_count, 2);
        assert_eq!(result.image_count, 1);

        let (names, records) = read_zip(&result.zip_path);
        assert!(!names.contains(&"images/454.png".to_string()));
        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["453", "454"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_stamps_manifest() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;

        let config = ExportConfig {
            session_path: path.clone(),
            out: None,
            include_pending: false,
        };
        let result = export_dataset(&config).await.unwrap();

        let manifest = session::load_manifest(&path).unwrap();
        let stamp = manifest.export.expect("export stamp missing");
        assert_eq!(stamp["sha256"], serde_json::json!(result.sha256));
        assert_eq!(stamp["record_count"], 1);
        assert_eq!(stamp["image_count"], 1);
        assert!(stamp["file"]
            .as_str()
            .unwrap()
            .ends_with("dataset.zip"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn export_leaves_no_temp_files() {
        let root = temp_root();
        let (id, path, storage) = seed_session(&root).await;
        add_slide(&path, &storage, &id, 453, SlideStatus::Labeled).await;

        let config = ExportConfig {
            session_path: path.clone(),
            out: None,
            include_pending: false,
        };
        export_dataset(&config).await.unwrap();

        for entry in std::fs::read_dir(path.join("exports")).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&root);
    }
}
