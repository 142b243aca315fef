//! End-to-end `import_deck` pipeline.
//!
//! Reads a .pptx file, extracts captionable slides, assigns sequential
//! dataset ids, seeds suggestion slots, and materializes the session
//! directory (images, database, manifest).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use remixstudio_deck::ExtractOptions;
use remixstudio_shared::{
    RemixStudioError, Result, SessionId, SessionManifest, SlideRecord, SlideStatus,
    CURRENT_SCHEMA_VERSION,
};
use remixstudio_storage::Storage;

use crate::session;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Callback interface for pipeline progress updates.
///
/// Implemented by the CLI (progress bars) and the TUI (status line).
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline phase has started.
    fn phase(&self, name: &str);

    /// A slide was written to the session.
    fn slide_written(&self, id: u64, current: usize, total: usize);

    /// The pipeline finished.
    fn done(&self);
}

/// A no-op progress reporter for tests and non-interactive callers.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn slide_written(&self, _id: u64, _current: usize, _total: usize) {}
    fn done(&self) {}
}

// ---------------------------------------------------------------------------
// Config & result
// ---------------------------------------------------------------------------

/// Configuration for the `import_deck` pipeline.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Path to the .pptx file to import.
    pub deck_path: PathBuf,
    /// Human-readable session name.
    pub name: String,
    /// Root directory under which session directories are created.
    pub sessions_root: PathBuf,
    /// Dataset id assigned to the first extracted slide.
    pub start_id: u64,
    /// Maximum number of slides to process.
    pub max_slides: usize,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Result of the `import_deck` pipeline.
#[derive(Debug)]
pub struct ImportResult {
    /// Session identifier.
    pub session_id: SessionId,
    /// Absolute path to the session directory.
    pub session_path: PathBuf,
    /// Number of slides imported.
    pub slide_count: usize,
    /// Slides scanned but skipped (no usable picture).
    pub slides_skipped: usize,
    /// Whether the slide cap cut the deck short.
    pub truncated: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full import pipeline for a slide deck.
///
/// 1. Read the deck and extract text + first embedded picture per slide
/// 2. Create the session directory layout under `sessions_root`
/// 3. Write one image file per slide, seed suggestion slots, persist rows
/// 4. Write `manifest.json`
///
/// Slides without an embedded picture are skipped and consume no dataset
/// id. A deck that yields zero usable slides is a validation error.
#[instrument(skip_all, fields(deck = %config.deck_path.display(), name = %config.name))]
pub async fn import_deck(
    config: &ImportConfig,
    progress: &dyn ProgressReporter,
) -> Result<ImportResult> {
    let start = Instant::now();

    progress.phase("Reading deck");
    let bytes = std::fs::read(&config.deck_path)
        .map_err(|e| RemixStudioError::io(&config.deck_path, e))?;

    progress.phase("Extracting slides");
    let options = ExtractOptions {
        max_slides: config.max_slides,
        ..ExtractOptions::default()
    };
    let extraction = remixstudio_deck::extract_slides(&bytes, &options)?;

    if extraction.slides.is_empty() {
        return Err(RemixStudioError::validation(
            "no slides with embedded images found in deck",
        ));
    }

    progress.phase("Creating session");
    let session_id = SessionId::new();
    let session_path = config.sessions_root.join(session_id.to_string());
    create_dirs(&session_path)?;

    let storage = Storage::open(&session::db_path(&session_path)).await?;

    let source_file = config
        .deck_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.deck_path.display().to_string());

    let import_options = serde_json::json!({
        "start_id": config.start_id,
        "max_slides": config.max_slides,
    });
    storage
        .insert_session(
            &session_id.to_string(),
            &config.name,
            &source_file,
            config.start_id,
            Some(&import_options.to_string()),
        )
        .await?;

    progress.phase("Writing slides");
    let images_dir = session_path.join("images");
    let total = extraction.slides.len();
    let mut rng = rand::thread_rng();

    for (i, slide) in extraction.slides.iter().enumerate() {
        let id = config.start_id + i as u64;
        let image_file = format!("{id}.png");

        if let Some(format) = slide.image.format.as_deref() {
            if format != "png" {
                debug!(slide = slide.index, %format, "storing non-png blob as-is");
            }
        }

        let image_path = images_dir.join(&image_file);
        std::fs::write(&image_path, &slide.image.bytes)
            .map_err(|e| RemixStudioError::io(&image_path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&slide.image.bytes);
        let image_sha256 = format!("{:x}", hasher.finalize());

        let record = SlideRecord {
            id,
            session_id: session_id.to_string(),
            slide_index: slide.index,
            image_file,
            image_sha256,
            source_text: slide.caption.clone(),
            caption: prefixed_caption(&slide.caption),
            suggestions: remixstudio_suggest::random_slots(&mut rng),
            status: SlideStatus::Pending,
            updated_at: Utc::now(),
        };
        storage.upsert_slide(&record).await?;
        progress.slide_written(id, i + 1, total);
    }

    progress.phase("Writing manifest");
    let now = Utc::now();
    let manifest = SessionManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        id: session_id.clone(),
        name: config.name.clone(),
        source_file,
        start_id: config.start_id,
        tool_version: config.tool_version.clone(),
        created_at: now,
        updated_at: now,
        slide_count: total,
        config: Some(import_options),
        export: None,
    };
    session::save_manifest(&session_path, &manifest)?;

    let result = ImportResult {
        session_id,
        session_path,
        slide_count: total,
        slides_skipped: extraction.slides_skipped,
        truncated: extraction.truncated,
        elapsed: start.elapsed(),
    };

    info!(
        session = %result.session_id,
        slides = result.slide_count,
        skipped = result.slides_skipped,
        elapsed_ms = result.elapsed.as_millis(),
        "import complete"
    );
    progress.done();

    Ok(result)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn extracted slide text into an image-generation prompt.
///
/// Text already phrased as an instruction (starts with "create", any case)
/// is kept as-is; anything else gets the standard prefix.
pub fn prefixed_caption(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.to_lowercase().starts_with("create") {
        trimmed.to_string()
    } else {
        format!("Create an image of {trimmed}")
    }
}

/// Create the session directory layout.
fn create_dirs(session_path: &Path) -> Result<()> {
    let dirs = [
        session_path.to_path_buf(),
        session_path.join("images"),
        session_path.join("previews"),
        session_path.join("indexes"),
    ];

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| RemixStudioError::io(dir, e))?;
    }

    debug!(path = %session_path.display(), "session directory created");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;
    use zip::ZipWriter;

    const SLIDE_NS: &str = concat!(
        "xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" ",
        "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
        "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"",
    );

    const PNG_BYTES: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];

    fn slide_xml(text: &str, with_pic: bool) -> String {
        let pic = if with_pic {
            "<p:pic><p:blipFill><a:blip r:embed=\"rId1\"/></p:blipFill></p:pic>"
        } else {
            ""
        };
        format!(
            "<p:sld {SLIDE_NS}><p:cSld><p:spTree>\
             <p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>\
             {pic}\
             </p:spTree></p:cSld></p:sld>"
        )
    }

    fn rels_xml(target: &str) -> String {
        format!(
            "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"{target}\"/>\
             </Relationships>"
        )
    }

    /// Build a minimal .pptx: one `(text, has_picture)` entry per slide.
    fn deck_bytes(slides: &[(&str, bool)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = FileOptions::default();

        for (i, (text, with_pic)) in slides.iter().enumerate() {
            let n = i + 1;
            writer
                .start_file(format!("ppt/slides/slide{n}.xml"), opts)
                .unwrap();
            writer
                .write_all(slide_xml(text, *with_pic).as_bytes())
                .unwrap();

            if *with_pic {
                writer
                    .start_file(format!("ppt/slides/_rels/slide{n}.xml.rels"), opts)
                    .unwrap();
                writer
                    .write_all(rels_xml(&format!("../media/image{n}.png")).as_bytes())
                    .unwrap();

                writer
                    .start_file(format!("ppt/media/image{n}.png"), opts)
                    .unwrap();
                writer.write_all(PNG_BYTES).unwrap();
            }
        }

        writer.finish().unwrap().into_inner()
    }

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "remixstudio-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn import_config(root: &Path, deck_path: PathBuf) -> ImportConfig {
        ImportConfig {
            deck_path,
            name: "Test Session".into(),
            sessions_root: root.to_path_buf(),
            start_id: 453,
            max_slides: 100,
            tool_version: "0.1.0-test".into(),
        }
    }

    fn write_deck(root: &Path, slides: &[(&str, bool)]) -> PathBuf {
        let path = root.join("deck.pptx");
        std::fs::write(&path, deck_bytes(slides)).unwrap();
        path
    }

    #[tokio::test]
    async fn import_creates_session_layout() {
        let root = temp_root();
        let deck = write_deck(
            &root,
            &[
                ("A mountain vista at dawn over the valley", true),
                ("A lighthouse on a rocky northern coast", true),
            ],
        );

        let config = import_config(&root, deck);
        let result = import_deck(&config, &SilentProgress).await.unwrap();

        assert_eq!(result.slide_count, 2);
        assert!(result.session_path.join("manifest.json").exists());
        assert!(result.session_path.join("images/453.png").exists());
        assert!(result.session_path.join("images/454.png").exists());
        assert!(result.session_path.join("previews").exists());
        assert!(result
            .session_path
            .join("indexes/remixstudio.db")
            .exists());

        let written = std::fs::read(result.session_path.join("images/453.png")).unwrap();
        assert_eq!(written, PNG_BYTES);

        let manifest = session::load_manifest(&result.session_path).unwrap();
        assert_eq!(manifest.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(manifest.name, "Test Session");
        assert_eq!(manifest.start_id, 453);
        assert_eq!(manifest.slide_count, 2);
        assert_eq!(manifest.source_file, "deck.pptx");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn import_assigns_sequential_ids_and_seeds_slots() {
        let root = temp_root();
        let deck = write_deck(
            &root,
            &[
                ("First slide with plenty of caption text", true),
                ("Second slide with plenty of caption text", true),
            ],
        );

        let config = import_config(&root, deck);
        let result = import_deck(&config, &SilentProgress).await.unwrap();

        let storage = Storage::open(&result.session_path.join("indexes/remixstudio.db"))
            .await
            .unwrap();
        let slides = storage
            .list_slides(&result.session_id.to_string())
            .await
            .unwrap();

        let ids: Vec<u64> = slides.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![453, 454]);

        for slide in &slides {
            assert_eq!(
                slide.suggestions.len(),
                remixstudio_shared::SUGGESTION_SLOTS
            );
            assert_eq!(slide.status, SlideStatus::Pending);
            assert_eq!(slide.image_sha256.len(), 64);
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn import_prefixes_captions() {
        let root = temp_root();
        let deck = write_deck(
            &root,
            &[
                ("A mountain vista at dawn over the valley", true),
                ("Create a watercolor skyline of the harbor", true),
            ],
        );

        let config = import_config(&root, deck);
        let result = import_deck(&config, &SilentProgress).await.unwrap();

        let storage = Storage::open(&result.session_path.join("indexes/remixstudio.db"))
            .await
            .unwrap();
        let slides = storage
            .list_slides(&result.session_id.to_string())
            .await
            .unwrap();

        assert_eq!(
            slides[0].caption,
            "Create an image of A mountain vista at dawn over the valley"
        );
        assert_eq!(
            slides[0].source_text,
            "A mountain vista at dawn over the valley"
        );
        assert_eq!(
            slides[1].caption,
            "Create a watercolor skyline of the harbor"
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn import_rejects_deck_without_images() {
        let root = temp_root();
        let deck = write_deck(&root, &[("Text only, nothing embedded here", false)]);

        let config = import_config(&root, deck);
        let err = import_deck(&config, &SilentProgress).await.unwrap_err();
        assert!(err.to_string().contains("no slides with embedded images"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn skipped_slides_consume_no_ids() {
        let root = temp_root();
        let deck = write_deck(
            &root,
            &[
                ("This slide has no picture attached at all", false),
                ("This slide carries the only picture here", true),
            ],
        );

        let config = import_config(&root, deck);
        let result = import_deck(&config, &SilentProgress).await.unwrap();

        assert_eq!(result.slide_count, 1);
        assert_eq!(result.slides_skipped, 1);
        assert!(result.session_path.join("images/453.png").exists());
        assert!(!result.session_path.join("images/454.png").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn prefixed_caption_rules() {
        assert_eq!(
            prefixed_caption("a fox in the snow"),
            "Create an image of a fox in the snow"
        );
        assert_eq!(
            prefixed_caption("Create a neon city street"),
            "Create a neon city street"
        );
        assert_eq!(
            prefixed_caption("  create lowercase start  "),
            "create lowercase start"
        );
        assert_eq!(prefixed_caption(""), "Create an image of ");
    }
}
