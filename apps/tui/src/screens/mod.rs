//! TUI screen definitions.
//!
//! Each screen corresponds to a tab and owns its own input state; the
//! session being labeled is shared between screens via `SessionContext`.

mod editor;
mod export;
mod load;

pub(crate) use editor::EditorScreen;
pub(crate) use export::ExportScreen;
pub(crate) use load::LoadScreen;

use std::fmt;
use std::path::{Path, PathBuf};

use remixstudio_core::session;
use remixstudio_shared::{AppConfig, Result, SessionManifest, SlideRecord, SlideStatus};
use remixstudio_storage::Storage;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Load,
    Editor,
    Export,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "Load Deck"),
            Self::Editor => write!(f, "Label Slides"),
            Self::Export => write!(f, "Export"),
        }
    }
}

/// State shared between screens.
pub(crate) struct SessionContext {
    /// Resolved application configuration.
    pub config: AppConfig,
    /// Root directory holding session directories.
    pub sessions_root: PathBuf,
    /// The session currently open for labeling, if any.
    pub open: Option<OpenSession>,
}

impl SessionContext {
    /// Open a session directory and load its slides into memory.
    pub(crate) async fn open_session(&mut self, path: &Path) -> Result<()> {
        let (manifest, storage) = session::open_session(path).await?;
        let slides = storage.list_slides(&manifest.id.to_string()).await?;
        self.open = Some(OpenSession {
            manifest,
            path: path.to_path_buf(),
            storage,
            slides,
            current: 0,
        });
        Ok(())
    }
}

/// An open labeling session with its slides loaded.
pub(crate) struct OpenSession {
    pub manifest: SessionManifest,
    pub path: PathBuf,
    pub storage: Storage,
    pub slides: Vec<SlideRecord>,
    /// Index into `slides` of the slide being edited.
    pub current: usize,
}

impl OpenSession {
    pub(crate) fn labeled_count(&self) -> usize {
        self.slides
            .iter()
            .filter(|s| s.status == SlideStatus::Labeled)
            .count()
    }
}
