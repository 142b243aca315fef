//! Core domain types for Remix Studio labeling sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RemixStudioError;

/// Current schema version for the session manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Number of remix suggestion slots every slide carries.
pub const SUGGESTION_SLOTS: usize = 3;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for labeling session identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// RemixSuggestion
// ---------------------------------------------------------------------------

/// One style-transfer suggestion: a short label plus the full edit prompt.
///
/// Serialized verbatim into the exported dataset, so field names stay
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemixSuggestion {
    /// Short human-facing title (e.g. "Want a wider view?").
    pub label: String,
    /// The image edit instruction.
    pub prompt: String,
}

impl RemixSuggestion {
    pub fn new(label: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SlideStatus
// ---------------------------------------------------------------------------

/// Labeling state of a single slide. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideStatus {
    /// Imported but not yet reviewed by a human.
    Pending,
    /// Caption and suggestions confirmed; eligible for export.
    Labeled,
}

impl SlideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Labeled => "labeled",
        }
    }
}

impl std::fmt::Display for SlideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlideStatus {
    type Err = RemixStudioError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "labeled" => Ok(Self::Labeled),
            other => Err(RemixStudioError::validation(format!(
                "unknown slide status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SlideRecord
// ---------------------------------------------------------------------------

/// Full labeling state for one slide, stored in the session database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideRecord {
    /// Dataset identifier (consecutive from the session's start id).
    pub id: u64,
    /// Owning session.
    pub session_id: String,
    /// 1-based position of the slide in the source deck.
    pub slide_index: usize,
    /// Image file name under the session's `images/` directory.
    pub image_file: String,
    /// SHA-256 of the stored image bytes.
    pub image_sha256: String,
    /// Raw caption candidate extracted from the slide.
    pub source_text: String,
    /// Editable main prompt for the dataset record.
    pub caption: String,
    /// Remix suggestion slots (always [`SUGGESTION_SLOTS`] entries).
    pub suggestions: Vec<RemixSuggestion>,
    /// Labeling state.
    pub status: SlideStatus,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DatasetRecord
// ---------------------------------------------------------------------------

/// One entry of the exported `dataset.json` array.
///
/// The dataset contract renders the numeric id as a string and uses a
/// camelCase key for the suggestion list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Dataset id, rendered as a string.
    pub id: String,
    /// Main image prompt.
    pub prompt: String,
    /// The slide's remix suggestions.
    #[serde(rename = "remixSuggestions")]
    pub remix_suggestions: Vec<RemixSuggestion>,
}

impl From<&SlideRecord> for DatasetRecord {
    fn from(slide: &SlideRecord) -> Self {
        Self {
            id: slide.id.to_string(),
            prompt: slide.caption.clone(),
            remix_suggestions: slide.suggestions.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` structure stored at the root of each session directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this session.
    pub id: SessionId,
    /// Human-readable name.
    pub name: String,
    /// File name of the imported deck.
    pub source_file: String,
    /// First dataset id assigned on import.
    pub start_id: u64,
    /// Tool version that created this session.
    pub tool_version: String,
    /// When the session was first created.
    pub created_at: DateTime<Utc>,
    /// When the session was last touched.
    pub updated_at: DateTime<Utc>,
    /// Number of slides imported (with images).
    pub slide_count: usize,
    /// Import options snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    /// Metadata of the last export (file, sha256, counts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::new();
        let s = id.to_string();
        let parsed: SessionId = s.parse().expect("parse SessionId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn manifest_serialization() {
        let manifest = SessionManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: SessionId::new(),
            name: "q3-deck".into(),
            source_file: "q3-deck.pptx".into(),
            start_id: 453,
            tool_version: "0.1.0".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            slide_count: 0,
            config: None,
            export: None,
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: SessionManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.name, "q3-deck");
        assert_eq!(parsed.start_id, 453);
    }

    #[test]
    fn slide_status_roundtrip() {
        assert_eq!("pending".parse::<SlideStatus>().unwrap(), SlideStatus::Pending);
        assert_eq!("labeled".parse::<SlideStatus>().unwrap(), SlideStatus::Labeled);
        assert!("done".parse::<SlideStatus>().is_err());
        assert_eq!(SlideStatus::Labeled.to_string(), "labeled");
    }

    #[test]
    fn dataset_record_shape() {
        let slide = SlideRecord {
            id: 454,
            session_id: "s".into(),
            slide_index: 2,
            image_file: "454.png".into(),
            image_sha256: "abc".into(),
            source_text: "A mountain lake at dawn".into(),
            caption: "Create an image of a mountain lake at dawn".into(),
            suggestions: vec![RemixSuggestion::new("Go monochrome?", "Make this black and white.")],
            status: SlideStatus::Labeled,
            updated_at: Utc::now(),
        };

        let record = DatasetRecord::from(&slide);
        assert_eq!(record.id, "454");

        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"remixSuggestions\""));
        assert!(json.contains("\"id\":\"454\""));
    }
}
