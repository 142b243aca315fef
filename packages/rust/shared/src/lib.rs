//! Shared types, error model, and configuration for Remix Studio.
//!
//! This crate is the foundation depended on by all other Remix Studio crates.
//! It provides:
//! - [`RemixStudioError`]: the unified error type
//! - Domain types ([`SessionManifest`], [`SlideRecord`], [`RemixSuggestion`], [`SessionId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PreviewConfig, config_dir, config_file_path, expand_home,
    init_config, load_config, load_config_from,
};
pub use error::{RemixStudioError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, DatasetRecord, RemixSuggestion, SUGGESTION_SLOTS, SessionId,
    SessionManifest, SlideRecord, SlideStatus,
};
