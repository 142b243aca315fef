//! Application configuration for Remix Studio.
//!
//! User config lives at `~/.remixstudio/remixstudio.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RemixStudioError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "remixstudio.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".remixstudio";

// ---------------------------------------------------------------------------
// Config structs (matching remixstudio.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Preview rendering endpoint settings.
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding labeling sessions.
    #[serde(default = "default_sessions_root")]
    pub sessions_root: String,

    /// First dataset id assigned on import.
    #[serde(default = "default_start_id")]
    pub start_id: u64,

    /// Maximum number of slides scanned per deck.
    #[serde(default = "default_max_slides")]
    pub max_slides: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            sessions_root: default_sessions_root(),
            start_id: default_start_id(),
            max_slides: default_max_slides(),
        }
    }
}

fn default_sessions_root() -> String {
    "~/remixstudio-sessions".into()
}
fn default_start_id() -> u64 {
    453
}
fn default_max_slides() -> usize {
    100
}

/// `[preview]` section: the text-to-image endpoint used to render prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Base URL; the prompt is appended as a path segment.
    #[serde(default = "default_preview_base_url")]
    pub base_url: String,

    /// Rendered image width in pixels.
    #[serde(default = "default_preview_dim")]
    pub width: u32,

    /// Rendered image height in pixels.
    #[serde(default = "default_preview_dim")]
    pub height: u32,

    /// Ask the endpoint to skip its watermark.
    #[serde(default = "default_true")]
    pub nologo: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: default_preview_base_url(),
            width: default_preview_dim(),
            height: default_preview_dim(),
            nologo: true,
        }
    }
}

fn default_preview_base_url() -> String {
    "https://image.pollinations.ai/prompt".into()
}
fn default_preview_dim() -> u32 {
    600
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.remixstudio/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RemixStudioError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.remixstudio/remixstudio.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RemixStudioError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RemixStudioError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RemixStudioError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RemixStudioError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RemixStudioError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a tilde pass through unchanged; if the home directory
/// cannot be determined the raw path is returned as-is.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sessions_root"));
        assert!(toml_str.contains("image.pollinations.ai"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.start_id, 453);
        assert_eq!(parsed.defaults.max_slides, 100);
        assert_eq!(parsed.preview.width, 600);
        assert!(parsed.preview.nologo);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
sessions_root = "/data/labeling"
start_id = 1000
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.sessions_root, "/data/labeling");
        assert_eq!(config.defaults.start_id, 1000);
        assert_eq!(config.defaults.max_slides, 100);
        assert_eq!(config.preview.height, 600);
    }

    #[test]
    fn expand_home_passthrough() {
        assert_eq!(expand_home("/tmp/sessions"), PathBuf::from("/tmp/sessions"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/sessions"), home.join("sessions"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
