//! Prompt preview rendering.
//!
//! Builds image URLs for the free pollinations.ai endpoint so a labeler
//! can eyeball what a prompt produces, and optionally downloads the
//! rendered image next to the session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};
use url::Url;

use remixstudio_shared::{PreviewConfig, RemixStudioError, Result};

/// Build the preview URL for a prompt.
///
/// The prompt becomes a percent-encoded path segment; seed and render
/// dimensions travel as query parameters.
pub fn preview_url(config: &PreviewConfig, prompt: &str, seed: u32) -> Result<Url> {
    let mut url = Url::parse(&config.base_url)
        .map_err(|e| RemixStudioError::validation(format!("invalid preview base url: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| RemixStudioError::validation("preview base url cannot be a base"))?
        .push(prompt);

    url.query_pairs_mut()
        .append_pair("seed", &seed.to_string())
        .append_pair("width", &config.width.to_string())
        .append_pair("height", &config.height.to_string());
    if config.nologo {
        url.query_pairs_mut().append_pair("nologo", "true");
    }

    Ok(url)
}

/// Pick a render seed the way the preview endpoint expects (0 to 9999).
pub fn random_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..=9999)
}

/// Download a rendered preview to `dest`. Returns the destination path.
pub async fn fetch_preview(url: &Url, dest: &Path) -> Result<PathBuf> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("RemixStudio/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| RemixStudioError::Network(e.to_string()))?;

    debug!(%url, "fetching preview");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| RemixStudioError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(RemixStudioError::Network(format!(
            "preview fetch failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RemixStudioError::Network(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RemixStudioError::io(parent, e))?;
    }
    std::fs::write(dest, &bytes).map_err(|e| RemixStudioError::io(dest, e))?;

    info!(path = %dest.display(), size = bytes.len(), "preview saved");
    Ok(dest.to_path_buf())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn preview_url_encodes_prompt() {
        let config = PreviewConfig::default();
        let url = preview_url(&config, "Create an image of a fox", 42).unwrap();

        assert!(url
            .as_str()
            .starts_with("https://image.pollinations.ai/prompt/Create%20an%20image%20of%20a%20fox?"));
        let query = url.query().unwrap();
        assert!(query.contains("seed=42"));
        assert!(query.contains("width=600"));
        assert!(query.contains("height=600"));
        assert!(query.contains("nologo=true"));
    }

    #[test]
    fn preview_url_respects_dimensions_and_nologo() {
        let config = PreviewConfig {
            base_url: "https://render.example.com/p".into(),
            width: 256,
            height: 512,
            nologo: false,
        };
        let url = preview_url(&config, "harbor at dusk", 7).unwrap();

        let query = url.query().unwrap();
        assert!(query.contains("width=256"));
        assert!(query.contains("height=512"));
        assert!(!query.contains("nologo"));
    }

    #[test]
    fn preview_url_rejects_bad_base() {
        let config = PreviewConfig {
            base_url: "not a url".into(),
            ..PreviewConfig::default()
        };
        let err = preview_url(&config, "anything", 0).unwrap_err();
        assert!(err.to_string().contains("invalid preview base url"));
    }

    #[test]
    fn random_seed_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(random_seed(&mut rng) <= 9999);
        }
    }

    #[tokio::test]
    async fn fetch_preview_writes_dest_and_returns_path() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/p"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_bytes(b"fake-png".to_vec()),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/p", server.uri())).unwrap();
        let dir = std::env::temp_dir().join(format!(
            "remixstudio-preview-test-{}",
            uuid::Uuid::now_v7()
        ));
        let dest = dir.join("previews").join("453_caption.png");

        let path = fetch_preview(&url, &dest).await.unwrap();
        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&path).unwrap(), b"fake-png");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn fetch_preview_rejects_http_error_status() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/p"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/p", server.uri())).unwrap();
        let dir = std::env::temp_dir().join(format!(
            "remixstudio-preview-test-{}",
            uuid::Uuid::now_v7()
        ));
        let dest = dir.join("453_caption.png");

        let err = fetch_preview(&url, &dest).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
        assert!(!dest.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
