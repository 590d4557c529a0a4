//! Config builders and mock-API fixtures

use reel_relay::Config;
use reel_relay::fingerprint::fingerprint_bytes;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "flic_integration";

/// Canonical post URL for a shortcode
pub fn reel_url(shortcode: &str) -> String {
    format!("https://www.instagram.com/reel/{shortcode}/")
}

/// Config pointing at `server` and writing into `dir`, with a 1 ms backoff
pub fn test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::from_lookup(|key| match key {
        "FLIC_TOKEN" => Some(TEST_TOKEN.to_string()),
        "REEL_RELAY_API_BASE" => Some(server.uri()),
        "REEL_RELAY_DOWNLOAD_DIR" => Some(dir.display().to_string()),
        _ => None,
    })
    .unwrap();
    config.retry.backoff = Duration::from_millis(1);
    config
}

/// Mount the three publish endpoints, expecting one handshake per item in `videos`
///
/// Each item gets its own slot path and post id (`post-<n>`, 1-based).
pub async fn mount_publish_api(server: &MockServer, videos: &[&[u8]], title: &str) {
    for (n, bytes) in videos.iter().enumerate() {
        let n = n + 1;
        let hash = fingerprint_bytes(bytes).0;

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .and(header("Flic-Token", TEST_TOKEN))
            .and(body_json(serde_json::json!({
                "hash": hash,
                "file_size": bytes.len(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/slots/{n}", server.uri()),
                "hash": hash,
            })))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("/slots/{n}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(serde_json::json!({
                "title": title,
                "hash": hash,
                "is_available_in_public_feed": false,
                "category_id": 25,
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": format!("post-{n}")})),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Mount publish endpoints that must never be called
pub async fn forbid_publish(server: &MockServer) {
    for verb in ["GET", "PUT", "POST"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }
}
