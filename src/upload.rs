//! Publishing to the SocialVerse content API
//!
//! A publish is three ordered steps, and the first failure ends it:
//!
//! 1. fingerprint the file and request an upload slot
//!    (`GET {base}/posts/generate-upload-url`)
//! 2. stream the bytes to the slot (`PUT {slot}`)
//! 3. register the post (`POST {base}/posts`)
//!
//! Every failure is logged with the body the server sent, then returned. A
//! failed transfer means no post is ever registered.

use crate::config::UploadConfig;
use crate::error::{UploadError, UploadStage};
use crate::fingerprint::fingerprint_file;
use crate::types::{ContentFingerprint, PostRecord, UploadSlot, Visibility};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Header carrying the API token
const TOKEN_HEADER: &str = "Flic-Token";

/// Every post is registered outside the public feed
const POST_VISIBILITY: Visibility = Visibility::Private;

#[derive(Debug, Serialize)]
struct SlotRequest<'a> {
    hash: &'a str,
    file_size: u64,
}

#[derive(Debug, Deserialize)]
struct SlotResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    hash: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    title: &'a str,
    hash: &'a str,
    is_available_in_public_feed: bool,
    category_id: u32,
}

/// Client for the publish handshake
pub struct UploadPipeline {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chunk_size: usize,
}

impl UploadPipeline {
    /// Create a pipeline from upload settings
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &UploadConfig) -> crate::Result<Self> {
        // Connection setup only; a streamed transfer has no deadline
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.flic_token.clone(),
            chunk_size: config.chunk_size,
        })
    }

    /// Step 1: fingerprint `path` and negotiate an upload slot
    ///
    /// Returns the slot and the locally computed fingerprint and size.
    pub async fn request_slot(
        &self,
        path: &Path,
    ) -> Result<(UploadSlot, ContentFingerprint, u64), UploadError> {
        let (fingerprint, file_size) = fingerprint_file(path, self.chunk_size)
            .await
            .map_err(|source| UploadError::File {
                path: path.to_path_buf(),
                source,
            })
            .inspect_err(|e| log_failure(e, "error fingerprinting file"))?;

        let url = format!("{}/posts/generate-upload-url", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(&SlotRequest {
                hash: fingerprint.as_str(),
                file_size,
            })
            .send()
            .await
            .map_err(|source| UploadError::Request {
                stage: UploadStage::Slot,
                source,
            })
            .inspect_err(|e| log_failure(e, "error getting upload URL"))?;

        let body = check_status(resp, UploadStage::Slot)
            .await
            .inspect_err(|e| log_failure(e, "error getting upload URL"))?;

        let slot = parse_slot(&body, &fingerprint)
            .inspect_err(|e| log_failure(e, "error getting upload URL"))?;

        tracing::info!(
            path = %path.display(),
            file_size,
            hash = %fingerprint,
            "upload URL generated"
        );
        Ok((slot, fingerprint, file_size))
    }

    /// Step 2: stream the file to the slot
    pub async fn transfer(
        &self,
        path: &Path,
        slot: &UploadSlot,
        file_size: u64,
    ) -> Result<(), UploadError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| UploadError::File {
                path: path.to_path_buf(),
                source,
            })
            .inspect_err(|e| log_failure(e, "error uploading video"))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::with_capacity(file, self.chunk_size.max(1)));

        let resp = self
            .client
            .put(&slot.target_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, file_size)
            .body(body)
            .send()
            .await
            .map_err(|source| UploadError::Request {
                stage: UploadStage::Transfer,
                source,
            })
            .inspect_err(|e| log_failure(e, "error uploading video"))?;

        check_status(resp, UploadStage::Transfer)
            .await
            .inspect_err(|e| log_failure(e, "error uploading video"))?;

        tracing::info!(path = %path.display(), "successfully uploaded video");
        Ok(())
    }

    /// Step 3: register the post
    pub async fn create_post(
        &self,
        fingerprint: &ContentFingerprint,
        title: &str,
        category_id: u32,
    ) -> Result<PostRecord, UploadError> {
        let payload = CreatePostRequest {
            title,
            hash: fingerprint.as_str(),
            is_available_in_public_feed: POST_VISIBILITY.is_public(),
            category_id,
        };
        tracing::info!(title, hash = %fingerprint, category_id, "creating post");

        let url = format!("{}/posts", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|source| UploadError::Request {
                stage: UploadStage::CreatePost,
                source,
            })
            .inspect_err(|e| log_failure(e, "error creating post"))?;

        let body = check_status(resp, UploadStage::CreatePost)
            .await
            .inspect_err(|e| log_failure(e, "error creating post"))?;

        let record = parse_post(&body, title, category_id, POST_VISIBILITY)
            .inspect_err(|e| log_failure(e, "error creating post"))?;

        tracing::info!(post_id = %record.id, "post created successfully");
        Ok(record)
    }

    /// Run all three steps for `path`
    ///
    /// # Errors
    ///
    /// Returns the first step's [`UploadError`]. Later steps do not run.
    pub async fn publish(
        &self,
        path: &Path,
        title: &str,
        category_id: u32,
    ) -> Result<PostRecord, UploadError> {
        let result = async {
            let (slot, _local, file_size) = self.request_slot(path).await?;
            self.transfer(path, &slot, file_size).await?;
            self.create_post(&slot.fingerprint, title, category_id).await
        }
        .await;

        if let Err(ref e) = result {
            tracing::error!(path = %path.display(), error = %e, "complete upload process failed");
        }
        result
    }
}

/// Body of a 2xx response, or a `Rejected` error carrying the body
async fn check_status(resp: reqwest::Response, stage: UploadStage) -> Result<String, UploadError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|source| UploadError::Request { stage, source })?;

    if !status.is_success() {
        return Err(UploadError::Rejected {
            stage,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Slot from a `{url, hash}` payload
///
/// The server's hash is authoritative for the post; the local fingerprint is
/// used when the server omits it.
fn parse_slot(body: &str, local: &ContentFingerprint) -> Result<UploadSlot, UploadError> {
    let malformed = |reason: String| UploadError::Malformed {
        stage: UploadStage::Slot,
        reason,
    };

    let parsed: SlotResponse = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let target_url = parsed
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| malformed("response has no upload url".into()))?;

    let fingerprint = match parsed.hash.filter(|h| !h.is_empty()) {
        Some(remote) if remote.eq_ignore_ascii_case(local.as_str()) => local.clone(),
        Some(remote) => {
            tracing::warn!(local = %local, remote = %remote, "server returned a different hash, using server hash");
            ContentFingerprint(remote)
        }
        None => local.clone(),
    };

    Ok(UploadSlot {
        target_url,
        fingerprint,
    })
}

/// Post record from the create-post payload; `id` may be a number or a string
fn parse_post(
    body: &str,
    title: &str,
    category_id: u32,
    visibility: Visibility,
) -> Result<PostRecord, UploadError> {
    let malformed = |reason: String| UploadError::Malformed {
        stage: UploadStage::CreatePost,
        reason,
    };

    let raw: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let id = match raw.get("id") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err(malformed("response has no post id".into())),
    };

    Ok(PostRecord {
        id,
        title: title.to_string(),
        category_id,
        visibility,
        raw,
    })
}

fn log_failure(err: &UploadError, message: &str) {
    match err.remote_body() {
        Some(body) => tracing::error!(error = %err, response = %body, "{message}"),
        None => tracing::error!(error = %err, "{message}"),
    }
}
