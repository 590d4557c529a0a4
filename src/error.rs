//! Error types for reel-relay
//!
//! The pipeline has two kinds of failure:
//! - **Soft** failures ([`DiscoveryError`], [`FetchError`]) are absorbed at the
//!   component boundary. The fallible `try_*` operations return them so tests and
//!   callers can tell "nothing found" apart from "something broke", and the public
//!   soft operations collapse them into an empty result after logging.
//! - **Hard** failures ([`UploadError`]) propagate to the job orchestrator, which
//!   decides per item whether the local file is kept.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for reel-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reel-relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "upload.flic_token")
        key: Option<String>,
    },

    /// Search discovery failed
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External tool execution failed (yt-dlp, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, closed session, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Reasons a search-surface query produced no usable result list
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The search surface session has already been torn down
    #[error("search session is closed")]
    SessionClosed,

    /// The result container never appeared within the wait bound
    #[error("search results did not render within {waited:?}")]
    Timeout {
        /// How long the surface waited before giving up
        waited: Duration,
    },

    /// The rendering service answered with a non-success status
    #[error("rendering service returned status {status}: {message}")]
    Render {
        /// HTTP status code returned by the rendering service
        status: u16,
        /// Response body, kept for diagnostics
        message: String,
    },

    /// Transport-level failure talking to the search surface
    #[error("search request failed: {0}")]
    Network(String),

    /// The configured result selector is not valid CSS
    #[error("invalid result selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector as configured
        selector: String,
        /// Parser diagnostic
        reason: String,
    },

    /// The configured search page URL could not be parsed
    #[error("invalid search page URL {0}")]
    InvalidSearchUrl(String),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        DiscoveryError::Network(err.to_string())
    }
}

/// Reasons a single candidate link did not become a downloaded media file
#[derive(Debug, Error)]
pub enum FetchError {
    /// The link has no extractable shortcode
    #[error("malformed post link {url}")]
    MalformedLink {
        /// The offending link
        url: String,
    },

    /// The content-download collaborator failed to resolve the post
    #[error("failed to resolve post {shortcode}: {reason}")]
    Resolve {
        /// Shortcode of the post that could not be resolved
        shortcode: String,
        /// Collaborator diagnostic
        reason: String,
    },

    /// Moving the resolved file to its final name failed
    #[error("failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        /// Where the collaborator wrote the file
        source_path: PathBuf,
        /// The deterministic destination name
        dest_path: PathBuf,
        /// The reason the move failed
        reason: String,
    },

    /// The file is missing after the move
    #[error("downloaded file missing at {path}")]
    Missing {
        /// Expected location of the file
        path: PathBuf,
    },

    /// The file exists but has zero bytes
    #[error("downloaded file is empty at {path}")]
    Empty {
        /// Location of the empty file
        path: PathBuf,
    },
}

/// Step of the publish handshake an [`UploadError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Fingerprinting and upload-slot negotiation
    Slot,
    /// Direct byte transfer to the upload slot
    Transfer,
    /// Post registration
    CreatePost,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Slot => "upload-url",
            UploadStage::Transfer => "transfer",
            UploadStage::CreatePost => "create-post",
        };
        f.write_str(name)
    }
}

/// Publish failures. Always propagated; never swallowed.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The local file could not be read or fingerprinted
    #[error("cannot read {path}: {source}")]
    File {
        /// The file being published
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The remote API answered with a non-success status
    #[error("{stage} rejected with status {status}: {body}")]
    Rejected {
        /// Which handshake step failed
        stage: UploadStage,
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// The remote API answered 2xx but the payload was not usable
    #[error("{stage} returned a malformed payload: {reason}")]
    Malformed {
        /// Which handshake step failed
        stage: UploadStage,
        /// What was wrong with the payload
        reason: String,
    },

    /// The request never produced a response
    #[error("{stage} request failed: {source}")]
    Request {
        /// Which handshake step failed
        stage: UploadStage,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },
}

impl UploadError {
    /// The handshake step this failure belongs to, if any
    pub fn stage(&self) -> Option<UploadStage> {
        match self {
            UploadError::File { .. } => None,
            UploadError::Rejected { stage, .. }
            | UploadError::Malformed { stage, .. }
            | UploadError::Request { stage, .. } => Some(*stage),
        }
    }

    /// Diagnostic body the remote side sent back, if any
    pub fn remote_body(&self) -> Option<&str> {
        match self {
            UploadError::Rejected { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}
