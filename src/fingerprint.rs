//! Streaming SHA-256 content fingerprints

use crate::types::ContentFingerprint;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hash `path` in `chunk_size` reads and return the fingerprint and byte length
///
/// Only one chunk is held in memory at a time. A `chunk_size` of zero is
/// treated as one byte.
pub async fn fingerprint_file(
    path: &Path,
    chunk_size: usize,
) -> std::io::Result<(ContentFingerprint, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    Ok((fingerprint_from_digest(hasher), total))
}

/// Fingerprint of an in-memory buffer
pub fn fingerprint_bytes(data: &[u8]) -> ContentFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    fingerprint_from_digest(hasher)
}

fn fingerprint_from_digest(hasher: Sha256) -> ContentFingerprint {
    ContentFingerprint(format!("{:x}", hasher.finalize()))
}
