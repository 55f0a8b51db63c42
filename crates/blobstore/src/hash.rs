//! ContentDigest: the full 256-bit BLAKE3 digest of stored content (64 hex chars).
//!
//! Digests are computed by streaming, so hashing a large object never holds
//! more than one chunk in memory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::transfer::read_chunk;

/// A content digest - 256 bits (32 bytes, 64 hex chars) of BLAKE3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

/// Errors that can occur when parsing digests.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid digest length: expected 64 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in digest")]
    InvalidHex,
}

impl ContentDigest {
    /// Hash an in-memory buffer.
    pub fn from_data(data: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(data).as_bytes()))
    }

    /// Create from an existing digest string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, HashError> {
        if s.len() != 64 {
            return Err(HashError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentDigest {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for ContentDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stream a reader through BLAKE3, `chunk_size` bytes at a time.
///
/// Cancellation is checked before every chunk.
pub async fn hash_reader<R>(
    reader: &mut R,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<ContentDigest, StoreError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; chunk_size];

    loop {
        let n = read_chunk(reader, &mut buf, cancel, "failed to read object for hashing")
            .await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentDigest(hasher.finalize().to_hex().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_produces_64_hex_chars() {
        let digest = ContentDigest::from_data(b"Hello, World!");
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f')));
    }

    #[test]
    fn test_known_vector() {
        // BLAKE3 of the empty input
        assert_eq!(
            ContentDigest::from_data(b"").as_str(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_from_data_different_input_different_digest() {
        assert_ne!(
            ContentDigest::from_data(b"data a"),
            ContentDigest::from_data(b"data b")
        );
    }

    #[test]
    fn test_from_str_validation() {
        assert!(matches!(
            "short".parse::<ContentDigest>(),
            Err(HashError::InvalidLength(5))
        ));
        assert!(matches!(
            "z".repeat(64).parse::<ContentDigest>(),
            Err(HashError::InvalidHex)
        ));
        let upper = ContentDigest::from_data(b"x").as_str().to_uppercase();
        assert_eq!(
            upper.parse::<ContentDigest>().unwrap(),
            ContentDigest::from_data(b"x")
        );
    }

    #[tokio::test]
    async fn test_streaming_matches_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader: &[u8] = &data;
        // Small chunks force many iterations
        let streamed = hash_reader(&mut reader, 7, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(streamed, ContentDigest::from_data(&data));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut reader: &[u8] = b"never hashed";
        let err = hash_reader(&mut reader, 4, &cancel).await.unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }

    #[test]
    fn test_serde_roundtrip() {
        let digest = ContentDigest::from_data(b"serde test");
        let json = serde_json::to_string(&digest).unwrap();
        let restored: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, restored);
    }
}
