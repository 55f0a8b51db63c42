//! Store configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `BLOBSTORE_PATH`: Directory holding stored objects
//! - `BLOBSTORE_READONLY`: Set to "true" for read-only mode
//! - `BLOBSTORE_CHUNK_SIZE`: Transfer chunk size in bytes
//!
//! Default path: `~/.blobstore`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Default size of a single read/write during streaming transfers.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Name of the hidden directory (inside `base_path`) used for in-flight writes.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Configuration for a blob store directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding stored objects.
    /// In-flight writes live in `{base_path}/.staging/`.
    pub base_path: PathBuf,

    /// Read-only mode - rejects store, update and delete.
    #[serde(default)]
    pub read_only: bool,

    /// Bytes moved per chunk when streaming, hashing or reading whole files.
    /// Cancellation is checked at every chunk boundary.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_path: default_store_path(),
            read_only: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Get the default store path (~/.blobstore).
fn default_store_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".blobstore"))
        .unwrap_or_else(|| PathBuf::from(".blobstore"))
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let base_path = env::var("BLOBSTORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_path());

        let read_only = env::var("BLOBSTORE_READONLY")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let chunk_size = match env::var("BLOBSTORE_CHUNK_SIZE") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("invalid BLOBSTORE_CHUNK_SIZE: {}", v))?,
            Err(_) => DEFAULT_CHUNK_SIZE,
        };

        Ok(Self {
            base_path,
            read_only,
            chunk_size,
        })
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[blobstore]` section:
    /// ```toml
    /// [blobstore]
    /// base_path = "/srv/blobs"
    /// read_only = false
    /// chunk_size = 65536
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        if let Some(section) = table.get("blobstore") {
            let config: StoreConfig = section
                .clone()
                .try_into()
                .context("failed to parse [blobstore] section")?;
            Ok(config)
        } else {
            Self::from_env()
        }
    }

    /// Create a config with a specific base path.
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a read-only config with a specific base path.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the transfer chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Get the staging directory path.
    pub fn staging_dir(&self) -> PathBuf {
        self.base_path.join(STAGING_DIR_NAME)
    }
}
