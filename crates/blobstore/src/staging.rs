//! Staging: writes land in a private temp file and become visible in one step.
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── 0123...cdef.png     # Published objects
//! ├── report.pdf
//! └── .staging/
//!     ├── 9f2c...e1.partial   # In-flight writes
//!     └── 4b7a...90.claim     # Keys with a store in progress
//! ```
//!
//! A store first takes a [`KeyClaim`]: a marker whose name is derived from
//! the key alone, created exclusively. An id's final file name depends on
//! the inferred extension, so two writers for one id may target different
//! paths; the claim is what makes the second one fail.
//!
//! A staged file is published either with a hard link (fails if the target
//! exists) or with a rename over an existing target. Readers therefore see
//! the old content or the new content, never a half-written file. A staged
//! file that is never published is removed when its handle drops.
//!
//! On filesystems without hard links (exFAT, FAT, some network mounts) a new
//! object is published by copying into a `create_new` target instead. The
//! target still can't be clobbered, but a concurrent reader may see it
//! while the copy is in progress.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::hash::ContentDigest;
use crate::transfer;

/// Exclusive marker held while new content is written for a key.
///
/// Released when dropped; [`release`](Self::release) does the same without
/// blocking.
#[derive(Debug)]
pub struct KeyClaim {
    path: PathBuf,
    released: bool,
}

impl KeyClaim {
    /// Claim `key`, failing with an `AlreadyExists` I/O error if another
    /// store for the same key is in flight.
    pub async fn acquire(staging_dir: &Path, key: &str) -> Result<Self, StoreError> {
        fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| StoreError::io("failed to create staging directory", e))?;

        // Names can be up to 255 bytes; the digest keeps the marker name short
        let marker = format!("{}.claim", ContentDigest::from_data(key.as_bytes()));
        let path = staging_dir.join(marker);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(format!("key {} is already being stored", key), e))?;

        debug!(key, path = %path.display(), "claimed key");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn release(mut self) {
        self.released = true;
        remove_quietly(&self.path).await;
    }
}

impl Drop for KeyClaim {
    fn drop(&mut self) {
        if !self.released {
            remove_quietly_blocking(&self.path);
        }
    }
}

/// A temp file being written under the staging directory.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
    file: Option<File>,
    bytes_written: u64,
    settled: bool,
}

impl StagingFile {
    /// Create a fresh, uniquely named staging file.
    pub async fn create(staging_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| StoreError::io("failed to create staging directory", e))?;

        let path = staging_dir.join(format!("{}.partial", Uuid::new_v4().simple()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io("failed to create staging file", e))?;

        Ok(Self {
            path,
            file: Some(file),
            bytes_written: 0,
            settled: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn file_mut(&mut self) -> Result<&mut File, StoreError> {
        self.file.as_mut().ok_or_else(|| {
            StoreError::io(
                "staging file already closed",
                io::Error::other("write after close"),
            )
        })
    }

    /// Write an in-memory prefix (e.g. an already-inspected header).
    pub async fn write_prefix(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.file_mut()?
            .write_all(data)
            .await
            .map_err(|e| StoreError::io("failed to write object", e))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Stream the rest of a payload into the staging file.
    pub async fn write_from<R>(
        &mut self,
        reader: &mut R,
        chunk_size: usize,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let file = self.file_mut()?;
        let copied = transfer::copy(reader, file, chunk_size, cancel).await?;
        self.bytes_written += copied;
        Ok(copied)
    }

    /// Flush to disk and close the handle.
    async fn finish(&mut self) -> Result<(), StoreError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| StoreError::io("failed to flush staging file", e))?;
            file.sync_all()
                .await
                .map_err(|e| StoreError::io("failed to sync staging file", e))?;
        }
        Ok(())
    }

    /// Make the content visible at `target`, which must not exist yet.
    ///
    /// Fails with an `AlreadyExists` I/O error if another writer got there
    /// first; that writer's file is left untouched.
    pub async fn publish_new(mut self, target: &Path) -> Result<u64, StoreError> {
        self.finish().await?;
        match fs::hard_link(&self.path, target).await {
            Ok(()) => {}
            // FAT-style filesystems report EPERM for link(2)
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied
            ) =>
            {
                debug!(error = %e, "hard link unavailable, publishing by copy");
                self.copy_to_new(target).await?;
            }
            Err(e) => {
                return Err(StoreError::io(
                    format!("failed to publish {}", target.display()),
                    e,
                ))
            }
        }
        self.settled = true;
        remove_quietly(&self.path).await;
        debug!(target = %target.display(), bytes = self.bytes_written, "published new object");
        Ok(self.bytes_written)
    }

    /// Copy the staged content into a freshly created `target`.
    async fn copy_to_new(&self, target: &Path) -> Result<(), StoreError> {
        let context = || format!("failed to publish {}", target.display());
        let mut source = File::open(&self.path)
            .await
            .map_err(|e| StoreError::io("failed to reopen staging file", e))?;
        let mut dest = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .await
            .map_err(|e| StoreError::io(context(), e))?;

        let copied = async {
            tokio::io::copy(&mut source, &mut dest).await?;
            dest.sync_all().await
        }
        .await;
        if let Err(e) = copied {
            drop(dest);
            remove_quietly(target).await;
            return Err(StoreError::io(context(), e));
        }
        Ok(())
    }

    /// Atomically replace the file at `target`.
    pub async fn publish_replace(mut self, target: &Path) -> Result<u64, StoreError> {
        self.finish().await?;
        fs::rename(&self.path, target)
            .await
            .map_err(|e| StoreError::io(format!("failed to replace {}", target.display()), e))?;
        self.settled = true;
        debug!(target = %target.display(), bytes = self.bytes_written, "replaced object");
        Ok(self.bytes_written)
    }

    /// Remove the staged file without blocking the runtime.
    pub async fn abandon(mut self) {
        self.settled = true;
        self.file.take();
        remove_quietly(&self.path).await;
    }
}

// Error paths in the store call `abandon`. Drop still covers `?` early
// returns and futures dropped mid-write, where nothing can be awaited; the
// unlink of one staging entry is synchronous there.
impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Close before unlinking so Windows lets the removal through
        self.file.take();
        remove_quietly_blocking(&self.path);
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove staging entry");
        }
    }
}

fn remove_quietly_blocking(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove abandoned staging entry");
        }
    }
}
