//! FileStore: key-addressed blob storage in a single directory.
//!
//! One generic implementation serves both key flavours; the
//! [`KeyStrategy`] decides file naming and lookup.
//!
//! Every operation takes a [`CancellationToken`] and returns an
//! [`OperationResult`]. Expected failures (missing key, bad input, I/O
//! errors, cancellation) are reported inside the result, never as a panic
//! or an `Err`. A token that is already cancelled stops the operation before
//! it touches the filesystem; a token cancelled mid-transfer stops it at the
//! next chunk boundary.

use bytes::Bytes;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use anyhow::{Context, Result};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::hash::{self, ContentDigest};
use crate::key::ObjectId;
use crate::object::{ContentPayload, ContentStream, StoredObject};
use crate::resolver::{IdKeys, KeyStrategy, NamedKeys, Resolution};
use crate::result::OperationResult;
use crate::signature;
use crate::staging::{KeyClaim, StagingFile};
use crate::transfer;

/// Store addressed by generated ids with inferred extensions.
pub type IdStore = FileStore<IdKeys>;

/// Store addressed by caller-supplied names.
pub type NamedStore = FileStore<NamedKeys>;

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct FileStore<S> {
    config: StoreConfig,
    strategy: S,
}

impl<S: KeyStrategy + Default> FileStore<S> {
    /// Open a store with the given configuration.
    ///
    /// Creates the directory and its staging area if they don't exist
    /// (unless in read-only mode).
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_strategy(config, S::default())
    }

    /// Open a store at a specific path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::with_base_path(path))
    }

    /// Open a read-only store at a specific path.
    pub fn read_only_at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::read_only(path))
    }
}

impl<S: KeyStrategy> FileStore<S> {
    pub fn with_strategy(config: StoreConfig, strategy: S) -> Result<Self> {
        if config.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        if !config.read_only {
            fs::create_dir_all(&config.base_path).with_context(|| {
                format!("failed to create store directory {}", config.base_path.display())
            })?;
            fs::create_dir_all(config.staging_dir())
                .context("failed to create staging directory")?;
        }

        info!(
            path = %config.base_path.display(),
            read_only = config.read_only,
            "blob store opened"
        );
        Ok(Self { config, strategy })
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn dir(&self) -> &Path {
        &self.config.base_path
    }

    async fn resolve(&self, key: &S::Key) -> Result<Resolution, StoreError> {
        self.strategy
            .resolve(self.dir(), key)
            .await
            .map_err(|e| StoreError::io(format!("failed to resolve key {}", key), e))
    }

    /// Resolve to the single file reads and updates act on.
    async fn resolve_primary(&self, key: &S::Key) -> Result<PathBuf, StoreError> {
        let resolution = self.resolve(key).await?;
        match resolution.primary() {
            Some(path) => {
                debug!(key = %key, path = %path.display(), "resolved");
                Ok(path.to_path_buf())
            }
            None => Err(StoreError::not_found(key)),
        }
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.config.read_only {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Store new content under `key`.
    ///
    /// Fails if the key already resolves to a file; use [`update`](Self::update)
    /// to replace content. Two concurrent stores for the same key produce one
    /// success and one `AlreadyExists` I/O failure.
    #[tracing::instrument(
        name = "blobstore.store",
        skip(self, key, payload, cancel),
        fields(key = %key, declared_len = payload.reported_len(), bytes = tracing::field::Empty)
    )]
    pub async fn store(
        &self,
        key: &S::Key,
        payload: ContentPayload,
        cancel: &CancellationToken,
    ) -> OperationResult<StoredObject> {
        let outcome = self.try_store(key, payload, cancel).await;
        self.finish("store", outcome, |object| {
            format!("stored {} as {}", object.key, object.file_name)
        })
    }

    async fn try_store(
        &self,
        key: &S::Key,
        payload: ContentPayload,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, StoreError> {
        check_cancelled(cancel)?;
        self.ensure_writable()?;

        // Held until the file is published; checked for existing files only
        // once it is ours, so a writer that finished in between is seen
        let claim = KeyClaim::acquire(&self.config.staging_dir(), &key.to_string()).await?;
        if let Some(existing) = self.resolve(key).await?.primary() {
            return Err(StoreError::io(
                format!("key {} already exists", key),
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} is already stored", existing.display()),
                ),
            ));
        }

        let (mut reader, declared_len) = payload.into_parts();
        let mut staged = StagingFile::create(&self.config.staging_dir()).await?;

        let written = async {
            let extension = if self.strategy.infers_extension() {
                let header = signature::read_header(&mut reader, cancel).await?;
                staged.write_prefix(&header).await?;
                signature::detect_extension(&header)
            } else {
                ""
            };
            staged
                .write_from(&mut reader, self.config.chunk_size, cancel)
                .await?;
            check_declared_len(declared_len, staged.bytes_written())?;
            Ok::<_, StoreError>(extension)
        }
        .await;
        let extension = match written {
            Ok(extension) => extension,
            Err(e) => {
                staged.abandon().await;
                return Err(e);
            }
        };

        let file_name = self.strategy.file_name(key, extension);
        let path = self.dir().join(&file_name);
        let size_bytes = staged.publish_new(&path).await?;
        claim.release().await;
        tracing::Span::current().record("bytes", size_bytes);

        Ok(StoredObject {
            key: key.to_string(),
            file_name,
            extension: extension.to_string(),
            size_bytes,
            path,
        })
    }

    /// Check whether `key` resolves to a file, without opening it.
    ///
    /// A missing key is a failed result carrying `false`.
    #[tracing::instrument(name = "blobstore.exists", skip(self, key, cancel), fields(key = %key))]
    pub async fn exists(&self, key: &S::Key, cancel: &CancellationToken) -> OperationResult<bool> {
        if let Err(e) = check_cancelled(cancel) {
            return OperationResult::failure(e);
        }
        match self.resolve(key).await {
            Ok(resolution) if !resolution.is_empty() => {
                OperationResult::ok(true, format!("{} exists", key))
            }
            Ok(_) => OperationResult::failure(StoreError::not_found(key)).with_payload(false),
            Err(e) => {
                warn!(error = %e, "exists failed");
                OperationResult::failure(e)
            }
        }
    }

    /// Open the content for streaming. The caller owns the returned stream.
    #[tracing::instrument(name = "blobstore.get", skip(self, key, cancel), fields(key = %key))]
    pub async fn get(
        &self,
        key: &S::Key,
        cancel: &CancellationToken,
    ) -> OperationResult<ContentStream> {
        let outcome = self.try_get(key, cancel).await;
        self.finish("get", outcome, |stream| {
            format!("opened {} ({} bytes)", key, stream.len())
        })
    }

    async fn try_get(
        &self,
        key: &S::Key,
        cancel: &CancellationToken,
    ) -> Result<ContentStream, StoreError> {
        check_cancelled(cancel)?;
        let path = self.resolve_primary(key).await?;
        let (file, len) = open_object(&path).await?;
        Ok(ContentStream::new(file, len, path))
    }

    /// Read the whole object into memory. Meant for small objects; there is
    /// no size ceiling here.
    #[tracing::instrument(name = "blobstore.get_bytes", skip(self, key, cancel), fields(key = %key))]
    pub async fn get_bytes(&self, key: &S::Key, cancel: &CancellationToken) -> OperationResult<Bytes> {
        let outcome = self.try_get_bytes(key, cancel).await;
        self.finish("get_bytes", outcome, |data| {
            format!("read {} bytes from {}", data.len(), key)
        })
    }

    async fn try_get_bytes(
        &self,
        key: &S::Key,
        cancel: &CancellationToken,
    ) -> Result<Bytes, StoreError> {
        check_cancelled(cancel)?;
        let path = self.resolve_primary(key).await?;
        let (mut file, len) = open_object(&path).await?;
        let size_hint = usize::try_from(len).unwrap_or(0);
        let data =
            transfer::read_to_end(&mut file, size_hint, self.config.chunk_size, cancel).await?;
        Ok(Bytes::from(data))
    }

    /// Replace the content of an existing key in place.
    ///
    /// The file keeps its current name: for ids, no new extension is
    /// inferred. When an id resolves to several files, the first in
    /// tie-break order is replaced.
    #[tracing::instrument(
        name = "blobstore.update",
        skip(self, key, payload, cancel),
        fields(key = %key, declared_len = payload.reported_len(), bytes = tracing::field::Empty)
    )]
    pub async fn update(
        &self,
        key: &S::Key,
        payload: ContentPayload,
        cancel: &CancellationToken,
    ) -> OperationResult<StoredObject> {
        let outcome = self.try_update(key, payload, cancel).await;
        self.finish("update", outcome, |object| {
            format!("updated {} ({} bytes)", object.key, object.size_bytes)
        })
    }

    async fn try_update(
        &self,
        key: &S::Key,
        payload: ContentPayload,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, StoreError> {
        check_cancelled(cancel)?;
        self.ensure_writable()?;
        let path = self.resolve_primary(key).await?;

        let (mut reader, declared_len) = payload.into_parts();
        let mut staged = StagingFile::create(&self.config.staging_dir()).await?;
        let written = async {
            staged
                .write_from(&mut reader, self.config.chunk_size, cancel)
                .await?;
            check_declared_len(declared_len, staged.bytes_written())
        }
        .await;
        if let Err(e) = written {
            staged.abandon().await;
            return Err(e);
        }

        let size_bytes = staged.publish_replace(&path).await?;
        tracing::Span::current().record("bytes", size_bytes);

        let file_name = file_name_of(&path);
        let extension = if self.strategy.infers_extension() {
            file_name
                .split_once('.')
                .map(|(_, ext)| ext.to_string())
                .unwrap_or_default()
        } else {
            String::new()
        };

        Ok(StoredObject {
            key: key.to_string(),
            file_name,
            extension,
            size_bytes,
            path,
        })
    }

    /// Remove every file the key resolves to. Payload: number of files removed.
    #[tracing::instrument(name = "blobstore.delete", skip(self, key, cancel), fields(key = %key))]
    pub async fn delete(&self, key: &S::Key, cancel: &CancellationToken) -> OperationResult<usize> {
        let outcome = self.try_delete(key, cancel).await;
        self.finish("delete", outcome, |removed| match *removed {
            1 => format!("deleted {}", key),
            n => format!("deleted {} ({} files)", key, n),
        })
    }

    async fn try_delete(&self, key: &S::Key, cancel: &CancellationToken) -> Result<usize, StoreError> {
        check_cancelled(cancel)?;
        self.ensure_writable()?;

        let resolution = self.resolve(key).await?;
        if resolution.is_empty() {
            return Err(StoreError::not_found(key));
        }

        let mut removed = 0;
        for path in resolution.all() {
            check_cancelled(cancel)?;
            match tokio::fs::remove_file(path).await {
                Ok(()) => removed += 1,
                // Lost a race with another delete
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StoreError::io(
                        format!("failed to delete {}", path.display()),
                        e,
                    ))
                }
            }
        }

        if removed == 0 {
            return Err(StoreError::not_found(key));
        }
        Ok(removed)
    }

    /// Stream the object through BLAKE3 and return the lowercase hex digest.
    #[tracing::instrument(name = "blobstore.get_hash", skip(self, key, cancel), fields(key = %key))]
    pub async fn get_hash(
        &self,
        key: &S::Key,
        cancel: &CancellationToken,
    ) -> OperationResult<ContentDigest> {
        let outcome = self.try_get_hash(key, cancel).await;
        self.finish("get_hash", outcome, |digest| format!("hashed {}: {}", key, digest))
    }

    async fn try_get_hash(
        &self,
        key: &S::Key,
        cancel: &CancellationToken,
    ) -> Result<ContentDigest, StoreError> {
        check_cancelled(cancel)?;
        let path = self.resolve_primary(key).await?;
        let (mut file, _) = open_object(&path).await?;
        hash::hash_reader(&mut file, self.config.chunk_size, cancel).await
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        outcome: Result<T, StoreError>,
        message: impl FnOnce(&T) -> String,
    ) -> OperationResult<T> {
        match &outcome {
            Err(StoreError::NotFound(_)) => debug!(operation, "key not found"),
            Err(StoreError::Cancelled) => debug!(operation, "cancelled"),
            Err(e) => warn!(operation, error = %e, "operation failed"),
            Ok(_) => {}
        }
        OperationResult::from_outcome(outcome, message)
    }
}

impl FileStore<IdKeys> {
    /// Store content under a freshly generated id.
    pub async fn store_new(
        &self,
        payload: ContentPayload,
        cancel: &CancellationToken,
    ) -> OperationResult<StoredObject> {
        let id = ObjectId::generate();
        self.store(&id, payload, cancel).await
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), StoreError> {
    if cancel.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}

fn check_declared_len(declared: Option<u64>, actual: u64) -> Result<(), StoreError> {
    match declared {
        Some(expected) if expected != actual => Err(StoreError::InvalidInput(format!(
            "payload declared {} bytes but delivered {}",
            expected, actual
        ))),
        _ => Ok(()),
    }
}

async fn open_object(path: &Path) -> Result<(File, u64), StoreError> {
    let file = File::open(path)
        .await
        .map_err(|e| StoreError::io(format!("failed to open {}", path.display()), e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| StoreError::io(format!("failed to stat {}", path.display()), e))?
        .len();
    Ok((file, len))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ObjectName;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1A\n\x00\x00\x00\rIHDR";

    fn name(s: &str) -> ObjectName {
        ObjectName::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_store_and_get_bytes() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();

        let data = b"Hello, World!";
        let stored = store
            .store(&name("hello"), ContentPayload::from_bytes(&data[..]), &cancel)
            .await
            .into_result()?;
        assert_eq!(stored.file_name, "hello");
        assert_eq!(stored.size_bytes, 13);
        assert!(stored.extension.is_empty());

        let bytes = store.get_bytes(&name("hello"), &cancel).await.into_result()?;
        assert_eq!(&bytes[..], data);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_new_infers_extension() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = IdStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();

        let stored = store
            .store_new(ContentPayload::from_bytes(PNG_HEADER), &cancel)
            .await
            .into_result()?;
        assert_eq!(stored.extension, "png");
        assert!(stored.file_name.ends_with(".png"));
        assert!(temp_dir.path().join(&stored.file_name).exists());

        let id: ObjectId = stored.key.parse()?;
        let bytes = store.get_bytes(&id, &cancel).await.into_result()?;
        assert_eq!(&bytes[..], PNG_HEADER);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_existing_key_fails() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();

        store
            .store(&name("once"), ContentPayload::from_bytes(&b"first"[..]), &cancel)
            .await
            .into_result()?;
        let second = store
            .store(&name("once"), ContentPayload::from_bytes(&b"second"[..]), &cancel)
            .await;
        assert!(!second.is_success());
        assert_eq!(second.errors()[0].io_kind(), Some(io::ErrorKind::AlreadyExists));

        let bytes = store.get_bytes(&name("once"), &cancel).await.into_result()?;
        assert_eq!(&bytes[..], b"first");
        Ok(())
    }

    #[tokio::test]
    async fn test_store_existing_id_fails_across_extensions() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = IdStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();
        let id = ObjectId::generate();

        let first = store
            .store(&id, ContentPayload::from_bytes(&b"plain text content"[..]), &cancel)
            .await
            .into_result()?;
        assert_eq!(first.extension, "txt");

        // Would land at <id>.png, but the id is already taken by <id>.txt
        let second = store
            .store(&id, ContentPayload::from_bytes(PNG_HEADER), &cancel)
            .await;
        assert!(!second.is_success());
        assert_eq!(second.errors()[0].io_kind(), Some(io::ErrorKind::AlreadyExists));

        let resolution = IdKeys.resolve(temp_dir.path(), &id).await?;
        assert_eq!(resolution.len(), 1);
        assert_eq!(
            resolution.primary(),
            Some(temp_dir.path().join(format!("{}.txt", id)).as_path())
        );
        assert_eq!(std::fs::read_dir(store.config().staging_dir())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = IdStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();

        let stored = store
            .store_new(ContentPayload::from_bytes(&b"plain text content"[..]), &cancel)
            .await
            .into_result()?;
        assert_eq!(stored.extension, "txt");
        let id: ObjectId = stored.key.parse()?;

        // Binary content keeps the .txt name: no re-detection on update
        let updated = store
            .update(&id, ContentPayload::from_bytes(PNG_HEADER), &cancel)
            .await
            .into_result()?;
        assert_eq!(updated.file_name, stored.file_name);
        assert_eq!(updated.extension, "txt");
        assert_eq!(updated.size_bytes, PNG_HEADER.len() as u64);

        let bytes = store.get_bytes(&id, &cancel).await.into_result()?;
        assert_eq!(&bytes[..], PNG_HEADER);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_key() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;

        let result = store
            .update(
                &name("ghost"),
                ContentPayload::from_bytes(&b"boo"[..]),
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_not_found());
        assert!(!temp_dir.path().join("ghost").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_streams_content() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();

        let data = vec![7u8; 200_000];
        store
            .store(&name("big.bin"), ContentPayload::from_bytes(data.clone()), &cancel)
            .await
            .into_result()?;

        let mut stream = store.get(&name("big.bin"), &cancel).await.into_result()?;
        assert_eq!(stream.len(), 200_000);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await?;
        assert_eq!(out, data);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_every_match() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = IdStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();
        let id = ObjectId::generate();

        // Strays left by an external tool
        std::fs::write(temp_dir.path().join(format!("{}.txt", id)), b"a")?;
        std::fs::write(temp_dir.path().join(format!("{}.bin", id)), b"b")?;

        let removed = store.delete(&id, &cancel).await.into_result()?;
        assert_eq!(removed, 2);
        assert!(store.delete(&id, &cancel).await.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_ambiguous_id_reads_first_by_name() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = IdStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();
        let id = ObjectId::generate();

        std::fs::write(temp_dir.path().join(format!("{}.txt", id)), b"from txt")?;
        std::fs::write(temp_dir.path().join(format!("{}.bin", id)), b"from bin")?;

        let bytes = store.get_bytes(&id, &cancel).await.into_result()?;
        assert_eq!(&bytes[..], b"from bin");
        Ok(())
    }

    #[tokio::test]
    async fn test_hash_matches_in_memory_digest() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::new(StoreConfig::with_base_path(temp_dir.path()).with_chunk_size(5))?;
        let cancel = CancellationToken::new();

        let data = b"hash me in five byte chunks";
        store
            .store(&name("h"), ContentPayload::from_bytes(&data[..]), &cancel)
            .await
            .into_result()?;

        let digest = store.get_hash(&name("h"), &cancel).await.into_result()?;
        assert_eq!(digest, ContentDigest::from_data(data));
        Ok(())
    }

    #[tokio::test]
    async fn test_declared_length_mismatch() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;

        let payload = ContentPayload::new(io::Cursor::new(b"four".to_vec()), Some(10));
        let result = store
            .store(&name("short"), payload, &CancellationToken::new())
            .await;
        assert!(matches!(result.errors()[0], StoreError::InvalidInput(_)));
        assert!(!temp_dir.path().join("short").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_length_is_accepted() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = NamedStore::at_path(temp_dir.path())?;

        let payload = ContentPayload::new(io::Cursor::new(b"unsized".to_vec()), None);
        let stored = store
            .store(&name("unsized"), payload, &CancellationToken::new())
            .await
            .into_result()?;
        assert_eq!(stored.size_bytes, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_only_prevents_writes() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let writable = NamedStore::at_path(temp_dir.path())?;
        let cancel = CancellationToken::new();
        writable
            .store(&name("kept"), ContentPayload::from_bytes(&b"readable"[..]), &cancel)
            .await
            .into_result()?;

        let readonly = NamedStore::read_only_at(temp_dir.path())?;
        let result = readonly
            .store(&name("new"), ContentPayload::from_bytes(&b"x"[..]), &cancel)
            .await;
        assert!(matches!(result.errors()[0], StoreError::ReadOnly));
        assert!(readonly.delete(&name("kept"), &cancel).await.errors()[0]
            .to_string()
            .contains("read-only"));

        let bytes = readonly.get_bytes(&name("kept"), &cancel).await.into_result()?;
        assert_eq!(&bytes[..], b"readable");
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::with_base_path(temp_dir.path()).with_chunk_size(0);
        assert!(NamedStore::new(config).is_err());
    }

    #[tokio::test]
    async fn test_concurrent_readers() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(NamedStore::at_path(temp_dir.path())?);
        let cancel = CancellationToken::new();
        store
            .store(&name("shared"), ContentPayload::from_bytes(&b"shared data"[..]), &cancel)
            .await
            .into_result()?;

        let mut handles = vec![];
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .get_bytes(&name("shared"), &CancellationToken::new())
                    .await
                    .into_result()
            }));
        }
        for handle in handles {
            assert_eq!(&handle.await??[..], b"shared data");
        }
        Ok(())
    }
}
