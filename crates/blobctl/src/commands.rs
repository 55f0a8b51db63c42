//! CLI command implementations

use anyhow::{bail, Context, Result};
use blobstore::{
    ContentKey, ContentPayload, FileStore, IdStore, KeyStrategy, NamedStore, ObjectName,
    OperationResult, StoreConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Both key flavours over the same directory.
pub struct Stores {
    ids: IdStore,
    names: NamedStore,
}

impl Stores {
    pub fn open(config_file: Option<&Path>, dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => StoreConfig::from_file(path)?,
            None => StoreConfig::from_env()?,
        };
        if let Some(dir) = dir {
            config.base_path = dir;
        }
        tracing::debug!(path = %config.base_path.display(), "opening store");

        Ok(Self {
            ids: IdStore::new(config.clone())?,
            names: NamedStore::new(config)?,
        })
    }
}

/// Print the result envelope and turn a failed operation into an error.
fn report<T: Serialize>(result: &OperationResult<T>, to_stderr: bool) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    if to_stderr {
        eprintln!("{}", json);
    } else {
        println!("{}", json);
    }
    if result.is_success() {
        Ok(())
    } else {
        let reason = result
            .errors()
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "operation failed".to_string());
        bail!(reason)
    }
}

pub async fn put(
    stores: &Stores,
    file: &Path,
    name: Option<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let payload = ContentPayload::from_file(file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;

    let result = match name {
        Some(name) => {
            let name = ObjectName::new(name)?;
            stores.names.store(&name, payload, cancel).await
        }
        None => stores.ids.store_new(payload, cancel).await,
    };
    report(&result, false)
}

pub async fn get(
    stores: &Stores,
    key: &ContentKey,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    match key {
        ContentKey::Id(id) => get_with(&stores.ids, id, output, cancel).await,
        ContentKey::Name(name) => get_with(&stores.names, name, output, cancel).await,
    }
}

async fn get_with<S: KeyStrategy>(
    store: &FileStore<S>,
    key: &S::Key,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut opened = None;
    let result = store.get(key, cancel).await.map(|stream| {
        let len = stream.len();
        opened = Some(stream);
        len
    });

    // Content owns stdout unless an output file was given
    let to_stderr = output.is_none();
    if let Some(mut stream) = opened {
        let mut sink: Box<dyn AsyncWrite + Send + Unpin> = match output {
            Some(path) => Box::new(
                tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("failed to create {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdout()),
        };

        let copied = tokio::select! {
            biased;
            _ = cancel.cancelled() => bail!("cancelled while streaming {}", key),
            copied = tokio::io::copy(&mut stream, &mut sink) => copied?,
        };
        sink.flush().await?;
        tracing::debug!(bytes = copied, "streamed content");
    }
    report(&result, to_stderr)
}

pub async fn bytes(stores: &Stores, key: &ContentKey, cancel: &CancellationToken) -> Result<()> {
    let result = match key {
        ContentKey::Id(id) => stores.ids.get_bytes(id, cancel).await,
        ContentKey::Name(name) => stores.names.get_bytes(name, cancel).await,
    };
    report(&result.map(|data| data.len()), false)
}

pub async fn hash(stores: &Stores, key: &ContentKey, cancel: &CancellationToken) -> Result<()> {
    let result = match key {
        ContentKey::Id(id) => stores.ids.get_hash(id, cancel).await,
        ContentKey::Name(name) => stores.names.get_hash(name, cancel).await,
    };
    report(&result, false)
}

pub async fn exists(stores: &Stores, key: &ContentKey, cancel: &CancellationToken) -> Result<()> {
    let result = match key {
        ContentKey::Id(id) => stores.ids.exists(id, cancel).await,
        ContentKey::Name(name) => stores.names.exists(name, cancel).await,
    };
    report(&result, false)
}

pub async fn update(
    stores: &Stores,
    key: &ContentKey,
    file: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let payload = ContentPayload::from_file(file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;

    let result = match key {
        ContentKey::Id(id) => stores.ids.update(id, payload, cancel).await,
        ContentKey::Name(name) => stores.names.update(name, payload, cancel).await,
    };
    report(&result, false)
}

pub async fn rm(stores: &Stores, key: &ContentKey, cancel: &CancellationToken) -> Result<()> {
    let result = match key {
        ContentKey::Id(id) => stores.ids.delete(id, cancel).await,
        ContentKey::Name(name) => stores.names.delete(name, cancel).await,
    };
    report(&result, false)
}
