//! Key resolution: mapping a key to the file(s) that hold its content.
//!
//! A [`FileStore`](crate::store::FileStore) is generic over a
//! [`KeyStrategy`], which decides how keys become file names and how to find
//! them again:
//!
//! - [`NamedKeys`]: the key is the file name. One existence check.
//! - [`IdKeys`]: the file is `<id>.<ext>` with the extension inferred at
//!   store time, so lookup scans the directory for `<id>` and `<id>.*`.
//!   Several matches are possible (files placed there by other tools, or
//!   left from an older layout); they are ordered by file name, byte-wise
//!   ascending, and the first one is the one read and updated.

use async_trait::async_trait;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::STAGING_DIR_NAME;
use crate::key::{ObjectId, ObjectName};

/// Files a key resolved to, in tie-break order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    paths: Vec<PathBuf>,
}

impl Resolution {
    pub fn new(mut paths: Vec<PathBuf>) -> Self {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Self { paths }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// The file reads and updates operate on.
    pub fn primary(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// Every matching file; `delete` removes all of them.
    pub fn all(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

/// How a store turns keys into file names and back.
#[async_trait]
pub trait KeyStrategy: Send + Sync + 'static {
    type Key: Clone + Display + Send + Sync;

    /// Whether new content needs a signature-inferred extension.
    fn infers_extension(&self) -> bool;

    /// File name for new content under `key`.
    fn file_name(&self, key: &Self::Key, extension: &str) -> String;

    /// Locate the existing file(s) for `key` inside `dir`.
    async fn resolve(&self, dir: &Path, key: &Self::Key) -> io::Result<Resolution>;
}

/// Caller-named keys, used verbatim as file names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedKeys;

#[async_trait]
impl KeyStrategy for NamedKeys {
    type Key = ObjectName;

    fn infers_extension(&self) -> bool {
        false
    }

    fn file_name(&self, key: &ObjectName, _extension: &str) -> String {
        key.as_str().to_string()
    }

    async fn resolve(&self, dir: &Path, key: &ObjectName) -> io::Result<Resolution> {
        let path = dir.join(key.as_str());
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Resolution::new(vec![path])),
            Ok(_) => Ok(Resolution::none()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Resolution::none()),
            Err(e) => Err(e),
        }
    }
}

/// Generated ids whose files carry an inferred extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdKeys;

impl IdKeys {
    fn matches(id: &str, file_name: &str) -> bool {
        match file_name.strip_prefix(id) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

#[async_trait]
impl KeyStrategy for IdKeys {
    type Key = ObjectId;

    fn infers_extension(&self) -> bool {
        true
    }

    fn file_name(&self, key: &ObjectId, extension: &str) -> String {
        if extension.is_empty() {
            key.as_str().to_string()
        } else {
            format!("{}.{}", key, extension)
        }
    }

    async fn resolve(&self, dir: &Path, key: &ObjectId) -> io::Result<Resolution> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolution::none()),
            Err(e) => return Err(e),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == STAGING_DIR_NAME || !Self::matches(key.as_str(), name) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }

        if paths.len() > 1 {
            debug!(id = %key, matches = paths.len(), "id resolves to several files");
        }
        Ok(Resolution::new(paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id() -> ObjectId {
        "0123456789abcdef0123456789abcdef".parse().unwrap()
    }

    #[test]
    fn test_id_file_names() {
        assert_eq!(
            IdKeys.file_name(&id(), "png"),
            "0123456789abcdef0123456789abcdef.png"
        );
        assert_eq!(IdKeys.file_name(&id(), ""), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_named_file_name_ignores_extension() {
        let name = ObjectName::new("photo").unwrap();
        assert_eq!(NamedKeys.file_name(&name, "png"), "photo");
    }

    #[test]
    fn test_id_match_rules() {
        let id = "0123456789abcdef0123456789abcdef";
        assert!(IdKeys::matches(id, id));
        assert!(IdKeys::matches(id, &format!("{}.txt", id)));
        assert!(IdKeys::matches(id, &format!("{}.tar.gz", id)));
        assert!(!IdKeys::matches(id, &format!("{}0.txt", id)));
        assert!(!IdKeys::matches(id, "other.txt"));
    }

    #[tokio::test]
    async fn test_named_resolution() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let name = ObjectName::new("notes.md")?;

        assert!(NamedKeys.resolve(dir.path(), &name).await?.is_empty());

        std::fs::write(dir.path().join("notes.md"), b"# notes")?;
        let resolution = NamedKeys.resolve(dir.path(), &name).await?;
        assert_eq!(resolution.primary(), Some(dir.path().join("notes.md").as_path()));
        Ok(())
    }

    #[tokio::test]
    async fn test_named_resolution_ignores_directories() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("subdir"))?;
        let name = ObjectName::new("subdir")?;
        assert!(NamedKeys.resolve(dir.path(), &name).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_id_resolution_tie_break_is_lexicographic() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let id = id();
        for ext in ["txt", "png", "bin"] {
            std::fs::write(dir.path().join(format!("{}.{}", id, ext)), b"x")?;
        }
        std::fs::write(dir.path().join("ffffffffffffffffffffffffffffffff.png"), b"y")?;

        let resolution = IdKeys.resolve(dir.path(), &id).await?;
        assert_eq!(resolution.len(), 3);
        let names: Vec<_> = resolution
            .all()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                format!("{}.bin", id),
                format!("{}.png", id),
                format!("{}.txt", id)
            ]
        );
        assert_eq!(
            resolution.primary(),
            Some(dir.path().join(format!("{}.bin", id)).as_path())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_id_resolution_missing_dir() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("nope");
        assert!(IdKeys.resolve(&missing, &id()).await?.is_empty());
        Ok(())
    }
}
