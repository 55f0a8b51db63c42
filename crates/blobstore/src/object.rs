//! Values that flow in and out of the store: payloads going in, stored
//! object descriptions and open content streams coming out.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

/// A readable byte stream paired with its declared length.
///
/// When the length is known the store verifies that the stream delivered
/// exactly that many bytes. An unknown length reports as zero.
pub struct ContentPayload {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    declared_len: Option<u64>,
}

impl ContentPayload {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, declared_len: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            declared_len,
        }
    }

    /// Payload over an in-memory buffer; the length is exact.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len() as u64;
        Self::new(io::Cursor::new(data), Some(len))
    }

    /// Payload streaming from a file on disk.
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref()).await?;
        let len = file.metadata().await?.len();
        Ok(Self::new(file, Some(len)))
    }

    pub fn declared_len(&self) -> Option<u64> {
        self.declared_len
    }

    /// Declared length, or 0 when unknown.
    pub fn reported_len(&self) -> u64 {
        self.declared_len.unwrap_or(0)
    }

    pub(crate) fn into_parts(self) -> (Box<dyn AsyncRead + Send + Unpin>, Option<u64>) {
        (self.reader, self.declared_len)
    }
}

impl fmt::Debug for ContentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentPayload")
            .field("declared_len", &self.declared_len)
            .finish_non_exhaustive()
    }
}

/// Description of a file the store wrote.
///
/// Returned as the confirmation payload of `store` and `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// The key as the caller addresses it.
    pub key: String,

    /// File name inside the store directory.
    pub file_name: String,

    /// Inferred extension without the dot; empty when none was inferred
    /// or when the key is a caller-supplied name.
    pub extension: String,

    /// Bytes written.
    pub size_bytes: u64,

    /// Full path to the file.
    pub path: PathBuf,
}

/// An open stored object, returned by `get`.
///
/// Reads go straight to the file, so large objects are never buffered.
/// Dropping the stream closes the file.
#[derive(Debug)]
pub struct ContentStream {
    file: File,
    len: u64,
    path: PathBuf,
}

impl ContentStream {
    pub(crate) fn new(file: File, len: u64, path: PathBuf) -> Self {
        Self { file, len, path }
    }

    /// Content length in bytes at the time the file was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_file(self) -> File {
        self.file
    }
}

impl AsyncRead for ContentStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}
