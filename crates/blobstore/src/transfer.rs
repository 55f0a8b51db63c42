//! Chunked stream copies that stop at the first chunk boundary after
//! cancellation.
//!
//! Each read is raced against the token, so a source that stalls does not
//! hold the operation hostage.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Read one chunk, or fail with `Cancelled` if the token fires first.
pub(crate) async fn read_chunk<R>(
    reader: &mut R,
    buf: &mut [u8],
    cancel: &CancellationToken,
    context: &str,
) -> Result<usize, StoreError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        read = reader.read(buf) => read.map_err(|e| StoreError::io(context, e)),
    }
}

/// Copy `reader` into `writer`, returning the number of bytes moved.
pub(crate) async fn copy<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, StoreError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let n = read_chunk(reader, &mut buf, cancel, "failed to read payload").await?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| StoreError::io("failed to write object", e))?;
        total += n as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| StoreError::io("failed to flush object", e))?;
    Ok(total)
}

/// Read `reader` to the end into memory.
pub(crate) async fn read_to_end<R>(
    reader: &mut R,
    size_hint: usize,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, StoreError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut out = Vec::with_capacity(size_hint);
    let mut buf = vec![0u8; chunk_size];

    loop {
        let n = read_chunk(reader, &mut buf, cancel, "failed to read object").await?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }

    Ok(out)
}
