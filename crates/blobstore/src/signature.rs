//! Content type inference from leading bytes.
//!
//! The table is ordered: the first rule whose pattern prefixes the header
//! wins. Several formats share a container signature (docx/xlsx/pptx are all
//! zip archives, xls shares the OLE header with doc), so detection reports
//! the first registered extension for those. Telling them apart would need
//! inspecting the container contents, which this module does not do.
//!
//! The plain-text rule has no byte pattern. It is checked only after every
//! byte-pattern rule has failed, so a binary format whose magic bytes happen
//! to be printable (`%PDF-`, `{\rtf`) is never reported as text.

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::transfer::read_chunk;

/// Maximum number of leading bytes inspected.
pub const HEADER_WINDOW: usize = 256;

/// Headers shorter than this are never classified.
pub const MIN_HEADER_LEN: usize = 8;

/// Association between byte prefixes and a file extension (without the dot).
#[derive(Debug)]
pub struct SignatureRule {
    pub extension: &'static str,
    /// Alternative prefixes; empty for the plain-text heuristic.
    pub patterns: &'static [&'static [u8]],
}

impl SignatureRule {
    pub fn is_text_heuristic(&self) -> bool {
        self.patterns.is_empty()
    }

    fn matches_prefix(&self, header: &[u8]) -> bool {
        self.patterns.iter().any(|p| header.starts_with(p))
    }
}

const ZIP: &[&[u8]] = &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];
const OLE: &[&[u8]] = &[b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1"];

/// Signature table in priority order.
pub static SIGNATURES: &[SignatureRule] = &[
    SignatureRule { extension: "png", patterns: &[b"\x89PNG\r\n\x1A\n"] },
    SignatureRule { extension: "jpg", patterns: &[b"\xFF\xD8\xFF"] },
    SignatureRule { extension: "gif", patterns: &[b"GIF87a", b"GIF89a"] },
    SignatureRule { extension: "tif", patterns: &[b"II*\x00", b"MM\x00*"] },
    SignatureRule { extension: "ico", patterns: &[b"\x00\x00\x01\x00"] },
    SignatureRule { extension: "pdf", patterns: &[b"%PDF-"] },
    SignatureRule { extension: "zip", patterns: ZIP },
    SignatureRule { extension: "docx", patterns: ZIP },
    SignatureRule { extension: "xlsx", patterns: ZIP },
    SignatureRule { extension: "pptx", patterns: ZIP },
    SignatureRule { extension: "doc", patterns: OLE },
    SignatureRule { extension: "xls", patterns: OLE },
    SignatureRule { extension: "rar", patterns: &[b"Rar!\x1A\x07"] },
    SignatureRule { extension: "7z", patterns: &[b"7z\xBC\xAF\x27\x1C"] },
    SignatureRule { extension: "gz", patterns: &[b"\x1F\x8B\x08"] },
    SignatureRule { extension: "wav", patterns: &[b"RIFF"] },
    SignatureRule { extension: "mp3", patterns: &[b"ID3", b"\xFF\xFB", b"\xFF\xF3", b"\xFF\xF2"] },
    SignatureRule { extension: "ogg", patterns: &[b"OggS"] },
    SignatureRule { extension: "flac", patterns: &[b"fLaC"] },
    SignatureRule { extension: "mid", patterns: &[b"MThd"] },
    SignatureRule { extension: "mkv", patterns: &[b"\x1A\x45\xDF\xA3"] },
    SignatureRule { extension: "rtf", patterns: &[b"{\\rtf"] },
    SignatureRule { extension: "xml", patterns: &[b"<?xml"] },
    SignatureRule { extension: "txt", patterns: &[] },
];

/// Infer an extension from a content header. Returns `""` when unknown.
pub fn detect_extension(header: &[u8]) -> &'static str {
    if header.len() < MIN_HEADER_LEN {
        return "";
    }
    let header = &header[..header.len().min(HEADER_WINDOW)];

    if let Some(rule) = SIGNATURES
        .iter()
        .filter(|r| !r.is_text_heuristic())
        .find(|r| r.matches_prefix(header))
    {
        return rule.extension;
    }

    SIGNATURES
        .iter()
        .find(|r| r.is_text_heuristic() && looks_like_text(header))
        .map(|r| r.extension)
        .unwrap_or("")
}

/// True when every byte is tab, LF, CR or printable ASCII.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| matches!(b, b'\t' | b'\n' | b'\r' | 0x20..=0x7E))
}

/// Read up to [`HEADER_WINDOW`] bytes from the start of a stream.
///
/// Fewer bytes are returned only when the stream ends first. The caller owns
/// the returned bytes and must write them ahead of the rest of the stream.
pub async fn read_header<R>(
    reader: &mut R,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, StoreError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = vec![0u8; HEADER_WINDOW];
    let mut filled = 0;

    while filled < HEADER_WINDOW {
        let n = read_chunk(
            reader,
            &mut header[filled..],
            cancel,
            "failed to read content header",
        )
        .await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    header.truncate(filled);
    Ok(header)
}
