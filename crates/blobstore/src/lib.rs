//! Key-addressed blob storage backed by a filesystem directory.
//!
//! Content is stored, read, replaced, deleted and hashed by key. Keys are
//! either generated ids (the file extension is inferred from the content's
//! leading bytes) or caller-supplied names used verbatim as file names.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use blobstore::{ContentPayload, IdStore, ObjectId, StoreConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! // Create from environment (reads BLOBSTORE_PATH)
//! let store = IdStore::new(StoreConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//!
//! // Store content under a fresh id
//! let stored = store
//!     .store_new(ContentPayload::from_bytes(&b"Hello, World!"[..]), &cancel)
//!     .await
//!     .into_result()?;
//! println!("Stored as: {}", stored.file_name); // <id>.txt
//!
//! // Every operation returns an OperationResult
//! let id: ObjectId = stored.key.parse()?;
//! let result = store.get_hash(&id, &cancel).await;
//! if result.is_success() {
//!     println!("digest: {}", result.payload().unwrap());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Operations are independent futures; the store holds no locks. Writes go
//! through a staging file and are published with a single link or rename,
//! so readers never observe partial content. Two writers creating the same
//! key race for an exclusive per-key claim: one wins, the other gets an
//! `AlreadyExists` I/O error, even when their content would infer different
//! extensions.

pub mod config;
pub mod error;
pub mod hash;
pub mod key;
pub mod object;
pub mod resolver;
pub mod result;
pub mod signature;
pub mod staging;
pub mod store;
mod transfer;

// Re-exports for convenience
pub use config::StoreConfig;
pub use error::{ErrorKind, StoreError};
pub use hash::{ContentDigest, HashError};
pub use key::{ContentKey, KeyError, ObjectId, ObjectName};
pub use object::{ContentPayload, ContentStream, StoredObject};
pub use resolver::{IdKeys, KeyStrategy, NamedKeys, Resolution};
pub use result::OperationResult;
pub use store::{FileStore, IdStore, NamedStore};
