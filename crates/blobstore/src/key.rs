//! Keys: how callers address stored content.
//!
//! Two flavours exist:
//! - [`ObjectId`]: generated by the store, 32 hex chars. The on-disk name is
//!   `<id>.<extension>` where the extension is inferred from the content.
//! - [`ObjectName`]: chosen by the caller and used verbatim as the file name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Longest file name most filesystems accept.
const MAX_NAME_LEN: usize = 255;

/// Errors that can occur when parsing keys.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid id length: expected 32 hex chars, got {0}")]
    InvalidIdLength(usize),

    #[error("invalid hex character in id")]
    InvalidHex,

    #[error("name must not be empty")]
    EmptyName,

    #[error("name is longer than 255 bytes")]
    NameTooLong,

    #[error("name {0:?} is not a plain file name")]
    InvalidName(String),
}

/// A generated opaque identifier - 128 random bits as 32 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing id string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, KeyError> {
        if s.len() != 32 {
            return Err(KeyError::InvalidIdLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(KeyError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str_checked(&s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// A caller-supplied name, used verbatim as a single path segment.
///
/// Names that could escape the store directory or collide with the
/// staging area are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName(String);

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Result<Self, KeyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(KeyError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(KeyError::NameTooLong);
        }
        // Leading dot also covers "." and ".."
        if name.starts_with('.') || name.contains(['/', '\\', '\0']) {
            return Err(KeyError::InvalidName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectName {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectName {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.0
    }
}

/// Either kind of key.
///
/// Parses from `id:<hex>` or `name:<name>`; a string without a prefix is
/// taken as a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKey {
    /// Generated id, extension inferred from content.
    Id(ObjectId),
    /// Caller-supplied file name.
    Name(ObjectName),
}

impl ContentKey {
    pub fn is_id(&self) -> bool {
        matches!(self, ContentKey::Id(_))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, ContentKey::Name(_))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKey::Id(id) => write!(f, "id:{}", id),
            ContentKey::Name(name) => write!(f, "name:{}", name),
        }
    }
}

impl FromStr for ContentKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("id:") {
            Ok(ContentKey::Id(id.parse()?))
        } else {
            let name = s.strip_prefix("name:").unwrap_or(s);
            Ok(ContentKey::Name(name.parse()?))
        }
    }
}

impl From<ObjectId> for ContentKey {
    fn from(id: ObjectId) -> Self {
        ContentKey::Id(id)
    }
}

impl From<ObjectName> for ContentKey {
    fn from(name: ObjectName) -> Self {
        ContentKey::Name(name)
    }
}
