//! Document-store adapter.
//!
//! # Responsibility
//! - Provide a small JSON document store with per-collection id sequences.
//! - Implement the repository contracts on top of it, mapping entities to
//!   documents with embedded value objects and `$ref` links.
//!
//! # Invariants
//! - Writes are all-or-nothing: a failed write leaves both the in-memory
//!   state and the backing file untouched.
//! - Sequence values are never reused, even after deletes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod department_repo;
mod staff_repo;
mod store;

pub use department_repo::DocumentDepartmentRepository;
pub use staff_repo::DocumentStaffRepository;
pub use store::{
    open_document_store, open_document_store_in_memory, DocumentSet, DocumentStore,
    FORMAT_VERSION,
};

use crate::repo::error::{RepoError, RepoResult};

pub(crate) const STAFF_COLLECTION: &str = "staff";
pub(crate) const DEPARTMENT_COLLECTION: &str = "department";
pub(crate) const COURSE_SEQUENCE: &str = "course";

pub type DocResult<T> = Result<T, DocumentError>;

#[derive(Debug)]
pub enum DocumentError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    UnsupportedFormatVersion {
        file_version: u32,
        latest_supported: u32,
    },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "document store `{}`: {source}", path.display()),
            Self::Json(err) => write!(f, "document store encoding: {err}"),
            Self::UnsupportedFormatVersion {
                file_version,
                latest_supported,
            } => write!(
                f,
                "document store format version {file_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::UnsupportedFormatVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Reference from one document to another, stored as
/// `{"$ref": <collection>, "$id": <id>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "$ref")]
    pub collection: String,
    #[serde(rename = "$id")]
    pub id: i64,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: i64) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }
}

fn encode<T: Serialize>(document: &T) -> DocResult<JsonValue> {
    Ok(serde_json::to_value(document)?)
}

fn decode<T: DeserializeOwned>(collection: &str, id: i64, value: &JsonValue) -> RepoResult<T> {
    T::deserialize(value).map_err(|err| {
        RepoError::InvalidData(format!("malformed `{collection}` document {id}: {err}"))
    })
}
