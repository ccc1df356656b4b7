//! JSON document store with optional file persistence.
//!
//! # Invariants
//! - Every write runs against a working copy; the copy replaces the live
//!   state only after it has been flushed.
//! - File flushes go through a synced sibling `.tmp` file and a rename.
//! - Files written by a newer format version are rejected on open.

use super::{DocResult, DocumentError};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Latest on-disk format understood by this binary.
pub const FORMAT_VERSION: u32 = 1;

/// Complete store contents: id sequences plus documents keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSet {
    format_version: u32,
    #[serde(default)]
    sequences: BTreeMap<String, i64>,
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<i64, JsonValue>>,
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            sequences: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }
}

impl DocumentSet {
    /// Advances and returns the sequence for `name`. The first value is 1.
    pub fn next_id(&mut self, name: &str) -> i64 {
        let value = self.sequences.entry(name.to_string()).or_insert(0);
        *value += 1;
        *value
    }

    pub fn get(&self, collection: &str, id: i64) -> Option<&JsonValue> {
        self.collections.get(collection)?.get(&id)
    }

    pub fn contains(&self, collection: &str, id: i64) -> bool {
        self.get(collection, id).is_some()
    }

    /// Stores `document` under `id`, replacing any previous version.
    pub fn put(&mut self, collection: &str, id: i64, document: JsonValue) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, document);
    }

    pub fn remove(&mut self, collection: &str, id: i64) -> Option<JsonValue> {
        self.collections.get_mut(collection)?.remove(&id)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Iterates a collection in ascending id order.
    pub fn documents<'a>(
        &'a self,
        collection: &str,
    ) -> impl Iterator<Item = (i64, &'a JsonValue)> + 'a {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|documents| documents.iter().map(|(id, document)| (*id, document)))
    }

    /// Returns documents whose value at the dotted `field_path` equals
    /// `expected` exactly, in ascending id order.
    ///
    /// `member.lastName` addresses `{"member": {"lastName": ..}}`.
    pub fn find_eq<'a>(
        &'a self,
        collection: &str,
        field_path: &str,
        expected: &JsonValue,
    ) -> Vec<(i64, &'a JsonValue)> {
        let pointer = json_pointer(field_path);
        self.documents(collection)
            .filter(|(_, document)| document.pointer(&pointer) == Some(expected))
            .collect()
    }
}

fn json_pointer(field_path: &str) -> String {
    field_path
        .split('.')
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Document store handle. Single-threaded; writes need only `&self`.
#[derive(Debug)]
pub struct DocumentStore {
    location: Option<PathBuf>,
    state: RefCell<DocumentSet>,
}

impl DocumentStore {
    /// Backing file, or `None` for an in-memory store.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Runs a read-only closure against the live state.
    pub fn read<T>(&self, f: impl FnOnce(&DocumentSet) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Runs `f` against a working copy and commits it when `f` succeeds.
    ///
    /// File-backed stores flush before the live state is replaced, so a
    /// failed flush leaves nothing half-applied.
    pub fn write<T, E>(&self, f: impl FnOnce(&mut DocumentSet) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DocumentError>,
    {
        let mut working = self.state.borrow().clone();
        let output = f(&mut working)?;
        if let Some(path) = &self.location {
            flush(path, &working)?;
        }
        *self.state.borrow_mut() = working;
        Ok(output)
    }
}

/// Opens (or creates) a file-backed document store.
///
/// # Side effects
/// - Creates the file with an empty document set when it does not exist.
/// - Emits `doc_store_open` events with duration and status.
pub fn open_document_store(path: impl AsRef<Path>) -> DocResult<DocumentStore> {
    let path = path.as_ref().to_path_buf();
    let started_at = Instant::now();
    info!("event=doc_store_open module=doc status=start mode=file");

    match load_or_create(&path) {
        Ok(state) => {
            info!(
                "event=doc_store_open module=doc status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(DocumentStore {
                location: Some(path),
                state: RefCell::new(state),
            })
        }
        Err(err) => {
            error!(
                "event=doc_store_open module=doc status=error mode=file duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

/// Opens an empty store that lives only as long as the handle.
pub fn open_document_store_in_memory() -> DocumentStore {
    info!("event=doc_store_open module=doc status=ok mode=memory duration_ms=0");
    DocumentStore {
        location: None,
        state: RefCell::new(DocumentSet::default()),
    }
}

fn load_or_create(path: &Path) -> DocResult<DocumentSet> {
    if !path.exists() {
        let state = DocumentSet::default();
        flush(path, &state)?;
        return Ok(state);
    }

    let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state: DocumentSet = serde_json::from_slice(&bytes)?;
    if state.format_version > FORMAT_VERSION {
        return Err(DocumentError::UnsupportedFormatVersion {
            file_version: state.format_version,
            latest_supported: FORMAT_VERSION,
        });
    }
    Ok(DocumentSet {
        format_version: FORMAT_VERSION,
        ..state
    })
}

fn flush(path: &Path, state: &DocumentSet) -> DocResult<()> {
    let bytes = serde_json::to_vec_pretty(state)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    write_synced(&tmp_path, &bytes).map_err(|source| DocumentError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `bytes` and waits for them to reach the disk, so the rename that
/// follows never exposes a partial file.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
