//! Storage selection.
//!
//! # Responsibility
//! - Open the adapter named by a [`StorageConfig`].
//! - Hand out repository trait objects bound to the open storage.
//!
//! # Invariants
//! - Callers only see `StaffRepository` / `DepartmentRepository`; which
//!   adapter sits behind them is fixed when the storage is opened.

use crate::config::{StorageBackend, StorageConfig};
use crate::db::{open_db, open_db_in_memory};
use crate::doc::{
    open_document_store, open_document_store_in_memory, DocumentDepartmentRepository,
    DocumentStaffRepository, DocumentStore,
};
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::error::RepoResult;
use crate::repo::staff_repo::{SqliteStaffRepository, StaffRepository};
use rusqlite::Connection;

/// An open storage engine of either kind.
pub enum Storage {
    Relational(Connection),
    Document(DocumentStore),
}

impl Storage {
    /// Opens the configured adapter, creating its backing file if needed.
    pub fn open(config: &StorageConfig) -> RepoResult<Self> {
        let storage = match (config.backend, config.data_path.as_deref()) {
            (StorageBackend::Relational, Some(path)) => Self::Relational(open_db(path)?),
            (StorageBackend::Relational, None) => Self::Relational(open_db_in_memory()?),
            (StorageBackend::Document, Some(path)) => Self::Document(open_document_store(path)?),
            (StorageBackend::Document, None) => Self::Document(open_document_store_in_memory()),
        };
        Ok(storage)
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Relational(_) => StorageBackend::Relational,
            Self::Document(_) => StorageBackend::Document,
        }
    }

    pub fn staff_repository(&self) -> Box<dyn StaffRepository + '_> {
        match self {
            Self::Relational(conn) => Box::new(SqliteStaffRepository::new(conn)),
            Self::Document(store) => Box::new(DocumentStaffRepository::new(store)),
        }
    }

    pub fn department_repository(&self) -> Box<dyn DepartmentRepository + '_> {
        match self {
            Self::Relational(conn) => Box::new(SqliteDepartmentRepository::new(conn)),
            Self::Document(store) => Box::new(DocumentDepartmentRepository::new(store)),
        }
    }
}
