//! Repository contracts and the relational (SQLite) implementations.
//!
//! # Responsibility
//! - Define one data-access contract per entity, shared by both storage
//!   adapters.
//! - Keep SQL details inside the relational adapter.
//!
//! # Invariants
//! - Entity ids are assigned by the adapter and written back only after the
//!   write commits.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to storage transport errors.
//!
//! The document-store implementations of the same traits live in
//! [`crate::doc`].

pub mod department_repo;
pub mod error;
pub mod staff_repo;

pub use error::{EntityRef, ErrorCategory, RepoError, RepoResult};
