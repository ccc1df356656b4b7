//! University domain model and its persistence layer.
//!
//! Entities are stored through one pair of repository traits backed by
//! either a relational (SQLite) or a document (JSON) adapter, chosen when
//! the [`Storage`] is opened.

pub mod config;
pub mod db;
pub mod doc;
pub mod logging;
pub mod model;
pub mod repo;
pub mod storage;

pub use config::{ConfigError, StorageBackend, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::Course;
pub use model::department::Department;
pub use model::person::Person;
pub use model::staff::Staff;
pub use model::{CourseId, DepartmentId, StaffId, ValidationError};
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::staff_repo::{
    SortDirection, SqliteStaffRepository, StaffPageQuery, StaffRepository, StaffSort,
};
pub use repo::{EntityRef, ErrorCategory, RepoError, RepoResult};
pub use storage::Storage;

/// Minimal health-check API for smoke checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
