//! University domain model.
//!
//! # Responsibility
//! - Define the entities and value objects persisted by the storage adapters.
//! - Keep identity assignment out of application code.
//!
//! # Invariants
//! - Entity ids are `None` until a storage adapter persists the entity.
//! - `Person` has no identity and only exists embedded in `Staff`.
//! - `Department` owns its courses and only refers to its chair.

pub mod course;
pub mod department;
pub mod person;
pub mod staff;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier generated for persisted `Staff` records.
pub type StaffId = i64;
/// Identifier generated for persisted `Department` records.
pub type DepartmentId = i64;
/// Identifier generated for persisted `Course` records.
pub type CourseId = i64;

/// Write-time rejection raised by repositories before touching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Department chair has never been saved, so it has no id to reference.
    UnsavedChair,
    /// Department chair points at a staff id that is not stored.
    UnknownChair(StaffId),
    /// Staff member cannot be removed while chairing a department.
    ChairInUse {
        staff_id: StaffId,
        department_id: DepartmentId,
    },
    /// Course id is already stored under another department.
    CourseOwnedElsewhere {
        course_id: CourseId,
        department_id: DepartmentId,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsavedChair => write!(f, "department chair must be saved before the department"),
            Self::UnknownChair(id) => write!(f, "department chair references unknown staff {id}"),
            Self::ChairInUse {
                staff_id,
                department_id,
            } => write!(
                f,
                "staff {staff_id} is the chair of department {department_id}"
            ),
            Self::CourseOwnedElsewhere {
                course_id,
                department_id,
            } => write!(
                f,
                "course {course_id} belongs to department {department_id}"
            ),
        }
    }
}

impl Error for ValidationError {}
