//! Course entity, owned by exactly one `Department`.

use crate::model::CourseId;

/// A course offered by a department.
///
/// Courses are only persisted through their owning department; the id is
/// assigned when that department is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: Option<CourseId>,
    name: String,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub(crate) fn with_id(id: CourseId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Option<CourseId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn assign_id(&mut self, id: CourseId) {
        self.id = Some(id);
    }
}
