//! Department entity.
//!
//! # Responsibility
//! - Hold the department name, its chair reference and its owned courses.
//!
//! # Invariants
//! - `courses` only grows, in `add_course` call order.
//! - The chair is a reference: dropping a department never drops its chair.

use crate::model::course::Course;
use crate::model::staff::Staff;
use crate::model::DepartmentId;
use std::fmt::{Display, Formatter};

/// A department of study at the university.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    id: Option<DepartmentId>,
    name: String,
    chair: Option<Staff>,
    courses: Vec<Course>,
}

impl Department {
    /// Creates an unsaved department with an empty course list.
    pub fn new(name: impl Into<String>, chair: Staff) -> Self {
        Self {
            id: None,
            name: name.into(),
            chair: Some(chair),
            courses: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        id: DepartmentId,
        name: String,
        chair: Option<Staff>,
        courses: Vec<Course>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            chair,
            courses,
        }
    }

    pub fn id(&self) -> Option<DepartmentId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn chair(&self) -> Option<&Staff> {
        self.chair.as_ref()
    }

    /// Replaces the chair reference. Passing `None` clears it.
    pub fn set_chair(&mut self, chair: Option<Staff>) {
        self.chair = chair;
    }

    /// Appends a course. Duplicates are kept.
    pub fn add_course(&mut self, course: Course) {
        self.courses.push(course);
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub(crate) fn assign_id(&mut self, id: DepartmentId) {
        self.id = Some(id);
    }

    pub(crate) fn courses_mut(&mut self) -> &mut [Course] {
        &mut self.courses
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Department{chair=")?;
        match &self.chair {
            Some(chair) => write!(f, "{chair}")?,
            None => f.write_str("null")?,
        }
        write!(f, ", name='{}', id=", self.name)?;
        match self.id {
            Some(id) => write!(f, "{id}}}"),
            None => f.write_str("null}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Department;
    use crate::model::person::Person;
    use crate::model::staff::Staff;

    #[test]
    fn display_renders_unsaved_ids_as_null() {
        let chair = Staff::new(Person::new("Grace", "Hopper"));
        let department = Department::new("Mathematics", chair);
        let rendered = department.to_string();
        assert!(rendered.starts_with("Department{chair=Staff{id=null"));
        assert!(rendered.ends_with("name='Mathematics', id=null}"));
    }

    #[test]
    fn set_chair_accepts_none() {
        let chair = Staff::new(Person::new("Grace", "Hopper"));
        let mut department = Department::new("Mathematics", chair);
        department.set_chair(None);
        assert!(department.chair().is_none());
    }
}
