//! Staff entity.

use crate::model::person::Person;
use crate::model::StaffId;
use std::fmt::{Display, Formatter};

/// A staff member of the university, wrapping an embedded `Person`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    id: Option<StaffId>,
    member: Person,
}

impl Staff {
    /// Creates an unsaved staff record. The id stays `None` until a
    /// repository persists it.
    pub fn new(member: Person) -> Self {
        Self { id: None, member }
    }

    pub(crate) fn with_id(id: StaffId, member: Person) -> Self {
        Self {
            id: Some(id),
            member,
        }
    }

    pub fn id(&self) -> Option<StaffId> {
        self.id
    }

    pub fn member(&self) -> &Person {
        &self.member
    }

    pub(crate) fn assign_id(&mut self, id: StaffId) {
        self.id = Some(id);
    }
}

impl Display for Staff {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Staff{{id={id}, member={}}}", self.member),
            None => write!(f, "Staff{{id=null, member={}}}", self.member),
        }
    }
}
