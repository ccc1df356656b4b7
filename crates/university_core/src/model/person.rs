//! Person value object.
//!
//! # Invariants
//! - Both names are fixed at construction; there are no setters.
//! - Blank names are stored as given.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An individual's first and last name, embedded in a `Staff` record.
///
/// Serialized with camelCase keys so embedded documents read as
/// `{"firstName": .., "lastName": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    first_name: String,
    last_name: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " firstName='{}', lastName='{}' ",
            self.first_name, self.last_name
        )
    }
}
