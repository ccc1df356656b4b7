//! Staff repository over the document store.
//!
//! Staff documents embed their `Person`:
//! `{"_id": 1, "member": {"firstName": .., "lastName": ..}}`.

use super::{decode, encode, DocumentStore, DEPARTMENT_COLLECTION, STAFF_COLLECTION};
use crate::model::person::Person;
use crate::model::staff::Staff;
use crate::model::{StaffId, ValidationError};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::staff_repo::{StaffPageQuery, StaffRepository};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct StaffDocument {
    #[serde(rename = "_id")]
    pub(super) id: StaffId,
    pub(super) member: Person,
}

impl From<StaffDocument> for Staff {
    fn from(document: StaffDocument) -> Self {
        Staff::with_id(document.id, document.member)
    }
}

pub(super) fn decode_staff(id: StaffId, value: &JsonValue) -> RepoResult<Staff> {
    decode::<StaffDocument>(STAFF_COLLECTION, id, value).map(Staff::from)
}

/// Document-store-backed staff repository.
pub struct DocumentStaffRepository<'store> {
    store: &'store DocumentStore,
}

impl<'store> DocumentStaffRepository<'store> {
    pub fn new(store: &'store DocumentStore) -> Self {
        Self { store }
    }
}

impl StaffRepository for DocumentStaffRepository<'_> {
    fn save(&self, staff: &mut Staff) -> RepoResult<StaffId> {
        let id = self.store.write(|docs| {
            let id = match staff.id() {
                Some(id) if docs.contains(STAFF_COLLECTION, id) => id,
                Some(id) => return Err(RepoError::NotFound(EntityRef::Staff(id))),
                None => docs.next_id(STAFF_COLLECTION),
            };
            let document = encode(&StaffDocument {
                id,
                member: staff.member().clone(),
            })?;
            docs.put(STAFF_COLLECTION, id, document);
            Ok(id)
        })?;

        staff.assign_id(id);
        debug!("event=staff_save module=repo backend=document status=ok staff_id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: StaffId) -> RepoResult<Option<Staff>> {
        self.store.read(|docs| {
            docs.get(STAFF_COLLECTION, id)
                .map(|value| decode_staff(id, value))
                .transpose()
        })
    }

    fn find_all(&self) -> RepoResult<Vec<Staff>> {
        self.store.read(|docs| {
            docs.documents(STAFF_COLLECTION)
                .map(|(id, value)| decode_staff(id, value))
                .collect()
        })
    }

    fn find_page(&self, query: &StaffPageQuery) -> RepoResult<Vec<Staff>> {
        Ok(query.apply(self.find_all()?))
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.store.read(|docs| docs.len(STAFF_COLLECTION)) as u64)
    }

    fn delete_by_id(&self, id: StaffId) -> RepoResult<()> {
        self.store.write(|docs| {
            let chaired = docs
                .find_eq(DEPARTMENT_COLLECTION, "chair.$id", &json!(id))
                .first()
                .map(|(department_id, _)| *department_id);
            if let Some(department_id) = chaired {
                return Err(RepoError::from(ValidationError::ChairInUse {
                    staff_id: id,
                    department_id,
                }));
            }

            docs.remove(STAFF_COLLECTION, id)
                .map(|_| ())
                .ok_or(RepoError::NotFound(EntityRef::Staff(id)))
        })?;

        debug!("event=staff_delete module=repo backend=document status=ok staff_id={id}");
        Ok(())
    }

    fn find_by_member_last_name(&self, last_name: &str) -> RepoResult<Vec<Staff>> {
        let expected = JsonValue::String(last_name.to_string());
        self.store.read(|docs| {
            docs.find_eq(STAFF_COLLECTION, "member.lastName", &expected)
                .into_iter()
                .map(|(id, value)| decode_staff(id, value))
                .collect()
        })
    }
}
