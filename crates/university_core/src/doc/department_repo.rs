//! Department repository over the document store.
//!
//! Courses are embedded in the department document, so removing the
//! document removes them with it. The chair is stored as a `$ref` into the
//! staff collection and resolved on every read. A course id appears in at
//! most one department document.

use super::staff_repo::decode_staff;
use super::{
    decode, encode, DocumentRef, DocumentSet, DocumentStore, COURSE_SEQUENCE,
    DEPARTMENT_COLLECTION, STAFF_COLLECTION,
};
use crate::model::course::Course;
use crate::model::department::Department;
use crate::model::{CourseId, DepartmentId, ValidationError};
use crate::repo::department_repo::{chair_reference, kept_course_ids, DepartmentRepository};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct DepartmentDocument {
    #[serde(rename = "_id")]
    id: DepartmentId,
    name: String,
    chair: Option<DocumentRef>,
    #[serde(default)]
    courses: Vec<CourseDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CourseDocument {
    #[serde(rename = "_id")]
    id: CourseId,
    name: String,
}

/// Document-store-backed department repository.
pub struct DocumentDepartmentRepository<'store> {
    store: &'store DocumentStore,
}

impl<'store> DocumentDepartmentRepository<'store> {
    pub fn new(store: &'store DocumentStore) -> Self {
        Self { store }
    }
}

impl DepartmentRepository for DocumentDepartmentRepository<'_> {
    fn save(&self, department: &mut Department) -> RepoResult<DepartmentId> {
        let chair_id = chair_reference(department)?;

        let (id, course_ids) = self.store.write(|docs| {
            if let Some(chair_id) = chair_id {
                if !docs.contains(STAFF_COLLECTION, chair_id) {
                    return Err(RepoError::from(ValidationError::UnknownChair(chair_id)));
                }
            }

            let id = match department.id() {
                Some(id) if docs.contains(DEPARTMENT_COLLECTION, id) => id,
                Some(id) => return Err(RepoError::NotFound(EntityRef::Department(id))),
                None => docs.next_id(DEPARTMENT_COLLECTION),
            };

            let owners = course_owners(docs, id)?;
            let kept = kept_course_ids(department.courses());
            for course_id in kept.iter().flatten() {
                if let Some(&department_id) = owners.get(course_id) {
                    return Err(RepoError::from(ValidationError::CourseOwnedElsewhere {
                        course_id: *course_id,
                        department_id,
                    }));
                }
            }

            let courses: Vec<CourseDocument> = department
                .courses()
                .iter()
                .zip(kept)
                .map(|(course, kept_id)| CourseDocument {
                    id: kept_id.unwrap_or_else(|| docs.next_id(COURSE_SEQUENCE)),
                    name: course.name().to_string(),
                })
                .collect();
            let course_ids: Vec<CourseId> = courses.iter().map(|course| course.id).collect();

            let document = encode(&DepartmentDocument {
                id,
                name: department.name().to_string(),
                chair: chair_id.map(|chair_id| DocumentRef::new(STAFF_COLLECTION, chair_id)),
                courses,
            })?;
            docs.put(DEPARTMENT_COLLECTION, id, document);
            Ok((id, course_ids))
        })?;

        department.assign_id(id);
        for (course, course_id) in department.courses_mut().iter_mut().zip(course_ids) {
            course.assign_id(course_id);
        }
        debug!(
            "event=department_save module=repo backend=document status=ok department_id={id} courses={}",
            department.courses().len()
        );
        Ok(id)
    }

    fn find_by_id(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        self.store.read(|docs| {
            docs.get(DEPARTMENT_COLLECTION, id)
                .map(|value| resolve_department(docs, id, value))
                .transpose()
        })
    }

    fn find_all(&self) -> RepoResult<Vec<Department>> {
        self.store.read(|docs| {
            docs.documents(DEPARTMENT_COLLECTION)
                .map(|(id, value)| resolve_department(docs, id, value))
                .collect()
        })
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.store.read(|docs| docs.len(DEPARTMENT_COLLECTION)) as u64)
    }

    fn delete_by_id(&self, id: DepartmentId) -> RepoResult<()> {
        self.store.write(|docs| {
            docs.remove(DEPARTMENT_COLLECTION, id)
                .map(|_| ())
                .ok_or(RepoError::NotFound(EntityRef::Department(id)))
        })?;

        debug!("event=department_delete module=repo backend=document status=ok department_id={id}");
        Ok(())
    }
}

/// Maps every stored course id to its department, skipping `except`.
fn course_owners(
    docs: &DocumentSet,
    except: DepartmentId,
) -> RepoResult<BTreeMap<CourseId, DepartmentId>> {
    let mut owners = BTreeMap::new();
    for (id, value) in docs.documents(DEPARTMENT_COLLECTION) {
        if id == except {
            continue;
        }
        let document: DepartmentDocument = decode(DEPARTMENT_COLLECTION, id, value)?;
        owners.extend(document.courses.into_iter().map(|course| (course.id, id)));
    }
    Ok(owners)
}

fn resolve_department(
    docs: &DocumentSet,
    id: DepartmentId,
    value: &JsonValue,
) -> RepoResult<Department> {
    let document: DepartmentDocument = decode(DEPARTMENT_COLLECTION, id, value)?;

    let chair = match document.chair {
        Some(reference) if reference.collection == STAFF_COLLECTION => {
            let staff = docs.get(STAFF_COLLECTION, reference.id).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "department {id} references missing staff {}",
                    reference.id
                ))
            })?;
            Some(decode_staff(reference.id, staff)?)
        }
        Some(reference) => {
            return Err(RepoError::InvalidData(format!(
                "department {id} chair points into `{}` instead of `{STAFF_COLLECTION}`",
                reference.collection
            )))
        }
        None => None,
    };

    let courses = document
        .courses
        .into_iter()
        .map(|course| Course::with_id(course.id, course.name))
        .collect();
    Ok(Department::from_parts(document.id, document.name, chair, courses))
}
