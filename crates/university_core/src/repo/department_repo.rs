//! Department repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist departments together with their chair reference and their
//!   owned course list.
//! - Load departments eagerly (chair and courses in one call).
//!
//! # Invariants
//! - `save` rewrites the course list in one transaction, keeping append
//!   order through the `position` column.
//! - `delete_by_id` removes owned courses via `ON DELETE CASCADE` and never
//!   touches the chair's `staff_member` row.
//! - Ids are written back into the entity only after commit.
//! - A course id is stored under at most one department. Repeats of an id
//!   within one course list are stored as new courses.

use crate::model::course::Course;
use crate::model::department::Department;
use crate::model::person::Person;
use crate::model::staff::Staff;
use crate::model::{CourseId, DepartmentId, StaffId, ValidationError};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::collections::{BTreeMap, BTreeSet};

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    department.id AS id,
    department.name AS name,
    staff_member.id AS chair_id,
    staff_member.first_name AS chair_first_name,
    staff_member.last_name AS chair_last_name
FROM department
LEFT JOIN staff_member ON staff_member.id = department.chair_id";

/// Data-access contract for departments. Pure CRUD.
pub trait DepartmentRepository {
    /// Inserts or updates a department and replaces its stored course list.
    fn save(&self, department: &mut Department) -> RepoResult<DepartmentId>;
    fn find_by_id(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    fn find_all(&self) -> RepoResult<Vec<Department>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deletes a department and its courses. The chair is left in place.
    fn delete_by_id(&self, id: DepartmentId) -> RepoResult<()>;

    fn exists_by_id(&self, id: DepartmentId) -> RepoResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

/// Resolves the chair reference a department should be stored with.
///
/// Shared by both adapters: an unsaved chair cannot be referenced.
pub(crate) fn chair_reference(department: &Department) -> RepoResult<Option<StaffId>> {
    match department.chair() {
        Some(chair) => chair
            .id()
            .map(Some)
            .ok_or(RepoError::Validation(ValidationError::UnsavedChair)),
        None => Ok(None),
    }
}

/// Returns the id each course keeps when stored, in list order.
///
/// Only the first occurrence of a saved course keeps its id; later copies
/// of it are `None` and get a fresh id like any unsaved course.
pub(crate) fn kept_course_ids(courses: &[Course]) -> Vec<Option<CourseId>> {
    let mut seen = BTreeSet::new();
    courses
        .iter()
        .map(|course| course.id().filter(|id| seen.insert(*id)))
        .collect()
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, filter: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DEPARTMENT_SELECT_SQL} {filter} ORDER BY department.id ASC;"))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut heads = Vec::new();
        while let Some(row) = rows.next()? {
            heads.push(parse_department_row(row)?);
        }
        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let mut courses = self.load_courses(&heads)?;
        Ok(heads
            .into_iter()
            .map(|(id, name, chair)| {
                let owned = courses.remove(&id).unwrap_or_default();
                Department::from_parts(id, name, chair, owned)
            })
            .collect())
    }

    fn load_courses(
        &self,
        heads: &[(DepartmentId, String, Option<Staff>)],
    ) -> RepoResult<BTreeMap<DepartmentId, Vec<Course>>> {
        let placeholders = vec!["?"; heads.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, department_id, name
             FROM course
             WHERE department_id IN ({placeholders})
             ORDER BY department_id ASC, position ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(heads.iter().map(|(id, _, _)| *id)))?;

        let mut courses: BTreeMap<DepartmentId, Vec<Course>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let course_id: CourseId = row.get("id")?;
            let department_id: DepartmentId = row.get("department_id")?;
            let name: String = row.get("name")?;
            courses
                .entry(department_id)
                .or_default()
                .push(Course::with_id(course_id, name));
        }
        Ok(courses)
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn save(&self, department: &mut Department) -> RepoResult<DepartmentId> {
        let chair_id = chair_reference(department)?;
        let tx = self.conn.unchecked_transaction()?;

        if let Some(chair_id) = chair_id {
            ensure_staff_exists(&tx, chair_id)?;
        }

        let id = match department.id() {
            Some(id) => {
                let changed = tx.execute(
                    "UPDATE department SET name = ?1, chair_id = ?2 WHERE id = ?3;",
                    params![department.name(), chair_id, id],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound(EntityRef::Department(id)));
                }
                tx.execute("DELETE FROM course WHERE department_id = ?1;", [id])?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO department (name, chair_id) VALUES (?1, ?2);",
                    params![department.name(), chair_id],
                )?;
                tx.last_insert_rowid()
            }
        };

        let courses = department.courses();
        let kept = kept_course_ids(courses);
        for course_id in kept.iter().flatten() {
            ensure_course_unowned(&tx, *course_id)?;
        }

        let mut course_ids = Vec::with_capacity(courses.len());
        for (position, (course, kept_id)) in courses.iter().zip(&kept).enumerate() {
            tx.execute(
                "INSERT INTO course (id, department_id, position, name) VALUES (?1, ?2, ?3, ?4);",
                params![*kept_id, id, position as i64, course.name()],
            )?;
            course_ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;

        department.assign_id(id);
        for (course, course_id) in department.courses_mut().iter_mut().zip(course_ids) {
            course.assign_id(course_id);
        }
        debug!(
            "event=department_save module=repo backend=relational status=ok department_id={id} courses={}",
            department.courses().len()
        );
        Ok(id)
    }

    fn find_by_id(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let mut found = self.load("WHERE department.id = ?1", vec![Value::Integer(id)])?;
        Ok(found.pop())
    }

    fn find_all(&self) -> RepoResult<Vec<Department>> {
        self.load("", Vec::new())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM department;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative department count `{count}`")))
    }

    fn delete_by_id(&self, id: DepartmentId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM department WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Department(id)));
        }
        tx.commit()?;

        debug!("event=department_delete module=repo backend=relational status=ok department_id={id}");
        Ok(())
    }
}

fn ensure_staff_exists(tx: &Transaction<'_>, id: StaffId) -> RepoResult<()> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM staff_member WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(ValidationError::UnknownChair(id).into())
    }
}

/// Runs after this department's own course rows are cleared, so any row
/// still holding `course_id` belongs to another department.
fn ensure_course_unowned(tx: &Transaction<'_>, course_id: CourseId) -> RepoResult<()> {
    let owner: Option<DepartmentId> = tx
        .query_row(
            "SELECT department_id FROM course WHERE id = ?1;",
            [course_id],
            |row| row.get(0),
        )
        .optional()?;
    match owner {
        Some(department_id) => Err(ValidationError::CourseOwnedElsewhere {
            course_id,
            department_id,
        }
        .into()),
        None => Ok(()),
    }
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<(DepartmentId, String, Option<Staff>)> {
    let chair = match row.get::<_, Option<StaffId>>("chair_id")? {
        Some(chair_id) => {
            let first_name: Option<String> = row.get("chair_first_name")?;
            let last_name: Option<String> = row.get("chair_last_name")?;
            match (first_name, last_name) {
                (Some(first), Some(last)) => Some(Staff::with_id(chair_id, Person::new(first, last))),
                _ => {
                    return Err(RepoError::InvalidData(format!(
                        "staff_member {chair_id} is missing name columns"
                    )))
                }
            }
        }
        None => None,
    };
    Ok((row.get("id")?, row.get("name")?, chair))
}
