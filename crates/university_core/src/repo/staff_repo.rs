//! Staff repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, paging and the last-name lookup over staff records.
//! - Keep the `staff_member` table layout inside this file.
//!
//! # Invariants
//! - `find_by_member_last_name` is an exact, case-sensitive match.
//! - Unordered reads (`find_all`, `find_by_member_last_name`) return
//!   ascending id order.
//! - A staff member chairing a department cannot be deleted.

use crate::model::person::Person;
use crate::model::staff::Staff;
use crate::model::{DepartmentId, StaffId, ValidationError};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::cmp::Ordering;

const STAFF_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name
FROM staff_member";

/// Sort key for paged staff listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaffSort {
    #[default]
    Id,
    /// Last name, then first name, then id.
    LastName,
    /// First name, then last name, then id.
    FirstName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Paging and sorting options for [`StaffRepository::find_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffPageQuery {
    pub sort: StaffSort,
    pub direction: SortDirection,
    /// Maximum rows to return. `None` returns every remaining row.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl StaffPageQuery {
    /// Orders two persisted staff records the way `ORDER BY` does for the
    /// relational adapter. Byte-wise string comparison matches SQLite's
    /// default `BINARY` collation.
    pub fn compare(&self, left: &Staff, right: &Staff) -> Ordering {
        let by_id = left.id().cmp(&right.id());
        let (l, r) = (left.member(), right.member());
        let ordering = match self.sort {
            StaffSort::Id => by_id,
            StaffSort::LastName => l
                .last_name()
                .cmp(r.last_name())
                .then_with(|| l.first_name().cmp(r.first_name()))
                .then(by_id),
            StaffSort::FirstName => l
                .first_name()
                .cmp(r.first_name())
                .then_with(|| l.last_name().cmp(r.last_name()))
                .then(by_id),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Sorts and slices an in-memory result set.
    pub fn apply(&self, mut staff: Vec<Staff>) -> Vec<Staff> {
        staff.sort_by(|left, right| self.compare(left, right));
        let limit = self.limit.map_or(usize::MAX, |limit| limit as usize);
        staff
            .into_iter()
            .skip(self.offset as usize)
            .take(limit)
            .collect()
    }

    fn order_by_sql(&self) -> String {
        let direction = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let columns: &[&str] = match self.sort {
            StaffSort::Id => &["id"],
            StaffSort::LastName => &["last_name", "first_name", "id"],
            StaffSort::FirstName => &["first_name", "last_name", "id"],
        };
        columns
            .iter()
            .map(|column| format!("{column} {direction}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Data-access contract for staff records.
pub trait StaffRepository {
    /// Inserts an unsaved record (assigning its id) or updates a saved one.
    fn save(&self, staff: &mut Staff) -> RepoResult<StaffId>;
    fn find_by_id(&self, id: StaffId) -> RepoResult<Option<Staff>>;
    fn find_all(&self) -> RepoResult<Vec<Staff>>;
    fn find_page(&self, query: &StaffPageQuery) -> RepoResult<Vec<Staff>>;
    fn count(&self) -> RepoResult<u64>;
    fn delete_by_id(&self, id: StaffId) -> RepoResult<()>;
    /// Returns every staff member whose embedded last name equals
    /// `last_name` exactly.
    fn find_by_member_last_name(&self, last_name: &str) -> RepoResult<Vec<Staff>>;

    fn exists_by_id(&self, id: StaffId) -> RepoResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

/// SQLite-backed staff repository.
pub struct SqliteStaffRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStaffRepository<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_staff(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Staff>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut staff = Vec::new();
        while let Some(row) = rows.next()? {
            staff.push(parse_staff_row(row)?);
        }
        Ok(staff)
    }
}

impl StaffRepository for SqliteStaffRepository<'_> {
    fn save(&self, staff: &mut Staff) -> RepoResult<StaffId> {
        let member = staff.member();
        match staff.id() {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE staff_member
                     SET first_name = ?1, last_name = ?2
                     WHERE id = ?3;",
                    params![member.first_name(), member.last_name(), id],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound(EntityRef::Staff(id)));
                }
                debug!("event=staff_save module=repo backend=relational status=ok op=update staff_id={id}");
                Ok(id)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO staff_member (first_name, last_name) VALUES (?1, ?2);",
                    params![member.first_name(), member.last_name()],
                )?;
                let id = self.conn.last_insert_rowid();
                staff.assign_id(id);
                debug!("event=staff_save module=repo backend=relational status=ok op=insert staff_id={id}");
                Ok(id)
            }
        }
    }

    fn find_by_id(&self, id: StaffId) -> RepoResult<Option<Staff>> {
        let mut found = self.query_staff(
            &format!("{STAFF_SELECT_SQL} WHERE id = ?1;"),
            vec![Value::Integer(id)],
        )?;
        Ok(found.pop())
    }

    fn find_all(&self) -> RepoResult<Vec<Staff>> {
        self.query_staff(&format!("{STAFF_SELECT_SQL} ORDER BY id ASC;"), Vec::new())
    }

    fn find_page(&self, query: &StaffPageQuery) -> RepoResult<Vec<Staff>> {
        let mut sql = format!("{STAFF_SELECT_SQL} ORDER BY {}", query.order_by_sql());
        let mut bind_values = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1");
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query_staff(&sql, bind_values)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM staff_member;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative staff count `{count}`")))
    }

    fn delete_by_id(&self, id: StaffId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let chaired: Option<DepartmentId> = tx
            .query_row(
                "SELECT id FROM department WHERE chair_id = ?1 ORDER BY id LIMIT 1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(department_id) = chaired {
            return Err(ValidationError::ChairInUse {
                staff_id: id,
                department_id,
            }
            .into());
        }

        let changed = tx.execute("DELETE FROM staff_member WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Staff(id)));
        }
        tx.commit()?;

        debug!("event=staff_delete module=repo backend=relational status=ok staff_id={id}");
        Ok(())
    }

    fn find_by_member_last_name(&self, last_name: &str) -> RepoResult<Vec<Staff>> {
        self.query_staff(
            &format!("{STAFF_SELECT_SQL} WHERE last_name = ?1 ORDER BY id ASC;"),
            vec![Value::Text(last_name.to_string())],
        )
    }
}

fn parse_staff_row(row: &Row<'_>) -> RepoResult<Staff> {
    let member = Person::new(
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
    );
    Ok(Staff::with_id(row.get("id")?, member))
}
