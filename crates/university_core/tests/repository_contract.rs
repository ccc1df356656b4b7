//! Behavior every storage adapter must share. Each test runs against both
//! the relational and the document backend.

use university_core::{
    Course, Department, EntityRef, ErrorCategory, Person, RepoError, SortDirection, Staff,
    StaffPageQuery, StaffSort, Storage, StorageBackend, StorageConfig, ValidationError,
};

const BACKENDS: [StorageBackend; 2] = [StorageBackend::Relational, StorageBackend::Document];

fn for_each_backend(test: impl Fn(&Storage)) {
    for backend in BACKENDS {
        let storage = Storage::open(&StorageConfig::in_memory(backend)).unwrap();
        assert_eq!(storage.backend(), backend);
        test(&storage);
    }
}

/// Every course id currently stored, read past the repository layer.
fn stored_course_ids(storage: &Storage) -> Vec<i64> {
    let mut ids: Vec<i64> = match storage {
        Storage::Relational(conn) => {
            let mut stmt = conn.prepare("SELECT id FROM course;").unwrap();
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0)).unwrap();
            rows.map(Result::unwrap).collect()
        }
        Storage::Document(store) => store.read(|docs| {
            docs.documents("department")
                .flat_map(|(_, document)| {
                    document["courses"]
                        .as_array()
                        .into_iter()
                        .flatten()
                        .map(|course| course["_id"].as_i64().unwrap())
                        .collect::<Vec<_>>()
                })
                .collect()
        }),
    };
    ids.sort_unstable();
    ids
}

fn saved_staff(storage: &Storage, first: &str, last: &str) -> Staff {
    let mut staff = Staff::new(Person::new(first, last));
    storage.staff_repository().save(&mut staff).unwrap();
    staff
}

#[test]
fn staff_save_then_find_by_id_roundtrip() {
    for_each_backend(|storage| {
        let repo = storage.staff_repository();
        let mut staff = Staff::new(Person::new("Grace", "Hopper"));
        assert_eq!(staff.id(), None);

        let id = repo.save(&mut staff).unwrap();
        assert_eq!(staff.id(), Some(id));

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(loaded.id(), Some(id));
        assert_eq!(loaded.member().first_name(), "Grace");
        assert_eq!(loaded.member().last_name(), "Hopper");
        assert!(repo.exists_by_id(id).unwrap());
    });
}

#[test]
fn staff_ids_are_distinct_and_assigned_by_storage() {
    for_each_backend(|storage| {
        let first = saved_staff(storage, "Alan", "Turing");
        let second = saved_staff(storage, "Alonzo", "Church");
        assert_ne!(first.id(), second.id());
        assert_eq!(storage.staff_repository().count().unwrap(), 2);
    });
}

#[test]
fn saving_a_saved_staff_updates_in_place() {
    for_each_backend(|storage| {
        let repo = storage.staff_repository();
        let mut staff = saved_staff(storage, "Ada", "Byron");
        let id = staff.id().unwrap();

        assert_eq!(repo.save(&mut staff).unwrap(), id);
        assert_eq!(repo.count().unwrap(), 1);
    });
}

#[test]
fn saving_deleted_staff_returns_not_found() {
    for_each_backend(|storage| {
        let repo = storage.staff_repository();
        let mut staff = saved_staff(storage, "Claude", "Shannon");
        let id = staff.id().unwrap();
        repo.delete_by_id(id).unwrap();

        let err = repo.save(&mut staff).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(EntityRef::Staff(missing)) if missing == id));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    });
}

#[test]
fn find_by_id_on_missing_staff_returns_none() {
    for_each_backend(|storage| {
        let repo = storage.staff_repository();
        assert!(repo.find_by_id(42).unwrap().is_none());
        assert!(!repo.exists_by_id(42).unwrap());
    });
}

#[test]
fn delete_missing_staff_returns_not_found() {
    for_each_backend(|storage| {
        let err = storage.staff_repository().delete_by_id(7).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(EntityRef::Staff(7))));
    });
}

#[test]
fn find_by_member_last_name_is_exact_and_case_sensitive() {
    for_each_backend(|storage| {
        let smith_a = saved_staff(storage, "John", "Smith");
        saved_staff(storage, "Jane", "smith");
        saved_staff(storage, "Jim", "Smithson");
        saved_staff(storage, "Joan", "Goldsmith");
        let smith_b = saved_staff(storage, "Jill", "Smith");

        let found = storage
            .staff_repository()
            .find_by_member_last_name("Smith")
            .unwrap();
        let ids: Vec<_> = found.iter().filter_map(Staff::id).collect();
        assert_eq!(ids, vec![smith_a.id().unwrap(), smith_b.id().unwrap()]);
        assert!(found.iter().all(|staff| staff.member().last_name() == "Smith"));

        assert!(storage
            .staff_repository()
            .find_by_member_last_name("Nobody")
            .unwrap()
            .is_empty());
    });
}

#[test]
fn find_all_returns_ascending_ids() {
    for_each_backend(|storage| {
        let ids: Vec<_> = ["Kay", "Lamport", "Hoare"]
            .iter()
            .map(|last| saved_staff(storage, "X", last).id().unwrap())
            .collect();
        let found: Vec<_> = storage
            .staff_repository()
            .find_all()
            .unwrap()
            .iter()
            .filter_map(Staff::id)
            .collect();
        assert_eq!(found, ids);
    });
}

#[test]
fn find_page_sorts_and_slices_identically() {
    for_each_backend(|storage| {
        saved_staff(storage, "Robin", "Milner");
        saved_staff(storage, "Tony", "Hoare");
        saved_staff(storage, "Adele", "Goldberg");
        saved_staff(storage, "Anita", "Borg");
        saved_staff(storage, "Ken", "Thompson");

        let query = StaffPageQuery {
            sort: StaffSort::LastName,
            direction: SortDirection::Ascending,
            limit: Some(2),
            offset: 1,
        };
        let page = storage.staff_repository().find_page(&query).unwrap();
        let names: Vec<_> = page.iter().map(|staff| staff.member().last_name()).collect();
        assert_eq!(names, vec!["Goldberg", "Hoare"]);

        let tail = StaffPageQuery {
            sort: StaffSort::FirstName,
            direction: SortDirection::Descending,
            limit: None,
            offset: 3,
        };
        let page = storage.staff_repository().find_page(&tail).unwrap();
        let names: Vec<_> = page
            .iter()
            .map(|staff| staff.member().first_name())
            .collect();
        assert_eq!(names, vec!["Anita", "Adele"]);
    });
}

#[test]
fn department_save_assigns_ids_and_preserves_course_order() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Donald", "Knuth");
        let mut department = Department::new("Computer Science", chair.clone());
        department.add_course(Course::new("Algorithms"));
        department.add_course(Course::new("Compilers"));
        department.add_course(Course::new("Algorithms"));
        assert_eq!(department.id(), None);

        let repo = storage.department_repository();
        let id = repo.save(&mut department).unwrap();
        assert_eq!(department.id(), Some(id));
        assert!(department.courses().iter().all(|course| course.id().is_some()));

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(loaded.name(), "Computer Science");
        assert_eq!(loaded.chair(), Some(&chair));
        let names: Vec<_> = loaded.courses().iter().map(Course::name).collect();
        assert_eq!(names, vec!["Algorithms", "Compilers", "Algorithms"]);
        assert_eq!(loaded, department);
    });
}

#[test]
fn department_update_appends_courses_and_changes_chair() {
    for_each_backend(|storage| {
        let first_chair = saved_staff(storage, "Leslie", "Lamport");
        let second_chair = saved_staff(storage, "Butler", "Lampson");
        let repo = storage.department_repository();

        let mut department = Department::new("Distributed Systems", first_chair);
        department.add_course(Course::new("Consensus"));
        let id = repo.save(&mut department).unwrap();
        let first_course_id = department.courses()[0].id();

        department.set_name("Systems");
        department.set_chair(Some(second_chair.clone()));
        department.add_course(Course::new("Clocks"));
        assert_eq!(repo.save(&mut department).unwrap(), id);

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(loaded.name(), "Systems");
        assert_eq!(loaded.chair(), Some(&second_chair));
        assert_eq!(loaded.courses()[0].id(), first_course_id);
        let names: Vec<_> = loaded.courses().iter().map(Course::name).collect();
        assert_eq!(names, vec!["Consensus", "Clocks"]);
        assert_eq!(repo.count().unwrap(), 1);
    });
}

#[test]
fn repeated_course_in_one_department_is_stored_as_a_new_course() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Edsger", "Dijkstra");
        let repo = storage.department_repository();
        let mut department = Department::new("Structured Programming", chair);
        department.add_course(Course::new("Goto Considered Harmful"));
        let id = repo.save(&mut department).unwrap();

        let repeat = department.courses()[0].clone();
        department.add_course(repeat);
        assert_eq!(repo.save(&mut department).unwrap(), id);

        let ids: Vec<_> = department.courses().iter().filter_map(Course::id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(loaded, department);
        assert_eq!(stored_course_ids(storage).len(), 2);
    });
}

#[test]
fn course_owned_by_another_department_is_rejected() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Barbara", "Liskov");
        let repo = storage.department_repository();
        let mut owner = Department::new("Abstraction", chair.clone());
        owner.add_course(Course::new("Data Types"));
        let owner_id = repo.save(&mut owner).unwrap();
        let course_id = owner.courses()[0].id().unwrap();

        let mut thief = Department::new("Substitution", chair);
        thief.add_course(Course::new("Subtyping"));
        thief.add_course(owner.courses()[0].clone());
        let err = repo.save(&mut thief).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::CourseOwnedElsewhere { course_id: c, department_id: d })
                if c == course_id && d == owner_id
        ));
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(thief.id(), None);
        assert_eq!(thief.courses()[0].id(), None);

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(stored_course_ids(storage), vec![course_id]);
        assert_eq!(repo.find_by_id(owner_id).unwrap().unwrap(), owner);
    });
}

#[test]
fn department_without_chair_roundtrips() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Frances", "Allen");
        let repo = storage.department_repository();
        let mut department = Department::new("Optimization", chair);
        department.set_chair(None);

        let id = repo.save(&mut department).unwrap();
        let loaded = repo.find_by_id(id).unwrap().unwrap();
        assert!(loaded.chair().is_none());
    });
}

#[test]
fn department_with_unsaved_chair_is_rejected() {
    for_each_backend(|storage| {
        let chair = Staff::new(Person::new("Unsaved", "Chair"));
        let mut department = Department::new("Nowhere", chair);

        let err = storage
            .department_repository()
            .save(&mut department)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::UnsavedChair)
        ));
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(department.id(), None);
        assert_eq!(storage.department_repository().count().unwrap(), 0);
    });
}

#[test]
fn department_with_deleted_chair_is_rejected() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Gone", "Away");
        let chair_id = chair.id().unwrap();
        storage.staff_repository().delete_by_id(chair_id).unwrap();

        let mut department = Department::new("Ghosts", chair);
        department.add_course(Course::new("Haunting"));
        let err = storage
            .department_repository()
            .save(&mut department)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::UnknownChair(id)) if id == chair_id
        ));
        assert_eq!(department.courses()[0].id(), None);
    });
}

#[test]
fn deleting_department_cascades_to_courses_but_keeps_chair() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "John", "McCarthy");
        let chair_id = chair.id().unwrap();
        let departments = storage.department_repository();

        let mut doomed = Department::new("Artificial Intelligence", chair.clone());
        doomed.add_course(Course::new("Lisp"));
        doomed.add_course(Course::new("Search"));
        let doomed_id = departments.save(&mut doomed).unwrap();

        let mut survivor = Department::new("Logic", chair.clone());
        survivor.add_course(Course::new("Proofs"));
        let survivor_id = departments.save(&mut survivor).unwrap();
        let survivor_course_id = survivor.courses()[0].id().unwrap();
        assert_eq!(stored_course_ids(storage).len(), 3);

        departments.delete_by_id(doomed_id).unwrap();
        assert_eq!(stored_course_ids(storage), vec![survivor_course_id]);

        assert!(departments.find_by_id(doomed_id).unwrap().is_none());
        assert!(!departments.exists_by_id(doomed_id).unwrap());
        let kept = departments.find_by_id(survivor_id).unwrap().unwrap();
        assert_eq!(kept.courses().len(), 1);

        let staff = storage.staff_repository().find_by_id(chair_id).unwrap();
        assert_eq!(staff, Some(chair));
    });
}

#[test]
fn deleting_missing_department_returns_not_found() {
    for_each_backend(|storage| {
        let err = storage
            .department_repository()
            .delete_by_id(99)
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(EntityRef::Department(99))));
    });
}

#[test]
fn staff_chairing_a_department_cannot_be_deleted() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Niklaus", "Wirth");
        let chair_id = chair.id().unwrap();
        let mut department = Department::new("Languages", chair);
        let department_id = storage
            .department_repository()
            .save(&mut department)
            .unwrap();

        let err = storage
            .staff_repository()
            .delete_by_id(chair_id)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::ChairInUse { staff_id, department_id: d })
                if staff_id == chair_id && d == department_id
        ));
        assert!(storage.staff_repository().exists_by_id(chair_id).unwrap());

        storage
            .department_repository()
            .delete_by_id(department_id)
            .unwrap();
        storage.staff_repository().delete_by_id(chair_id).unwrap();
    });
}

#[test]
fn find_all_departments_loads_each_course_list() {
    for_each_backend(|storage| {
        let chair = saved_staff(storage, "Margaret", "Hamilton");
        let repo = storage.department_repository();

        let mut first = Department::new("Aerospace", chair.clone());
        first.add_course(Course::new("Guidance"));
        repo.save(&mut first).unwrap();
        let mut second = Department::new("Software", chair);
        second.add_course(Course::new("Reliability"));
        second.add_course(Course::new("Testing"));
        repo.save(&mut second).unwrap();
        let mut third = Department::new("Empty", saved_staff(storage, "No", "Courses"));
        repo.save(&mut third).unwrap();

        let all = repo.find_all().unwrap();
        assert_eq!(all, vec![first, second, third]);
    });
}

#[test]
fn file_backed_storage_survives_reopen() {
    for backend in BACKENDS {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::at_path(backend, dir.path().join("university.data"));

        let department_id = {
            let storage = Storage::open(&config).unwrap();
            let chair = saved_staff(&storage, "Tim", "Berners-Lee");
            let mut department = Department::new("Web", chair);
            department.add_course(Course::new("Hypertext"));
            let id = storage
                .department_repository()
                .save(&mut department)
                .unwrap();
            id
        };

        let storage = Storage::open(&config).unwrap();
        let loaded = storage
            .department_repository()
            .find_by_id(department_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.name(), "Web");
        assert_eq!(loaded.courses()[0].name(), "Hypertext");
        assert_eq!(
            loaded.chair().map(|chair| chair.member().last_name()),
            Some("Berners-Lee")
        );
    }
}
