use docstore::collection::{just_once, update_all, UpdatePatch};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, by_id, field};
use docstore_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_set_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("employees", doc! { "_id": "E1", "employeeNo": "E1", "grade": "L4", "name": "Asha" })?;
            let patch = UpdatePatch::new().set("grade", "L5");

            assert_eq!(store.update("employees", &by_id("E1"), &patch, &just_once())?, 1);
            let first = store.find_one("employees", &by_id("E1"))?.unwrap();
            assert_eq!(store.update("employees", &by_id("E1"), &patch, &just_once())?, 1);
            let second = store.find_one("employees", &by_id("E1"))?.unwrap();

            assert_eq!(first.get("grade"), second.get("grade"));
            assert_eq!(second.get("name"), Some(&Value::from("Asha")));
            assert_eq!(first.created_at(), second.created_at());
            assert!(second.updated_at().unwrap() > first.updated_at().unwrap());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_inc_and_unset() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert(
                "employees",
                doc! { "_id": "E1", "employeeNo": "E1", "revision": 1, "bonus": 10.5, "deletedAt": "2024-01-01" },
            )?;

            let patch = UpdatePatch::parse(&doc! {
                "$inc": { "revision": 2, "bonus": 1, "leaveDays": 3 },
                "$unset": { "deletedAt": "" }
            })?;
            store.update("employees", &by_id("E1"), &patch, &just_once())?;

            let found = store.find_one("employees", &by_id("E1"))?.unwrap();
            assert_eq!(found.get("revision"), Some(&Value::Int(3)));
            assert_eq!(found.get("bonus"), Some(&Value::Float(11.5)));
            assert_eq!(found.get("leaveDays"), Some(&Value::Int(3)));
            assert!(!found.contains_field("deletedAt"));

            let err = store
                .update("employees", &by_id("E1"), &UpdatePatch::new().inc("employeeNo", 1), &just_once())
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_single_and_multi() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            for i in 0..5 {
                store.insert("employees", doc! { "employeeNo": (format!("E{}", i)), "status": 1 })?;
            }

            let patch = UpdatePatch::new().set("status", 0);
            assert_eq!(store.update("employees", &field("status").eq(1), &patch, &just_once())?, 1);
            assert_eq!(store.count("employees", &field("status").eq(0))?, 1);

            assert_eq!(store.update("employees", &field("status").eq(1), &patch, &update_all())?, 4);
            assert_eq!(store.count("employees", &field("status").eq(0))?, 5);

            // nothing matches, nothing changes
            assert_eq!(store.update("employees", &field("status").eq(7), &patch, &update_all())?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_nested_set_and_plain_patch() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("employees", doc! { "_id": "E1", "employeeNo": "E1", "address": { "city": "Pune", "zip": 411001 } })?;

            store.update(
                "employees",
                &by_id("E1"),
                &UpdatePatch::new().set("address.city", "Mumbai"),
                &just_once(),
            )?;
            let patch = UpdatePatch::parse(&doc! { "grade": "L6" })?;
            store.update("employees", &by_id("E1"), &patch, &just_once())?;

            let found = store.find_one("employees", &by_id("E1"))?.unwrap();
            assert_eq!(found.get("address.city"), Some(&Value::from("Mumbai")));
            assert_eq!(found.get("address.zip"), Some(&Value::Int(411001)));
            assert_eq!(found.get("grade"), Some(&Value::from("L6")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_violation_on_update_changes_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("employees", doc! { "employeeNo": "E1", "departmentId": "D1" })?;
            store.insert("employees", doc! { "employeeNo": "E2", "departmentId": "D1" })?;
            store.insert("employees", doc! { "employeeNo": "E3", "departmentId": "D2" })?;

            let err = store
                .update(
                    "employees",
                    &field("employeeNo").eq("E2"),
                    &UpdatePatch::new().set("employeeNo", "E1"),
                    &just_once(),
                )
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            // a multi update collapsing two documents onto one value fails as a whole
            let err = store
                .update(
                    "employees",
                    &field("departmentId").eq("D1"),
                    &UpdatePatch::new().set("employeeNo", "E9"),
                    &update_all(),
                )
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            assert_eq!(store.count("employees", &field("employeeNo").eq("E1"))?, 1);
            assert_eq!(store.count("employees", &field("employeeNo").eq("E2"))?, 1);
            assert_eq!(store.count("employees", &field("employeeNo").eq("E9"))?, 0);

            // moving a value to a free slot releases the old one
            store.update(
                "employees",
                &field("employeeNo").eq("E3"),
                &UpdatePatch::new().set("employeeNo", "E4"),
                &just_once(),
            )?;
            store.insert("employees", doc! { "employeeNo": "E3" })?;
            assert_eq!(store.count("employees", &all())?, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_system_fields_are_not_patchable() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("employees", doc! { "_id": "E1", "employeeNo": "E1" })?;

            for patch in [
                UpdatePatch::new().set("_id", "E2"),
                UpdatePatch::new().set("createdAt", "2000-01-01T00:00:00Z"),
                UpdatePatch::new().unset("updatedAt"),
                UpdatePatch::new(),
            ] {
                let err = store.update("employees", &by_id("E1"), &patch, &just_once()).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
            }
            assert!(store.find_one("employees", &by_id("E1"))?.is_some());
            Ok(())
        },
        cleanup,
    )
}
