use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, field};
use docstore_int_test::test_util::{cleanup, create_test_context, fake_employee, fake_employees, run_test};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_insert_assigns_system_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let stored = store.insert(
                "users",
                doc! { "email": "asha@corp.io", "role": "admin", "createdAt": "1999-01-01T00:00:00Z" },
            )?;

            let id = stored.id().and_then(|v| v.as_str()).unwrap();
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(stored.created_at().unwrap().timestamp() > 946_684_800);
            assert_eq!(stored.created_at(), stored.updated_at());

            let found = store.find_one("users", &field("_id").eq(id))?.unwrap();
            assert_eq!(found, stored);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_keeps_caller_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("companies", doc! { "_id": "acme", "code": "ACME" })?;
            store.insert("companies", doc! { "_id": 42, "code": "INIT" })?;

            let err = store.insert("companies", doc! { "_id": "acme", "code": "OTHER" }).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert!(err.message().contains("_id"));

            let err = store.insert("companies", doc! { "_id": true, "code": "X" }).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidDocument);

            assert_eq!(store.count("companies", &all())?, 2);
            assert!(store.find_one("companies", &field("_id").eq(42.0))?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_is_atomic() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert_many("employees", fake_employees(10, &["D1"]))?;

            let mut batch = vec![fake_employee(100, "D2"), fake_employee(101, "D2")];
            batch.push(fake_employee(100, "D3"));
            let err = store.insert_many("employees", batch).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            let batch = vec![fake_employee(200, "D2"), fake_employee(3, "D2")];
            let err = store.insert_many("employees", batch).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            assert_eq!(store.count("employees", &all())?, 10);
            assert_eq!(store.count("employees", &field("departmentId").eq("D2"))?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_holds_after_rejection() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("users", doc! { "email": "a@corp.io" })?;
            for _ in 0..3 {
                let err = store.insert("users", doc! { "email": "a@corp.io" }).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            }

            // missing and null values never conflict
            store.insert("users", doc! { "name": "no email" })?;
            store.insert("users", doc! { "name": "also none" })?;
            store.insert("users", doc! { "email": (Value::Null) })?;
            store.insert("users", doc! { "email": (Value::Null) })?;

            assert_eq!(store.count("users", &field("email").eq("a@corp.io"))?, 1);
            assert_eq!(store.count("users", &all())?, 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_embedded_value_ignores_field_order() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let batch = vec![
                doc! { "email": { "local": "asha", "domain": "corp.io" } },
                doc! { "email": { "domain": "corp.io", "local": "asha" } },
            ];
            let err = store.insert_many("users", batch).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(store.count("users", &all())?, 0);

            store.insert("users", doc! { "email": { "local": "asha", "domain": "corp.io" } })?;
            let err = store
                .insert_many("users", vec![doc! { "email": { "domain": "corp.io", "local": "asha" } }, doc! {}])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(store.count("users", &all())?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_look_alike_unique_values_are_distinct() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let stored = store.insert_many(
                "users",
                vec![doc! { "email": ["a", "b"] }, doc! { "email": ["a,s:b"] }],
            )?;
            assert_eq!(stored.len(), 2);

            let err = store.insert_many("users", vec![doc! { "email": ["a", "b"] }, doc! {}]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(store.count("users", &all())?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            for ratio in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
                let err = store.insert("departments", doc! { "ratio": ratio }).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidDocument);
            }
            let err = store
                .insert_many("departments", vec![doc! { "ratio": 0.5 }, doc! { "stats": { "max": (f64::INFINITY) } }])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidDocument);
            assert_eq!(store.count("departments", &all())?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_compound_unique_index() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("bonuses", doc! { "employeeNo": "E1", "year": 2024, "amount": 100 })?;
            store.insert("bonuses", doc! { "employeeNo": "E1", "year": 2025, "amount": 120 })?;
            store.insert("bonuses", doc! { "employeeNo": "E2", "year": 2024, "amount": 90 })?;

            let err = store
                .insert("bonuses", doc! { "employeeNo": "E1", "year": 2024, "amount": 1 })
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert!(err.message().contains("employeeNo, year"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_inserts_of_same_value_admit_one() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let threads = 16;
            let barrier = Arc::new(Barrier::new(threads));
            let admitted = Arc::new(AtomicUsize::new(0));
            let rejected = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..threads)
                .map(|i| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    let admitted = admitted.clone();
                    let rejected = rejected.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        match store.insert("users", doc! { "email": "race@corp.io", "thread": i }) {
                            Ok(_) => admitted.fetch_add(1, Ordering::SeqCst),
                            Err(e) => {
                                assert_eq!(e.kind(), &ErrorKind::DuplicateKey);
                                rejected.fetch_add(1, Ordering::SeqCst)
                            }
                        };
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(admitted.load(Ordering::SeqCst), 1);
            assert_eq!(rejected.load(Ordering::SeqCst), threads - 1);
            assert_eq!(store.count("users", &field("email").eq("race@corp.io"))?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_inserts_of_distinct_values() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let store = store.clone();
                    thread::spawn(move || {
                        for i in 0..25 {
                            store.insert("employees", fake_employee(t * 100 + i, "D1")).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(store.count("employees", &all())?, 200);
            Ok(())
        },
        cleanup,
    )
}
