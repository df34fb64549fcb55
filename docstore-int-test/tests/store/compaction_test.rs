use docstore::collection::{just_once, remove_one, CollectionSchema, FindOptions, UpdatePatch};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::StoreResult;
use docstore::filter::{all, field};
use docstore::DocStore;
use docstore_int_test::test_util::{cleanup, create_test_context, fake_employee, fake_employees, run_test};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|content| content.lines().filter(|line| !line.trim().is_empty()).count())
        .unwrap_or(0)
}

fn log_of(dir: &Path) -> PathBuf {
    dir.join("employees.jsonl")
}

fn open_with<F>(dir: &Path, configure: F) -> StoreResult<DocStore>
where
    F: FnOnce(docstore::DocStoreBuilder) -> docstore::DocStoreBuilder,
{
    configure(
        DocStore::builder()
            .data_dir(dir)
            .io_retry_backoff(Duration::from_millis(1))
            .collection(CollectionSchema::new("employees").unique_index("employeeNo")),
    )
    .open()
}

#[test]
fn test_threshold_compaction() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.store().close()?;
            let dir = ctx.path().join("threshold");
            let store = open_with(&dir, |b| b.compaction_threshold(5).compact_on_close(false))?;

            for i in 0..5 {
                store.insert("employees", fake_employee(i, "D1"))?;
            }
            assert_eq!(line_count(&log_of(&dir)), 5);

            store.insert("employees", fake_employee(5, "D1"))?;
            assert_eq!(line_count(&log_of(&dir)), 1);

            store.insert("employees", fake_employee(6, "D1"))?;
            assert_eq!(line_count(&log_of(&dir)), 2);
            assert_eq!(store.count("employees", &all())?, 7);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_manual_compaction_preserves_state() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert_many("employees", fake_employees(12, &["D1", "D2", "D3"]))?;
            store.update(
                "employees",
                &field("departmentId").eq("D2"),
                &UpdatePatch::new().set("status", 0),
                &docstore::collection::update_all(),
            )?;
            store.remove("employees", &field("employeeNo").eq("E0000"), &remove_one())?;
            store.insert("employees", doc! { "employeeNo": "E0500", "departmentId": "D1" })?;
            let expected = store.find("employees", &all(), &FindOptions::new())?;
            assert_eq!(line_count(&ctx.log_path("employees")), 4);

            store.compact()?;
            assert_eq!(line_count(&ctx.log_path("employees")), 1);
            assert_eq!(store.find("employees", &all(), &FindOptions::new())?, expected);

            // the compacted log keeps taking appends
            store.update(
                "employees",
                &field("employeeNo").eq("E0500"),
                &UpdatePatch::new().set("grade", "L3"),
                &just_once(),
            )?;
            assert_eq!(line_count(&ctx.log_path("employees")), 2);

            let reopened = ctx.reopen()?;
            let found = reopened.find_one("employees", &field("employeeNo").eq("E0500"))?.unwrap();
            assert_eq!(found.get("grade"), Some(&Value::from("L3")));
            assert_eq!(reopened.count("employees", &all())?, expected.len());
            assert_eq!(reopened.count("employees", &field("status").eq(0))?, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_compaction_of_emptied_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert_many("employees", fake_employees(3, &["D1"]))?;
            store.remove("employees", &all(), &docstore::collection::remove_all())?;
            store.compact()?;
            assert_eq!(line_count(&ctx.log_path("employees")), 0);

            let reopened = ctx.reopen()?;
            assert_eq!(reopened.count("employees", &all())?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_close_and_startup_compaction() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.store().close()?;
            let dir = ctx.path().join("lifecycle");

            let store = open_with(&dir, |b| b.compact_on_close(false))?;
            for i in 0..4 {
                store.insert("employees", fake_employee(i, "D1"))?;
            }
            store.close()?;
            assert_eq!(line_count(&log_of(&dir)), 4);

            // a log with more than one record is compacted when loaded
            let store = open_with(&dir, |b| b)?;
            assert_eq!(line_count(&log_of(&dir)), 1);
            store.insert("employees", fake_employee(10, "D1"))?;
            assert_eq!(line_count(&log_of(&dir)), 2);

            store.close()?;
            assert_eq!(line_count(&log_of(&dir)), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_periodic_compaction() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.store().close()?;
            let dir = ctx.path().join("periodic");
            let store = open_with(&dir, |b| b.compaction_interval(Duration::from_millis(50)))?;

            for i in 0..6 {
                store.insert("employees", fake_employee(i, "D1"))?;
            }
            let log = log_of(&dir);
            awaitility::at_most(Duration::from_secs(5)).until(|| line_count(&log) == 1);

            assert_eq!(store.count("employees", &all())?, 6);
            store.close()?;
            let reopened = open_with(&dir, |b| b)?;
            assert_eq!(reopened.count("employees", &all())?, 6);
            Ok(())
        },
        cleanup,
    )
}
