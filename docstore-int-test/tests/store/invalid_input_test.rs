use docstore::aggregate::Pipeline;
use docstore::collection::{just_once, remove_all, CollectionSchema, Document, FindOptions, UpdatePatch};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, field, Filter};
use docstore::DocStore;
use docstore_int_test::test_util::{cleanup, create_test_context, random_path, run_test};
use std::time::Duration;

fn kind_of<T>(result: docstore::errors::StoreResult<T>) -> ErrorKind {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(err) => err.kind().clone(),
    }
}

#[test]
fn test_invalid_filters() {
    let filters = vec![
        doc! { "age": { "$between": [1, 2] } },
        doc! { "dept": { "$in": "D1" } },
        doc! { "deletedAt": { "$exists": "no" } },
        doc! { "$or": { "dept": "D1" } },
        doc! { "$xor": [{ "dept": "D1" }] },
        doc! { "name": { "$regex": "([" } },
        doc! { "name": { "$like": "%a%", "$options": "i" } },
        doc! { "age": { "$not": 3 } },
    ];
    for filter in filters {
        assert_eq!(kind_of(Filter::parse(&filter)), ErrorKind::InvalidFilter, "{}", filter);
    }
}

#[test]
fn test_invalid_patches() {
    let patches = vec![
        doc! {},
        doc! { "$set": { "status": 0 }, "grade": "L5" },
        doc! { "$rename": { "status": "state" } },
        doc! { "$set": "status" },
        doc! { "$inc": { "revision": "one" } },
        doc! { "$set": { "_id": "E2" } },
        doc! { "$unset": { "createdAt": "" } },
        doc! { "$set": { "meta": { "$bad": 1 } } },
    ];
    for patch in patches {
        assert_eq!(kind_of(UpdatePatch::parse(&patch)), ErrorKind::InvalidUpdate, "{}", patch);
    }
}

#[test]
fn test_invalid_pipelines() {
    let pipelines = vec![
        vec![doc! { "$match": { "a": 1 }, "$limit": 1 }],
        vec![doc! { "$project": { "a": 1 } }],
        vec![doc! { "$skip": (-1) }],
        vec![doc! { "$limit": "ten" }],
        vec![doc! { "$sort": { "a": 2 } }],
        vec![doc! { "$sort": {} }],
        vec![doc! { "$group": { "total": { "$sum": "a" } } }],
        vec![doc! { "$group": { "_id": "dept", "total": { "$median": "a" } } }],
        vec![doc! { "$group": { "_id": "dept", "total": { "$sum": "a", "$avg": "a" } } }],
        vec![doc! { "$group": { "_id": "dept", "total": { "$avg": 5 } } }],
        vec![doc! { "$group": { "_id": 5 } }],
        vec![doc! { "$match": "all" }],
    ];
    for stages in pipelines {
        assert_eq!(kind_of(Pipeline::parse(&stages)), ErrorKind::InvalidPipeline, "{:?}", stages);
    }
    // a malformed filter inside $match keeps its own kind
    assert_eq!(
        kind_of(Pipeline::parse(&[doc! { "$match": { "a": { "$foo": 1 } } }])),
        ErrorKind::InvalidFilter
    );
}

#[test]
fn test_invalid_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let separator: Document = vec![("a.b".to_string(), Value::from(1))].into_iter().collect();
            let empty_key: Document = vec![(String::new(), Value::from(1))].into_iter().collect();
            let nested = doc! { "profile": { "$where": "x" } };
            let in_array = doc! { "tags": [{ "$k": 1 }] };
            let bad_id = doc! { "_id": { "nested": true } };
            let empty_id = doc! { "_id": "" };

            for document in [separator, empty_key, nested, in_array, bad_id, empty_id] {
                assert_eq!(kind_of(store.insert("departments", document)), ErrorKind::InvalidDocument);
            }
            assert_eq!(store.count("departments", &all())?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_undeclared_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            assert!(!store.has_collection("projects"));
            assert_eq!(kind_of(store.insert("projects", doc! { "a": 1 })), ErrorKind::CollectionNotFound);
            assert_eq!(
                kind_of(store.find("projects", &all(), &FindOptions::new())),
                ErrorKind::CollectionNotFound
            );
            assert_eq!(kind_of(store.count("projects", &all())), ErrorKind::CollectionNotFound);
            assert_eq!(
                kind_of(store.remove("projects", &all(), &remove_all())),
                ErrorKind::CollectionNotFound
            );
            assert_eq!(kind_of(store.collection("projects")), ErrorKind::CollectionNotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_configuration() {
    let path = random_path();
    let cases = vec![
        DocStore::builder().compaction_threshold(0),
        DocStore::builder().compaction_interval(Duration::ZERO),
        DocStore::builder().io_retry_attempts(0),
        DocStore::builder().write_queue_bound(0),
        DocStore::builder().data_dir(""),
        DocStore::builder().collection(CollectionSchema::new("bad name")),
        DocStore::builder().collection(CollectionSchema::new("")),
        DocStore::builder().collection(CollectionSchema::new("users").unique_index("")),
        DocStore::builder().collection(CollectionSchema::new("users").unique_index("email").index("email")),
    ];
    for builder in cases {
        assert_eq!(kind_of(builder.data_dir(&path).open()), ErrorKind::InvalidConfiguration);
    }

    let duplicate = DocStore::builder()
        .collection(CollectionSchema::new("users"))
        .collection(CollectionSchema::new("users"))
        .open();
    assert_eq!(kind_of(duplicate), ErrorKind::CollectionAlreadyDeclared);

    // the first error wins over later ones
    let first = DocStore::builder()
        .write_queue_bound(0)
        .collection(CollectionSchema::new("users"))
        .collection(CollectionSchema::new("users"))
        .open();
    assert_eq!(kind_of(first), ErrorKind::InvalidConfiguration);
    assert!(!path.exists());
}

#[test]
fn test_calls_after_close() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("departments", doc! { "_id": "D1" })?;
            let departments = store.collection("departments")?;
            store.close()?;
            store.close()?;
            assert!(store.is_closed());
            assert!(departments.is_closed());

            let closed = ErrorKind::StoreAlreadyClosed;
            assert_eq!(kind_of(store.insert("departments", doc! { "_id": "D2" })), closed);
            assert_eq!(kind_of(store.find("departments", &all(), &FindOptions::new())), closed);
            assert_eq!(kind_of(store.count("departments", &all())), closed);
            assert_eq!(
                kind_of(store.update(
                    "departments",
                    &field("_id").eq("D1"),
                    &UpdatePatch::new().set("a", 1),
                    &just_once()
                )),
                closed
            );
            assert_eq!(kind_of(store.aggregate("departments", &Pipeline::new())), closed);
            assert_eq!(kind_of(store.compact()), closed);
            assert_eq!(kind_of(store.resolve(vec![], &[])), closed);
            assert_eq!(kind_of(departments.insert(doc! { "_id": "D3" })), closed);
            assert_eq!(kind_of(departments.find_one(&all())), closed);
            Ok(())
        },
        cleanup,
    )
}
