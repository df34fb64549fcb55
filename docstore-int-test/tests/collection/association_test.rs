use docstore::association::{resolve, AssociationDescriptor, DocumentSource};
use docstore::collection::{Document, FindOptions};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::{ErrorKind, StoreResult};
use docstore::filter::{all, field, Filter};
use docstore::DocStore;
use docstore_int_test::test_util::{cleanup, create_test_context, run_test};
use std::cell::RefCell;

struct RecordingSource {
    store: DocStore,
    lookups: RefCell<Vec<String>>,
}

impl RecordingSource {
    fn new(store: DocStore) -> Self {
        RecordingSource {
            store,
            lookups: RefCell::new(Vec::new()),
        }
    }
}

impl DocumentSource for RecordingSource {
    fn has_collection(&self, name: &str) -> bool {
        self.store.has_collection(name)
    }

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.lookups.borrow_mut().push(collection.to_string());
        self.store.find(collection, filter, options)
    }
}

fn seed(store: &DocStore) -> StoreResult<()> {
    store.insert_many(
        "companies",
        vec![
            doc! { "_id": "C1", "code": "ACME", "name": "Acme" },
            doc! { "_id": "C2", "code": "INIT", "name": "Initech" },
        ],
    )?;
    store.insert_many(
        "departments",
        vec![
            doc! { "_id": "D1", "name": "Engineering", "companyCode": "ACME" },
            doc! { "_id": "D2", "name": "Sales", "companyCode": "INIT" },
            doc! { "_id": "D3", "name": "Legal", "companyCode": "GONE" },
        ],
    )?;
    store.insert_many(
        "employees",
        vec![
            doc! { "employeeNo": "E1", "departmentId": "D1", "projects": ["D2", "D3"] },
            doc! { "employeeNo": "E2", "departmentId": "D2", "projects": ["D9", "D1"] },
            doc! { "employeeNo": "E3", "departmentId": (Value::Null), "projects": [] },
            doc! { "employeeNo": "E4" },
        ],
    )?;
    Ok(())
}

#[test]
fn test_resolve_through_store() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let rows = store.find("employees", &all(), &FindOptions::new())?;
            let descriptor = AssociationDescriptor::new("employees", "departmentId", "departments", "department");
            let resolved = store.resolve(rows, &[descriptor])?;

            assert_eq!(resolved.len(), 4);
            assert_eq!(resolved[0].get("department.name"), Some(&Value::from("Engineering")));
            assert_eq!(resolved[1].get("department.name"), Some(&Value::from("Sales")));
            assert_eq!(resolved[2].get("department"), Some(&Value::Null));
            assert_eq!(resolved[3].get("department"), Some(&Value::Null));

            // results are not written back
            let stored = store.find_one("employees", &field("employeeNo").eq("E1"))?.unwrap();
            assert!(!stored.contains_field("department"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_array_foreign_keys_skip_dangling() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let source = RecordingSource::new(store.clone());
            let rows = store.find("employees", &all(), &FindOptions::new())?;
            let descriptor = AssociationDescriptor::new("employees", "projects", "departments", "projectDepartments");
            let resolved = resolve(&source, rows, &[descriptor])?;

            assert_eq!(source.lookups.borrow().len(), 1);

            let ids = |doc: &Document| -> Vec<Value> {
                doc.get("projectDepartments")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.as_document().and_then(|d| d.id()).cloned())
                            .collect()
                    })
                    .unwrap_or_default()
            };
            assert_eq!(ids(&resolved[0]), vec![Value::from("D2"), Value::from("D3")]);
            assert_eq!(ids(&resolved[1]), vec![Value::from("D1")]);
            assert_eq!(resolved[2].get("projectDepartments"), Some(&Value::Array(vec![])));
            assert_eq!(resolved[3].get("projectDepartments"), Some(&Value::Null));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_target_field_and_chained_descriptors() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let source = RecordingSource::new(store.clone());
            let rows = store.find("departments", &all(), &FindOptions::new())?;
            let descriptors = [
                AssociationDescriptor::new("departments", "companyCode", "companies", "company").target_field("code"),
                AssociationDescriptor::new("departments", "_id", "employees", "lead").target_field("departmentId"),
            ];
            let resolved = resolve(&source, rows, &descriptors)?;

            assert_eq!(*source.lookups.borrow(), vec!["companies".to_string(), "employees".to_string()]);
            assert_eq!(resolved[0].get("company.name"), Some(&Value::from("Acme")));
            assert_eq!(resolved[1].get("company.name"), Some(&Value::from("Initech")));
            assert_eq!(resolved[2].get("company"), Some(&Value::Null));
            assert_eq!(resolved[0].get("lead.employeeNo"), Some(&Value::from("E1")));
            assert_eq!(resolved[2].get("lead"), Some(&Value::Null));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_results_and_undeclared_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let source = RecordingSource::new(store.clone());
            let descriptor = AssociationDescriptor::new("employees", "departmentId", "departments", "department");
            let resolved = resolve(&source, Vec::new(), &[descriptor])?;
            assert!(resolved.is_empty());
            assert_eq!(source.lookups.borrow().len(), 1);

            let rows = store.find("employees", &all(), &FindOptions::new())?;
            let descriptors = [
                AssociationDescriptor::new("employees", "departmentId", "departments", "department"),
                AssociationDescriptor::new("employees", "projectId", "projects", "project"),
            ];
            let source = RecordingSource::new(store.clone());
            let err = resolve(&source, rows, &descriptors).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);
            // nothing is fetched before every descriptor checks out
            assert!(source.lookups.borrow().is_empty());
            Ok(())
        },
        cleanup,
    )
}
