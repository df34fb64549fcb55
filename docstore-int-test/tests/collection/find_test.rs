use chrono::{TimeZone, Utc};
use docstore::collection::{limit_to, order_by, skip_by, FindOptions};
use docstore::common::{SortOrder, Value};
use docstore::doc;
use docstore::errors::{ErrorKind, StoreResult};
use docstore::filter::{all, and, field, not, or, Filter};
use docstore::DocStore;
use docstore_int_test::test_util::{cleanup, create_test_context, is_sorted, run_test, string_values};

fn seed(store: &DocStore) -> StoreResult<()> {
    store.insert_many(
        "employees",
        vec![
            doc! {
                "employeeNo": "E1", "name": "Asha Rao", "departmentId": "D1", "annualSalary": 120000,
                "joinedAt": (Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap()),
                "address": { "city": "Pune" }, "skills": ["rust", "sql"]
            },
            doc! {
                "employeeNo": "E2", "name": "Ben Stone", "departmentId": "D2", "annualSalary": 90000.5,
                "joinedAt": (Utc.with_ymd_and_hms(2021, 7, 15, 0, 0, 0).unwrap()),
                "address": { "city": "Austin" }, "deletedAt": (Value::Null)
            },
            doc! {
                "employeeNo": "E3", "name": "Chen Li", "departmentId": "D1", "annualSalary": 150000,
                "joinedAt": (Utc.with_ymd_and_hms(2023, 1, 9, 0, 0, 0).unwrap())
            },
            doc! {
                "employeeNo": "E4", "name": "dana ross", "departmentId": "D3", "annualSalary": 60000,
                "deletedAt": (Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
            },
            doc! {
                "employeeNo": "E5", "name": "Eve Adams", "annualSalary": 120000
            },
        ],
    )?;
    Ok(())
}

fn numbers(store: &DocStore, filter: &Filter) -> StoreResult<Vec<String>> {
    let found = store.find("employees", filter, &FindOptions::new())?;
    Ok(string_values(&found, "employeeNo"))
}

#[test]
fn test_equality_and_membership() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            assert_eq!(numbers(&store, &field("departmentId").eq("D1"))?, vec!["E1", "E3"]);
            assert_eq!(numbers(&store, &field("annualSalary").eq(120000.0))?, vec!["E1", "E5"]);
            assert_eq!(numbers(&store, &field("address.city").eq("Pune"))?, vec!["E1"]);
            assert_eq!(numbers(&store, &field("departmentId").ne("D1"))?, vec!["E2", "E4", "E5"]);
            assert_eq!(numbers(&store, &field("departmentId").in_array(vec!["D2", "D3"]))?, vec!["E2", "E4"]);
            assert_eq!(
                numbers(&store, &field("departmentId").not_in_array(vec!["D1", "D2"]))?,
                vec!["E4", "E5"]
            );
            assert_eq!(numbers(&store, &all())?.len(), 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pattern_filters() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            assert_eq!(numbers(&store, &field("name").like("%ROSS%"))?, vec!["E4"]);
            assert_eq!(numbers(&store, &field("name").regex("^[A-C]")?)?, vec!["E1", "E2", "E3"]);
            assert_eq!(numbers(&store, &field("name").regex_case_insensitive("^d")?)?, vec!["E4"]);
            // non-string fields never match
            assert!(numbers(&store, &field("annualSalary").like("12"))?.is_empty());

            let err = field("name").regex("([").err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidFilter);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_range_and_exists() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            assert_eq!(numbers(&store, &field("annualSalary").gt(100000))?, vec!["E1", "E3", "E5"]);
            assert_eq!(numbers(&store, &field("annualSalary").lte(90000.5))?, vec!["E2", "E4"]);
            assert_eq!(
                numbers(&store, &field("joinedAt").gte("2021-01-01T00:00:00Z"))?,
                vec!["E2", "E3"]
            );
            assert_eq!(
                numbers(&store, &field("joinedAt").lt(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()))?,
                vec!["E1"]
            );
            assert_eq!(numbers(&store, &field("employeeNo").gt("E3"))?, vec!["E4", "E5"]);
            // a number never orders against a string
            assert!(numbers(&store, &field("name").gt(1))?.is_empty());

            assert_eq!(numbers(&store, &field("deletedAt").exists(true))?, vec!["E2", "E4"]);
            assert_eq!(numbers(&store, &field("deletedAt").exists(false))?, vec!["E1", "E3", "E5"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_logical_combinations() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let filter = or(vec![field("departmentId").eq("D2"), field("annualSalary").gte(150000)]);
            assert_eq!(numbers(&store, &filter)?, vec!["E2", "E3"]);

            let filter = and(vec![field("departmentId").eq("D1"), not(field("annualSalary").gt(130000))]);
            assert_eq!(numbers(&store, &filter)?, vec!["E1"]);

            let parsed = Filter::parse(&doc! {
                "$or": [
                    { "departmentId": "D3" },
                    { "annualSalary": { "$gte": 150000 } }
                ],
                "deletedAt": { "$exists": false }
            })?;
            assert_eq!(numbers(&store, &parsed)?, vec!["E3"]);

            let parsed = Filter::parse(&doc! {
                "annualSalary": { "$not": { "$gt": 100000 } },
                "name": { "$regex": "^b", "$options": "i" }
            })?;
            assert_eq!(numbers(&store, &parsed)?, vec!["E2"]);

            let parsed = Filter::parse(&doc! { "$nor": [{ "departmentId": "D1" }, { "departmentId": "D2" }] })?;
            assert_eq!(numbers(&store, &parsed)?, vec!["E4", "E5"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_is_stable_and_missing_sorts_first() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;

            let found = store.find("employees", &all(), &order_by("annualSalary", SortOrder::Descending))?;
            // E1 and E5 tie and keep insertion order
            assert_eq!(string_values(&found, "employeeNo"), vec!["E3", "E1", "E5", "E2", "E4"]);

            let found = store.find("employees", &all(), &order_by("departmentId", SortOrder::Ascending))?;
            assert_eq!(string_values(&found, "employeeNo"), vec!["E5", "E1", "E3", "E2", "E4"]);

            let options = order_by("departmentId", SortOrder::Ascending).sort_by("annualSalary", SortOrder::Descending);
            let found = store.find("employees", &all(), &options)?;
            assert_eq!(string_values(&found, "employeeNo"), vec!["E5", "E3", "E1", "E2", "E4"]);

            let names = string_values(
                &store.find("employees", &all(), &order_by("name", SortOrder::Ascending))?,
                "name",
            );
            assert!(is_sorted(names.iter(), true));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pagination_math() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let docs = (0..23).map(|i| doc! { "employeeNo": (format!("E{:02}", i)), "n": i }).collect();
            store.insert_many("employees", docs)?;

            let page_size = 10;
            let mut seen = Vec::new();
            for page in 0..3 {
                let options = order_by("n", SortOrder::Ascending).skip(page * page_size).limit(page_size);
                let found = store.find("employees", &all(), &options)?;
                assert_eq!(found.len(), if page < 2 { 10 } else { 3 });
                seen.extend(string_values(&found, "employeeNo"));
            }
            assert_eq!(seen.len(), 23);
            assert!(is_sorted(seen.iter(), true));

            assert!(store.find("employees", &all(), &skip_by(23))?.is_empty());
            assert!(store.find("employees", &all(), &skip_by(100).limit(5))?.is_empty());
            assert!(store.find("employees", &all(), &limit_to(0))?.is_empty());

            let page = store.find("employees", &field("n").gte(5), &skip_by(2).limit(2))?;
            assert_eq!(string_values(&page, "employeeNo"), vec!["E07", "E08"]);
            Ok(())
        },
        cleanup,
    )
}
