use docstore::collection::{CollectionSchema, Document};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::StoreResult;
use docstore::DocStore;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{env, fs, thread};

/// Runs a test between `before` and `after`, retrying a failed attempt.
/// `after` runs even when the test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StoreResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 2;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx).map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();
        let error = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                if !bt.is_empty() && !bt.contains("disabled") {
                    eprintln!("Backtrace:\n{}", bt);
                }
                e
            }
            Err(panic_err) => {
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        eprintln!(
            "\n========== Test Attempt {}/{} Failed (took {:?}) ==========\n{}",
            attempt, MAX_RETRIES, elapsed, error
        );
        last_error = Some(error);
        if attempt < MAX_RETRIES {
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A store opened over its own temp directory.
#[derive(Clone)]
pub struct TestContext {
    path: PathBuf,
    store: DocStore,
}

impl TestContext {
    pub fn new(path: PathBuf, store: DocStore) -> Self {
        Self { path, store }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> DocStore {
        self.store.clone()
    }

    /// Closes the current store and opens the same directory again.
    pub fn reopen(&self) -> StoreResult<DocStore> {
        self.store.close()?;
        open_store(&self.path)
    }

    pub fn log_path(&self, collection: &str) -> PathBuf {
        self.path.join(format!("{}.jsonl", collection))
    }
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("docstore-it-{}", id.simple()))
}

/// The collections of the HR application the tests model.
pub fn hr_schemas() -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::new("users").unique_index("email"),
        CollectionSchema::new("companies").unique_index("code"),
        CollectionSchema::new("departments"),
        CollectionSchema::new("employees")
            .unique_index("employeeNo")
            .index("departmentId"),
        CollectionSchema::new("bonuses").unique_compound_index(&["employeeNo", "year"]),
    ]
}

pub fn open_store(path: &Path) -> StoreResult<DocStore> {
    hr_schemas()
        .into_iter()
        .fold(DocStore::builder().data_dir(path), |builder, schema| builder.collection(schema))
        .io_retry_backoff(Duration::from_millis(1))
        .open()
}

pub fn create_test_context() -> StoreResult<TestContext> {
    let path = random_path();
    let store = open_store(&path)?;
    Ok(TestContext::new(path, store))
}

pub fn cleanup(ctx: TestContext) -> StoreResult<()> {
    ctx.store.close()?;
    if ctx.path.exists() {
        fs::remove_dir_all(&ctx.path)?;
    }
    Ok(())
}

/// An employee with generated personal data.
pub fn fake_employee(no: usize, department_id: &str) -> Document {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let salary: i64 = (30_000..200_000).fake();
    doc! {
        "employeeNo": (format!("E{:04}", no)),
        "name": name,
        "email": email,
        "departmentId": department_id,
        "annualSalary": salary,
        "status": 1,
    }
}

/// `count` employees spread round-robin over `departments`.
pub fn fake_employees(count: usize, departments: &[&str]) -> Vec<Document> {
    (0..count)
        .map(|i| fake_employee(i, departments[i % departments.len()]))
        .collect()
}

pub fn string_values(documents: &[Document], field: &str) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.get(field).and_then(Value::as_str).map(str::to_string))
        .collect()
}

pub fn is_sorted<T: Ord>(iterable: impl IntoIterator<Item = T>, ascending: bool) -> bool {
    let items: Vec<T> = iterable.into_iter().collect();
    items.windows(2).all(|w| if ascending { w[0] <= w[1] } else { w[0] >= w[1] })
}
