use litedoc::collection::{CollectionRef, Document};
use litedoc::doc;
use litedoc::errors::DocResult;
use litedoc::litedoc::LiteDoc;
use litedoc_rusqlite_adapter::RusqliteModule;
use std::future::Future;
use std::time::{Duration, Instant};
use std::{env, fs};

/// Runs a test against a fresh database and always cleans it up.
///
/// The context is created by `create_test_context` and handed to `test`,
/// which runs as its own task so a panicking assertion is caught like a
/// returned error. The database is removed afterwards in every case, then
/// the original panic is resumed or the error reported.
pub async fn run_test<T, F>(test: T)
where
    T: FnOnce(TestContext) -> F,
    F: Future<Output = DocResult<()>> + Send + 'static,
{
    let start_time = Instant::now();
    let ctx = match create_test_context() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = tokio::spawn(test(ctx.clone())).await;
    let after_result = cleanup(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!(
                "\n========== Test Failed (took {:?}) ==========",
                start_time.elapsed()
            );
            panic!("Test failed: {:?}", e);
        }
        Err(join_error) if join_error.is_panic() => {
            eprintln!(
                "\n========== Test Panicked (took {:?}) ==========",
                start_time.elapsed()
            );
            std::panic::resume_unwind(join_error.into_panic());
        }
        Err(join_error) => panic!("Test task failed: {:?}", join_error),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: LiteDoc,
}

impl TestContext {
    pub fn new(path: String, db: LiteDoc) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> LiteDoc {
        self.db.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir
        .join(format!("litedoc-{}.db", id))
        .to_string_lossy()
        .to_string()
}

#[cfg(feature = "file")]
pub fn create_test_context() -> DocResult<TestContext> {
    let path = random_path();

    let storage_module = RusqliteModule::with_config()
        .production_preset()
        .db_path(&path)
        .build();

    let db = LiteDoc::builder().load_module(storage_module).open()?;
    Ok(TestContext::new(path, db))
}

#[cfg(all(feature = "memory", not(feature = "file")))]
pub fn create_test_context() -> DocResult<TestContext> {
    let path = random_path();

    let storage_module = RusqliteModule::with_config().test_preset().build();

    let db = LiteDoc::builder().load_module(storage_module).open()?;
    Ok(TestContext::new(path, db))
}

pub fn cleanup(ctx: TestContext) -> DocResult<()> {
    ctx.db().close()?;

    // a file database leaves its journal files next to it in WAL mode
    for suffix in ["", "-wal", "-shm"] {
        let file = format!("{}{}", ctx.path(), suffix);
        match fs::remove_file(&file) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => eprintln!("Warning: Failed to remove test file {}: {:?}", file, e),
        }
    }
    Ok(())
}

pub fn create_people() -> Vec<Document> {
    vec![
        doc! { "id": "john", "name": "John", "age": 42, "address": { "city": "Boston" } },
        doc! { "id": "kennedy", "name": "Kennedy", "age": 35, "address": { "city": "Austin" } },
        doc! { "id": "sita", "name": "Sita", "age": 28, "address": { "city": "Delhi" } },
        doc! { "id": "maya", "name": "Maya", "age": 61, "address": { "city": "Austin" } },
    ]
}

/// Puts every document from `create_people` into `collection`.
pub async fn insert_people(collection: &CollectionRef) -> DocResult<()> {
    for person in create_people() {
        let id = person
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .unwrap_or_default();
        collection.doc(&id).put(person).await?;
    }
    Ok(())
}

/// Puts `count` documents with ids `p1..=pN` and ages `1..=N`.
pub async fn insert_numbered(collection: &CollectionRef, count: u64) -> DocResult<()> {
    for age in 1..=count {
        collection
            .doc(&format!("p{}", age))
            .put(doc! { "name": format!("person {}", age), "age": age })
            .await?;
    }
    Ok(())
}

/// Polls `check` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
