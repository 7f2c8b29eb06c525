// Integration tests for running pipelines through an executor
use anyhow::anyhow;
use ironpipe_core::stages::{LimitOptions, MatchOptions};
use ironpipe_core::{AsyncExecutor, Executor, IronPipeError, Pipeline};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Records every call and answers with canned documents
#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    fail: bool,
}

impl RecordingExecutor {
    fn failing() -> Self {
        RecordingExecutor {
            fail: true,
            ..Default::default()
        }
    }

    fn respond(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.calls
            .lock()
            .push((collection.to_string(), pipeline.to_vec()));
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        Ok(vec![json!({"_id": 1, "title": "Dune"})])
    }
}

impl Executor for RecordingExecutor {
    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.respond(collection, pipeline)
    }
}

#[async_trait::async_trait]
impl AsyncExecutor for RecordingExecutor {
    async fn aggregate(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.respond(collection, pipeline)
    }
}

fn active_books() -> Pipeline {
    let mut pipeline = Pipeline::new().with_collection("books");
    pipeline
        .match_(MatchOptions {
            query: json!({"status": "active"}).as_object().cloned(),
            ..Default::default()
        })
        .unwrap()
        .limit(LimitOptions { value: 1 })
        .unwrap();
    pipeline
}

#[test]
fn test_run_hands_export_to_executor() {
    let executor = Arc::new(RecordingExecutor::default());
    let pipeline = active_books().with_executor(executor.clone());

    let documents = pipeline.run().unwrap();
    assert_eq!(documents, vec![json!({"_id": 1, "title": "Dune"})]);

    let calls = executor.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "books");
    assert_eq!(calls[0].1, pipeline.export());
}

#[test]
fn test_run_without_collection() {
    let mut pipeline = Pipeline::new().with_executor(Arc::new(RecordingExecutor::default()));
    pipeline.limit(LimitOptions { value: 1 }).unwrap();
    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, IronPipeError::MissingPrerequisite("collection")));
}

#[test]
fn test_run_without_executor() {
    let err = active_books().run().unwrap_err();
    assert_eq!(err.to_string(), "db is not defined");
}

#[test]
fn test_executor_error_propagates_unchanged() {
    let executor = Arc::new(RecordingExecutor::failing());
    let err = active_books().with_executor(executor).run().unwrap_err();
    match err {
        IronPipeError::Execution(inner) => assert_eq!(inner.to_string(), "connection refused"),
        other => panic!("expected execution error, got {:?}", other),
    }
}

#[test]
fn test_export_does_not_touch_executor() {
    let executor = Arc::new(RecordingExecutor::default());
    let pipeline = active_books().with_executor(executor.clone());
    pipeline.export();
    assert!(executor.calls.lock().is_empty());
}

#[tokio::test]
async fn test_run_async() {
    let executor = Arc::new(RecordingExecutor::default());
    let pipeline = active_books().with_async_executor(executor.clone());

    let documents = pipeline.run_async().await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(executor.calls.lock()[0].1, pipeline.export());
}

#[tokio::test]
async fn test_run_async_without_handle() {
    let pipeline = active_books().with_executor(Arc::new(RecordingExecutor::default()));
    let err = pipeline.run_async().await.unwrap_err();
    assert!(matches!(err, IronPipeError::MissingPrerequisite("db")));
}
