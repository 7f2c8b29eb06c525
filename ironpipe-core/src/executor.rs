// src/executor.rs
// Execution collaborators: whatever actually talks to the database

use serde_json::Value;

/// Blocking database handle
///
/// Receives exactly the output of [`Pipeline::export`](crate::Pipeline::export).
/// Errors are returned to the caller untouched as
/// [`IronPipeError::Execution`](crate::IronPipeError::Execution).
pub trait Executor: Send + Sync {
    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>>;
}

/// Async database handle
#[async_trait::async_trait]
pub trait AsyncExecutor: Send + Sync {
    async fn aggregate(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>>;
}

impl<F> Executor for F
where
    F: Fn(&str, &[Value]) -> anyhow::Result<Vec<Value>> + Send + Sync,
{
    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> anyhow::Result<Vec<Value>> {
        self(collection, pipeline)
    }
}
