//! The execution collaborator boundary.
//!
//! The engine never talks to a database directly; it hands compiled SQL
//! text to a [`Connection`] and receives rows back. This is the only
//! asynchronous point of the whole pipeline. Failures pass through
//! unchanged — retry policy, timeouts and cancellation belong to the
//! implementation behind this trait.

use async_trait::async_trait;
use thiserror::Error;

/// One result row: a mapping that exposes at least the agreed JSON-text
/// field (`response` for the main query, `count` for the count query).
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConnectionError {
    #[error("Query execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Query execution aborted: {0}")]
    ExecutionAborted(String),
}

/// Executes one read-only SQL statement and returns its rows.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, ConnectionError>;
}
