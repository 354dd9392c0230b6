//! SQLite query generation.
//!
//! Turns a [`QueryGraph`] into one SQL statement whose single result row
//! carries a JSON document matching the requested nesting shape, built from
//! SQLite's JSON1 primitives (`json_object`, `json_group_array`,
//! `json_patch`). Compilation is synchronous, pure and all-or-nothing: no
//! partial SQL is ever returned.

pub mod errors;
mod fields;
mod joins;
mod node_resolver;
mod options;
mod root_resolver;

pub use errors::SqliteQueryGeneratorError;
pub use options::STATIC_FILTER_NAME;

use serde_json::Value;

use crate::query_graph::QueryGraph;
use crate::schema_catalog::SchemaRegistry;

/// Row field carrying the nested JSON document.
pub const RESPONSE_FIELD: &str = "response";
/// Row field carrying the total-count value.
pub const COUNT_FIELD: &str = "count";
/// Synthetic boolean field flagging rows matched by a node's own filter.
pub const MATCH_FLAG_FIELD: &str = "_match";
/// Column-name prefix of grouped-id arrays (`id_<key>`).
pub const GROUP_ID_PREFIX: &str = "id_";

/// Runtime inputs that shape compilation: filter values, paging overrides
/// and the locale column suffix.
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    /// Filter values keyed by logical filter name.
    pub filters: serde_json::Map<String, Value>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// Pre-resolved via [`crate::locale::column_suffix`].
    pub locale_suffix: String,
}

/// Shared compilation context.
pub(crate) struct Cx<'a> {
    pub graph: &'a QueryGraph,
    pub registry: &'a SchemaRegistry,
    pub args: &'a CompileArgs,
}

/// Compile the main nested query.
pub fn build_query(
    graph: &QueryGraph,
    registry: &SchemaRegistry,
    args: &CompileArgs,
) -> Result<String, SqliteQueryGeneratorError> {
    let cx = Cx { graph, registry, args };
    let sql = root_resolver::render_query(&cx)?;
    log::debug!("Compiled nested query: {}", sql);
    Ok(sql)
}

/// Compile the companion count query.
pub fn build_count_query(
    graph: &QueryGraph,
    registry: &SchemaRegistry,
    args: &CompileArgs,
) -> Result<String, SqliteQueryGeneratorError> {
    let cx = Cx { graph, registry, args };
    let sql = root_resolver::render_count_query(&cx)?;
    log::debug!("Compiled count query: {}", sql);
    Ok(sql)
}
