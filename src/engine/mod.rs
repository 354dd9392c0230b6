//! The query engine facade.
//!
//! Owns the schema registry, the named query definitions and the execution
//! collaborator, and drives the full pipeline per request:
//! specification -> graph -> SQL -> execute -> decode. A paginated request
//! on its first page additionally runs the companion count statement and
//! attaches the total; the two statements have no data dependency, but are
//! serialized main-first so collaborators without concurrent-use guarantees
//! stay safe.

pub mod connection;
pub mod errors;

pub use connection::{Connection, ConnectionError, Row};
pub use errors::EngineError;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::locale;
use crate::query_graph::QueryGraph;
use crate::response::{decode_rows, DecodeContext};
use crate::schema_catalog::SchemaRegistry;
use crate::sqlite_query_generator::{build_count_query, build_query, CompileArgs, COUNT_FIELD};

const DEFAULT_PAGE: u64 = 1;

/// Runtime arguments of a single `find_*` call. Unknown top-level keys are
/// collected as filter values by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueryArgs {
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// `Some(false)` suppresses the count statement entirely.
    pub count: Option<bool>,
    pub locale: Option<String>,
    /// Highlight terms applied during decoding.
    #[serde(rename = "htm")]
    pub highlight: Vec<String>,
    #[serde(flatten)]
    pub filters: serde_json::Map<String, Value>,
}

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.filters.insert(name.into(), value);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_highlight(mut self, terms: Vec<String>) -> Self {
        self.highlight = terms;
        self
    }
}

/// Decoded query response: one typed object per record, plus the total
/// count when it was requested on the first page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResponse {
    pub rows: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    /// Rows dropped by decode failures (already logged).
    #[serde(skip)]
    pub failed_rows: usize,
}

pub struct Engine {
    registry: Arc<SchemaRegistry>,
    queries: HashMap<String, Value>,
    connection: Arc<dyn Connection>,
}

impl Engine {
    pub fn new(registry: SchemaRegistry, connection: Arc<dyn Connection>) -> Self {
        Engine {
            registry: Arc::new(registry),
            queries: HashMap::new(),
            connection,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Register a named query specification. The graph is built once here
    /// so malformed specifications fail at definition time, not per call.
    pub fn define_query(&mut self, name: impl Into<String>, spec: Value) -> Result<(), EngineError> {
        QueryGraph::build(&spec, &self.registry)?;
        self.queries.insert(name.into(), spec);
        Ok(())
    }

    /// Run a named query and return every matching record (paged when the
    /// arguments or the specification say so).
    pub async fn find_all(&self, name: &str, args: QueryArgs) -> Result<QueryResponse, EngineError> {
        self.run(name, args).await
    }

    /// Run a named query capped to a single record.
    pub async fn find_one(&self, name: &str, mut args: QueryArgs) -> Result<QueryResponse, EngineError> {
        args.size = Some(1);
        self.run(name, args).await
    }

    async fn run(&self, name: &str, args: QueryArgs) -> Result<QueryResponse, EngineError> {
        let spec = self
            .queries
            .get(name)
            .ok_or_else(|| EngineError::UnknownQuery(name.to_string()))?;
        let graph = QueryGraph::build(spec, &self.registry)?;
        let page = args.page.unwrap_or(DEFAULT_PAGE);
        let compile_args = CompileArgs {
            filters: args.filters.clone(),
            page: Some(page),
            size: args.size,
            locale_suffix: locale::column_suffix(args.locale.as_deref()),
        };

        let sql = build_query(&graph, &self.registry, &compile_args)?;
        let rows = self.connection.execute(&sql).await?;

        let terms = self.collect_highlight_terms(&graph, &args);
        let decode_cx = DecodeContext {
            registry: &self.registry,
            highlight: &terms,
        };
        let decoded = decode_rows(&rows, &decode_cx);
        for failure in &decoded.failures {
            log::warn!("{}", failure);
        }

        let root_display = graph.root().display_name().to_string();
        let mut out_rows = Vec::new();
        for row in decoded.rows {
            match row {
                Value::Object(mut map) => match map.remove(&root_display) {
                    Some(Value::Array(records)) => out_rows.extend(records),
                    Some(other) => out_rows.push(other),
                    None if map.is_empty() => {}
                    None => out_rows.push(Value::Object(map)),
                },
                other => out_rows.push(other),
            }
        }

        // The count only rides along on the first page, and only unless the
        // caller opted out.
        let total = if args.count != Some(false) && page == DEFAULT_PAGE {
            let count_sql = build_count_query(&graph, &self.registry, &compile_args)?;
            let count_rows = self.connection.execute(&count_sql).await?;
            Some(parse_count(&count_rows)?)
        } else {
            None
        };

        Ok(QueryResponse {
            rows: out_rows,
            total,
            failed_rows: decoded.failures.len(),
        })
    }

    /// Runtime terms first, then node-declared terms in traversal order.
    fn collect_highlight_terms(&self, graph: &QueryGraph, args: &QueryArgs) -> Vec<String> {
        let mut terms = args.highlight.clone();
        for node in graph.iter() {
            for term in &node.options.highlight {
                if !terms.contains(term) {
                    terms.push(term.clone());
                }
            }
        }
        terms
    }
}

fn parse_count(rows: &[Row]) -> Result<i64, EngineError> {
    let value = rows
        .first()
        .and_then(|row| row.get(COUNT_FIELD))
        .ok_or(EngineError::InvalidCountRow)?;
    match value {
        Value::Number(n) => n.as_i64().ok_or(EngineError::InvalidCountRow),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| EngineError::InvalidCountRow),
        _ => Err(EngineError::InvalidCountRow),
    }
}
