//! Nestlite - Nested, GraphQL-shaped queries over SQLite JSON1
//!
//! This crate lets an application describe data as named schemas with typed
//! properties and declared relationships, then issue nested query
//! specifications against those relationships through:
//! - A schema catalog with association resolution (including chains through
//!   intermediate join schemas)
//! - A query-specification-to-graph builder
//! - A recursive SQL generator producing a single JSON-aggregating statement
//! - A row decoder turning JSON rows back into typed nested objects

pub mod engine;
pub mod locale;
pub mod query_graph;
pub mod response;
pub mod schema_catalog;
pub mod sqlite_query_generator;
pub mod utils;

pub use engine::{Connection, Engine, QueryArgs, QueryResponse};
pub use schema_catalog::SchemaRegistry;
