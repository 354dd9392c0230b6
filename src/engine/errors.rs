use thiserror::Error;

use crate::query_graph::QueryGraphError;
use crate::schema_catalog::SchemaCatalogError;
use crate::sqlite_query_generator::SqliteQueryGeneratorError;

use super::connection::ConnectionError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Undefined `{0}` query")]
    UnknownQuery(String),
    #[error(transparent)]
    Catalog(#[from] SchemaCatalogError),
    #[error(transparent)]
    Graph(#[from] QueryGraphError),
    #[error(transparent)]
    Sql(#[from] SqliteQueryGeneratorError),
    #[error(transparent)]
    Execution(#[from] ConnectionError),
    #[error("Count query returned no usable value")]
    InvalidCountRow,
}
