use thiserror::Error;

use crate::schema_catalog::SchemaCatalogError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqliteQueryGeneratorError {
    #[error(transparent)]
    Catalog(#[from] SchemaCatalogError),
    #[error("Invalid condition for filter `{filter}`: {message}")]
    InvalidFilterCondition { filter: String, message: String },
}
