use thiserror::Error;

use crate::schema_catalog::SchemaCatalogError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryGraphError {
    #[error(transparent)]
    Catalog(#[from] SchemaCatalogError),
    #[error("Query specification must be a JSON object")]
    InvalidSpec,
    #[error("Query specification is empty (no root schema)")]
    EmptySpec,
    #[error("Query specification declares more than one root schema (`{first}` and `{second}`)")]
    MultipleRoots { first: String, second: String },
    #[error("Invalid specification for node `{name}`: expected an object of options and nested schemas")]
    InvalidNodeSpec { name: String },
    #[error("Invalid options for node `{name}`: {message}")]
    InvalidNodeOptions { name: String, message: String },
}
