//! # Schema Catalog Error Types
//!
//! Error handling for schema definition, lookup and association resolution.
//!
//! Definition-time errors (`MissingPrimaryKey`, `DuplicateSchema`, ...) are
//! fatal at setup and abort startup. Lookup errors (`UnknownSchema`,
//! `UnknownProperty`, `NoAssociation`) are fatal for the single query being
//! compiled and carry the offending name(s).

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaCatalogError {
    #[error("Missing table name definition for `{schema}` schema")]
    MissingTableName { schema: String },
    #[error("Missing primary key definition for `{schema}` schema")]
    MissingPrimaryKey { schema: String },
    #[error("More than one primary key declared for `{schema}` schema")]
    MultiplePrimaryKeys { schema: String },
    #[error("Unrecognized type `{type_name}` on property `{property}` of `{schema}` schema")]
    UnknownPropertyType {
        schema: String,
        property: String,
        type_name: String,
    },
    #[error("A schema named `{name}` is already registered")]
    DuplicateSchema { name: String },
    #[error("No schema found for `{name}`")]
    UnknownSchema { name: String },
    #[error("No property `{property}` found on `{schema}` schema")]
    UnknownProperty { schema: String, property: String },
    #[error("No association found between `{from}` and `{to}`")]
    NoAssociation { from: String, to: String },
    #[error("Invalid schema definition: {0}")]
    InvalidDefinition(String),
}

impl SchemaCatalogError {
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        SchemaCatalogError::UnknownSchema { name: name.into() }
    }

    pub fn unknown_property(schema: impl Into<String>, property: impl Into<String>) -> Self {
        SchemaCatalogError::UnknownProperty {
            schema: schema.into(),
            property: property.into(),
        }
    }

    pub fn no_association(from: impl Into<String>, to: impl Into<String>) -> Self {
        SchemaCatalogError::NoAssociation {
            from: from.into(),
            to: to.into(),
        }
    }
}
