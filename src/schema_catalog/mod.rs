//! Schema catalog: named record types, typed properties and the
//! associations between them.

pub mod association;
pub mod errors;
pub mod property;
pub mod registry;
pub mod schema;

pub use association::{Association, AssociationKind, AssociationOptions, ObjectType};
pub use errors::SchemaCatalogError;
pub use property::{PropertyKind, SchemaProperty, ValueParser, ID_PROPERTY_NAME};
pub use registry::{ResolvedAssociation, SchemaRegistry};
pub use schema::{Schema, SchemaDef};
