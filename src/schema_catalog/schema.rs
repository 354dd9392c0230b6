//! Schema definitions and their resolved form.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use validator::Validate;

use super::association::Association;
use super::errors::SchemaCatalogError;
use super::property::{PropertyDef, PropertyKind, SchemaProperty, ValueParser};

/// Raw schema definition input.
///
/// Properties keep declaration order (the JSON map preserves key order), and
/// exactly one of them must declare the `primaryKey` kind.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDef {
    #[validate(length(min = 1, message = "schema name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub table_name: String,
    pub properties: serde_json::Map<String, Value>,
}

/// A registered record type: named, table-backed, with ordered typed
/// properties and two association maps (`has` for owned relations, `belongs`
/// for referencing ones).
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub table_name: String,
    /// Stable identifier, usable as a SQL table alias. Derived from the
    /// schema name, so it is identical across processes and runs.
    pub hash: String,
    pub properties: Vec<SchemaProperty>,
    /// Storage column name of the primary-key property.
    pub primary_key: String,
    pub has: HashMap<String, Arc<Association>>,
    pub belongs: HashMap<String, Arc<Association>>,
}

/// Table aliases must start with a letter; an 8-hex-char digest prefix keeps
/// them short, collision-resistant and deterministic.
pub(crate) fn schema_hash(name: &str) -> String {
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    format!("s{}", &digest[..8])
}

impl Schema {
    pub fn from_def(def: SchemaDef) -> Result<Self, SchemaCatalogError> {
        def.validate()
            .map_err(|e| SchemaCatalogError::InvalidDefinition(e.to_string()))?;
        if def.table_name.is_empty() {
            return Err(SchemaCatalogError::MissingTableName { schema: def.name });
        }

        let mut properties = Vec::with_capacity(def.properties.len());
        for (declared_name, raw_def) in &def.properties {
            let prop_def: PropertyDef = serde_json::from_value(raw_def.clone()).map_err(|e| {
                SchemaCatalogError::InvalidDefinition(format!(
                    "property `{}` of `{}`: {}",
                    declared_name, def.name, e
                ))
            })?;
            properties.push(SchemaProperty::from_def(&def.name, declared_name, &prop_def)?);
        }

        let mut primary_keys = properties
            .iter()
            .filter(|p| p.kind == PropertyKind::PrimaryKey);
        let primary_key = match (primary_keys.next(), primary_keys.next()) {
            (Some(pk), None) => pk.alias.clone(),
            (None, _) => {
                return Err(SchemaCatalogError::MissingPrimaryKey { schema: def.name });
            }
            (Some(_), Some(_)) => {
                return Err(SchemaCatalogError::MultiplePrimaryKeys { schema: def.name });
            }
        };

        Ok(Schema {
            hash: schema_hash(&def.name),
            name: def.name,
            table_name: def.table_name,
            properties,
            primary_key,
            has: HashMap::new(),
            belongs: HashMap::new(),
        })
    }

    /// Resolve a property by its external name or its storage column name.
    pub fn translate_to_property(&self, name: &str) -> Result<&SchemaProperty, SchemaCatalogError> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.properties.iter().find(|p| p.alias == name))
            .ok_or_else(|| SchemaCatalogError::unknown_property(&self.name, name))
    }

    pub fn primary_key_property(&self) -> &SchemaProperty {
        // Construction guarantees exactly one.
        self.properties
            .iter()
            .find(|p| p.kind == PropertyKind::PrimaryKey)
            .expect("schema constructed without a primary key")
    }

    pub(crate) fn set_property_parser(
        &mut self,
        property: &str,
        parser: ValueParser,
    ) -> Result<(), SchemaCatalogError> {
        let name = self.name.clone();
        let prop = self
            .properties
            .iter_mut()
            .find(|p| p.name == property || p.alias == property)
            .ok_or_else(|| SchemaCatalogError::unknown_property(name, property))?;
        prop.parser = Some(parser);
        Ok(())
    }
}
