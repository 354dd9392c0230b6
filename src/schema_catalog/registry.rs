//! The schema registry: named schema store plus association declaration and
//! resolution.
//!
//! The registry is an explicit value owned by the application facade. It is
//! mutated only during setup (schema definitions, association declarations,
//! parser attachment); after that every consumer reads it through a shared
//! reference, so compilations can run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::association::{Association, AssociationKind, AssociationOptions, ObjectType};
use super::errors::SchemaCatalogError;
use super::property::ValueParser;
use super::schema::{Schema, SchemaDef};

/// An association looked up between two schemas.
///
/// `edge` is the declared association itself; `chain` is its expansion: a
/// single link for direct relations, or the full `[a->u1, u1->u2, ..,
/// un->b]` path when the declaration carries a `using` chain.
#[derive(Debug, Clone)]
pub struct ResolvedAssociation {
    pub edge: Arc<Association>,
    pub chain: Vec<Arc<Association>>,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
    /// hash -> name, for decode-time alias lookups.
    by_hash: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Fails on a duplicate name or an invalid
    /// definition (missing table name, zero or multiple primary keys).
    pub fn define_schema(&mut self, def: SchemaDef) -> Result<Arc<Schema>, SchemaCatalogError> {
        if self.schemas.contains_key(&def.name) {
            return Err(SchemaCatalogError::DuplicateSchema { name: def.name });
        }
        let schema = Arc::new(Schema::from_def(def)?);
        self.by_hash.insert(schema.hash.clone(), schema.name.clone());
        self.schemas.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Convenience: register a schema straight from its JSON definition.
    pub fn define_schema_from_value(&mut self, value: Value) -> Result<Arc<Schema>, SchemaCatalogError> {
        let def: SchemaDef = serde_json::from_value(value)
            .map_err(|e| SchemaCatalogError::InvalidDefinition(e.to_string()))?;
        self.define_schema(def)
    }

    pub fn schema_by_name(&self, name: &str) -> Result<&Arc<Schema>, SchemaCatalogError> {
        self.schemas
            .get(name)
            .ok_or_else(|| SchemaCatalogError::unknown_schema(name))
    }

    pub fn schema_by_hash(&self, hash: &str) -> Result<&Arc<Schema>, SchemaCatalogError> {
        self.by_hash
            .get(hash)
            .and_then(|name| self.schemas.get(name))
            .ok_or_else(|| SchemaCatalogError::unknown_schema(hash))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Attach a custom decode parser to a property.
    pub fn set_property_parser(
        &mut self,
        schema: &str,
        property: &str,
        parser: ValueParser,
    ) -> Result<(), SchemaCatalogError> {
        let entry = self
            .schemas
            .get_mut(schema)
            .ok_or_else(|| SchemaCatalogError::unknown_schema(schema))?;
        Arc::make_mut(entry).set_property_parser(property, parser)
    }

    pub fn has_one(
        &mut self,
        from: &str,
        to: &str,
        options: AssociationOptions,
    ) -> Result<(), SchemaCatalogError> {
        self.associate(from, to, AssociationKind::HasOne, options)
    }

    pub fn has_many(
        &mut self,
        from: &str,
        to: &str,
        options: AssociationOptions,
    ) -> Result<(), SchemaCatalogError> {
        self.associate(from, to, AssociationKind::HasMany, options)
    }

    pub fn belongs_to(
        &mut self,
        from: &str,
        to: &str,
        options: AssociationOptions,
    ) -> Result<(), SchemaCatalogError> {
        self.associate(from, to, AssociationKind::BelongsTo, options)
    }

    pub fn belongs_to_many(
        &mut self,
        from: &str,
        to: &str,
        options: AssociationOptions,
    ) -> Result<(), SchemaCatalogError> {
        self.associate(from, to, AssociationKind::BelongsToMany, options)
    }

    /// Declare an association between two registered schemas.
    ///
    /// Direction is normalized so the source is always the owning/parent
    /// side, and the edge is stored on both endpoints' maps: the declarer's
    /// `has`/`belongs` slot plus the counterpart slot on the other schema,
    /// so lookup works from either direction.
    fn associate(
        &mut self,
        from: &str,
        to: &str,
        kind: AssociationKind,
        options: AssociationOptions,
    ) -> Result<(), SchemaCatalogError> {
        let from_schema = Arc::clone(self.schema_by_name(from)?);
        let to_schema = Arc::clone(self.schema_by_name(to)?);
        let (source, target) = if kind.is_belongs() {
            (&to_schema, &from_schema)
        } else {
            (&from_schema, &to_schema)
        };

        let association = Arc::new(Association {
            kind,
            object_type: if kind.is_many() {
                ObjectType::Array
            } else {
                ObjectType::Object
            },
            from_schema: from_schema.name.clone(),
            to_schema: to_schema.name.clone(),
            source_schema: source.name.clone(),
            source_hash: source.hash.clone(),
            source_table: source.table_name.clone(),
            source_key: source.primary_key.clone(),
            target_schema: target.name.clone(),
            target_hash: target.hash.clone(),
            target_table: target.table_name.clone(),
            target_key: target.primary_key.clone(),
            foreign_table: options.foreign_table,
            foreign_key: options.foreign_key,
            use_source_key: options.use_source_key,
            use_target_key: options.use_target_key,
            join_type: options.join_type.unwrap_or_else(|| "left".to_string()),
            using: options.using,
        });

        let declarer = self.schemas.get_mut(from).expect("looked up above");
        let declarer = Arc::make_mut(declarer);
        if kind.is_belongs() {
            declarer.belongs.insert(to.to_string(), Arc::clone(&association));
        } else {
            declarer.has.insert(to.to_string(), Arc::clone(&association));
        }

        let counterpart = self.schemas.get_mut(to).expect("looked up above");
        let counterpart = Arc::make_mut(counterpart);
        if kind.is_belongs() {
            counterpart.has.insert(from.to_string(), association);
        } else {
            counterpart.belongs.insert(from.to_string(), association);
        }
        Ok(())
    }

    fn direct_association(&self, a: &str, b: &str) -> Option<Arc<Association>> {
        let sa = self.schemas.get(a)?;
        let sb = self.schemas.get(b)?;
        sa.has
            .get(b)
            .or_else(|| sa.belongs.get(b))
            .or_else(|| sb.has.get(a))
            .or_else(|| sb.belongs.get(a))
            .cloned()
    }

    /// Resolve the association between two schema names, expanding `using`
    /// chains into the full join path.
    ///
    /// For chained relations the caller passes the parent-side schema first;
    /// the expansion resolves each adjacent pair recursively, so a missing
    /// intermediate declaration fails with `NoAssociation`.
    pub fn resolve_association(
        &self,
        a: &str,
        b: &str,
    ) -> Result<ResolvedAssociation, SchemaCatalogError> {
        let edge = self
            .direct_association(a, b)
            .ok_or_else(|| SchemaCatalogError::no_association(a, b))?;
        if edge.using.is_empty() {
            return Ok(ResolvedAssociation {
                chain: vec![Arc::clone(&edge)],
                edge,
            });
        }

        let mut stops: Vec<&str> = vec![a];
        stops.extend(edge.using.iter().map(String::as_str));
        stops.push(b);
        let mut chain = Vec::with_capacity(stops.len() - 1);
        for pair in stops.windows(2) {
            let link = self
                .direct_association(pair[0], pair[1])
                .ok_or_else(|| SchemaCatalogError::no_association(pair[0], pair[1]))?;
            // A link may itself traverse intermediates, but a degenerate
            // declaration whose chain loops back onto this edge must not
            // recurse forever.
            if link.using.is_empty() || Arc::ptr_eq(&link, &edge) {
                chain.push(link);
            } else {
                chain.extend(self.resolve_association(pair[0], pair[1])?.chain);
            }
        }
        Ok(ResolvedAssociation { edge, chain })
    }
}
