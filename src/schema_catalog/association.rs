//! Typed relationship edges between schemas.
//!
//! An association is directional: `source` is always the owning/parent side
//! regardless of which schema declared it. `has*` declarations keep the
//! declarer as source; `belongs*` declarations flip it, so a single logical
//! edge reads the same from both endpoints.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
}

impl AssociationKind {
    /// `belongs*` kinds reference the other schema instead of owning it.
    pub fn is_belongs(&self) -> bool {
        matches!(self, AssociationKind::BelongsTo | AssociationKind::BelongsToMany)
    }

    /// "many" cardinality nests as an array, everything else as an object.
    pub fn is_many(&self) -> bool {
        matches!(self, AssociationKind::HasMany | AssociationKind::BelongsToMany)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::HasOne => "hasOne",
            AssociationKind::HasMany => "hasMany",
            AssociationKind::BelongsTo => "belongsTo",
            AssociationKind::BelongsToMany => "belongsToMany",
        }
    }
}

/// Nesting shape of the associated data in the compiled JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Object,
    Array,
}

/// Options accepted by the association declaration calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssociationOptions {
    /// Extra join table not modeled as its own schema.
    pub foreign_table: Option<String>,
    pub foreign_key: Option<String>,
    pub use_source_key: Option<String>,
    pub use_target_key: Option<String>,
    /// SQL join type; defaults to `left`.
    #[serde(rename = "type")]
    pub join_type: Option<String>,
    /// Ordered intermediate schema names when the relation traverses middle
    /// schemas (declared parent-side first).
    pub using: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Association {
    pub kind: AssociationKind,
    pub object_type: ObjectType,
    /// Schema that made the declaration.
    pub from_schema: String,
    /// Schema the declaration was made against.
    pub to_schema: String,
    pub source_schema: String,
    pub source_hash: String,
    pub source_table: String,
    pub source_key: String,
    pub target_schema: String,
    pub target_hash: String,
    pub target_table: String,
    pub target_key: String,
    pub foreign_table: Option<String>,
    pub foreign_key: Option<String>,
    pub use_source_key: Option<String>,
    pub use_target_key: Option<String>,
    pub join_type: String,
    pub using: Vec<String>,
}

impl Association {
    /// Join key on the source side: the override when declared, otherwise
    /// the target's key column.
    pub fn source_join_key(&self) -> &str {
        self.use_source_key.as_deref().unwrap_or(&self.target_key)
    }

    /// Join key on the target side: the override when declared, otherwise
    /// the target's key column.
    pub fn target_join_key(&self) -> &str {
        self.use_target_key.as_deref().unwrap_or(&self.target_key)
    }

    pub fn join_keyword(&self) -> String {
        format!("{} JOIN", self.join_type.to_uppercase())
    }

    /// Foreign join table pair when the relation needs one.
    pub fn foreign_join(&self) -> Option<(&str, &str)> {
        match (&self.foreign_table, &self.foreign_key) {
            (Some(table), Some(key)) => Some((table.as_str(), key.as_str())),
            _ => None,
        }
    }
}
