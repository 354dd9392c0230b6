//! Graph nodes: one schema instance inside a specific nested query, bound
//! to its node-local options.

use std::sync::Arc;

use serde::Deserialize;

use crate::schema_catalog::{PropertyKind, Schema, SchemaCatalogError, SchemaProperty};

/// Stable handle into the graph arena.
pub type NodeId = usize;

/// Reserved option keys of a query-specification node. Any key of a node
/// that is not one of these names a nested schema.
pub const RESERVED_KEYS: &[&str] = &[
    "where", "groupBy", "orderBy", "size", "page", "properties", "as", "htm",
];

/// A value that may be written as a single string or a list of strings
/// (`"orderBy": "title"` vs `"orderBy": ["title", "-price"]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn values(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(v) => vec![v.as_str()],
            OneOrMany::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(v) => v.is_empty(),
            OneOrMany::Many(vs) => vs.is_empty(),
        }
    }
}

/// Node-local query options, deserialized from the node's reserved keys.
/// Non-reserved (child-schema) keys are ignored by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeOptions {
    /// Visible property subset; the primary key is always included.
    pub properties: Option<Vec<String>>,
    /// Display name override: the key the node's data nests under.
    #[serde(rename = "as")]
    pub display_as: Option<String>,
    /// Filter conditions keyed by logical filter name. Values are condition
    /// strings; a condition only renders when the query arguments carry a
    /// value under its name (the `static` filter always renders).
    #[serde(rename = "where")]
    pub filters: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "groupBy")]
    pub group_by: Option<OneOrMany>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<OneOrMany>,
    pub size: Option<u64>,
    pub page: Option<u64>,
    /// Highlight terms declared on the node.
    #[serde(rename = "htm")]
    pub highlight: Vec<String>,
}

impl NodeOptions {
    pub fn has_group_by(&self) -> bool {
        self.group_by.as_ref().is_some_and(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Schema name.
    pub name: String,
    /// Graph-unique node hash; distinct from the schema hash.
    pub hash: String,
    pub schema: Arc<Schema>,
    pub options: NodeOptions,
    /// Back-reference; lookup key only, never owned.
    pub parent: Option<NodeId>,
    /// Owned children in insertion order (= traversal order).
    pub children: Vec<NodeId>,
    pub is_root: bool,
}

impl GraphNode {
    /// Key the node's data is nested under in the compiled JSON output.
    pub fn display_name(&self) -> &str {
        self.options.display_as.as_deref().unwrap_or(&self.name)
    }

    /// The node's visible properties: the requested subset (or all), with
    /// the primary key always present and first. A requested name the
    /// schema does not know is terminal.
    pub fn visible_properties(&self) -> Result<Vec<&SchemaProperty>, SchemaCatalogError> {
        let mut visible: Vec<&SchemaProperty> = vec![self.schema.primary_key_property()];
        match &self.options.properties {
            Some(requested) => {
                for name in requested {
                    let prop = self.schema.translate_to_property(name)?;
                    if prop.kind != PropertyKind::PrimaryKey {
                        visible.push(prop);
                    }
                }
            }
            None => {
                visible.extend(
                    self.schema
                        .properties
                        .iter()
                        .filter(|p| p.kind != PropertyKind::PrimaryKey),
                );
            }
        }
        Ok(visible)
    }
}
