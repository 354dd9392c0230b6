//! Building the query graph from a nested query specification.
//!
//! The specification is a JSON object whose non-reserved keys name schemas
//! and whose reserved keys configure the enclosing node. The builder walks
//! it depth-first in pre-order, binding each schema node to its options and
//! linking it under its parent. Purely structural — no I/O.

use std::collections::HashMap;

use serde_json::Value;

use crate::schema_catalog::SchemaRegistry;

use super::errors::QueryGraphError;
use super::node::{GraphNode, NodeId, NodeOptions, RESERVED_KEYS};

/// The per-query node tree: an arena keyed by node hash, with a single
/// root (`head`) and the most-recently-added node (`tail`).
///
/// Built once per compilation, immutable afterwards, discarded once the SQL
/// text is produced.
#[derive(Debug)]
pub struct QueryGraph {
    nodes: Vec<GraphNode>,
    by_hash: HashMap<String, NodeId>,
    head: NodeId,
    tail: NodeId,
}

impl QueryGraph {
    /// Walk the specification and produce a fully linked graph.
    pub fn build(spec: &Value, registry: &SchemaRegistry) -> Result<Self, QueryGraphError> {
        let entries = spec.as_object().ok_or(QueryGraphError::InvalidSpec)?;
        let mut graph = QueryGraph {
            nodes: Vec::new(),
            by_hash: HashMap::new(),
            head: 0,
            tail: 0,
        };

        let mut root: Option<String> = None;
        for (key, value) in entries {
            if is_reserved_key(key) {
                continue;
            }
            if let Some(first) = &root {
                return Err(QueryGraphError::MultipleRoots {
                    first: first.clone(),
                    second: key.clone(),
                });
            }
            root = Some(key.clone());
            graph.add_subtree(key, value, None, registry)?;
        }
        if root.is_none() {
            return Err(QueryGraphError::EmptySpec);
        }
        Ok(graph)
    }

    fn add_subtree(
        &mut self,
        name: &str,
        spec: &Value,
        parent: Option<NodeId>,
        registry: &SchemaRegistry,
    ) -> Result<NodeId, QueryGraphError> {
        let entries = spec
            .as_object()
            .ok_or_else(|| QueryGraphError::InvalidNodeSpec { name: name.to_string() })?;

        let schema = registry.schema_by_name(name)?.clone();
        let options: NodeOptions = serde_json::from_value(spec.clone()).map_err(|e| {
            QueryGraphError::InvalidNodeOptions {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;

        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            name: name.to_string(),
            hash: format!("n{}", id),
            schema,
            options,
            parent,
            children: Vec::new(),
            is_root: parent.is_none(),
        });
        self.by_hash.insert(format!("n{}", id), id);
        self.tail = id;
        if let Some(parent_id) = parent {
            self.nodes[parent_id].children.push(id);
        }

        for (key, value) in entries {
            if is_reserved_key(key) {
                continue;
            }
            self.add_subtree(key, value, Some(id), registry)?;
        }
        Ok(id)
    }

    pub fn root(&self) -> &GraphNode {
        &self.nodes[self.head]
    }

    pub fn tail(&self) -> &GraphNode {
        &self.nodes[self.tail]
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn node_by_hash(&self, hash: &str) -> Option<&GraphNode> {
        self.by_hash.get(hash).map(|id| &self.nodes[*id])
    }

    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion (pre-order traversal) order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &GraphNode> {
        self.nodes[id].children.iter().map(|child| &self.nodes[*child])
    }

    /// Depth of a node measured in parent steps to the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut walker = self.nodes[id].parent;
        while let Some(parent) = walker {
            depth += 1;
            walker = self.nodes[parent].parent;
        }
        depth
    }
}

fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
