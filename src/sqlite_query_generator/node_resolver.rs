//! Rendering of nested (non-root) graph nodes.
//!
//! A nested node compiles to a scalar subquery producing one JSON value per
//! parent row. Array-shaped associations aggregate the node's rows with
//! `json_group_array`, merging each row's own fields with its children via
//! `json_patch`; object-shaped associations produce a single `json_object`
//! joined to the parent row.

use std::collections::BTreeSet;

use crate::query_graph::GraphNode;
use crate::schema_catalog::ObjectType;

use super::errors::SqliteQueryGeneratorError;
use super::joins::{self, ParentScope};
use super::{fields, options, Cx, MATCH_FLAG_FIELD};

/// Render every child of `node` and fold them into a single `json_patch`
/// argument, or `None` when the node is a leaf.
pub(crate) fn render_children(
    cx: &Cx,
    node: &GraphNode,
    grouped_keys: &BTreeSet<String>,
) -> Result<Option<String>, SqliteQueryGeneratorError> {
    let mut rendered = Vec::with_capacity(node.children.len());
    for child_id in &node.children {
        let child = cx.graph.node(*child_id);
        let scope = ParentScope::new(&node.schema.hash, grouped_keys);
        rendered.push(render_node(cx, child, &scope)?);
    }
    let mut parts = rendered.into_iter().map(|sql| format!("({})", sql));
    let Some(first) = parts.next() else { return Ok(None) };
    // Fold siblings pairwise: json_patch(json_patch((a), (b)), (c)).
    Ok(Some(parts.fold(first, |acc, part| {
        format!("json_patch({}, {})", acc, part)
    })))
}

fn where_clause(predicates: &[String]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

/// Compile one nested node into its scalar subquery.
pub(crate) fn render_node(
    cx: &Cx,
    node: &GraphNode,
    scope: &ParentScope,
) -> Result<String, SqliteQueryGeneratorError> {
    let parent_node = cx.graph.node(node.parent.expect("nested nodes always have a parent"));
    let resolved = cx
        .registry
        .resolve_association(&parent_node.schema.name, &node.schema.name)?;
    let alias = &node.schema.hash;

    let mut object_fields = fields::object_fields(node, &cx.args.locale_suffix)?;
    let mut raw_fields = fields::raw_fields(node, &cx.args.locale_suffix)?;

    // Nested filters do not narrow the child rows; they surface as a
    // per-row boolean match flag instead.
    if let Some(predicate) = options::filter_predicate(cx, node)? {
        object_fields = format!(
            "'{alias}.{flag}', {alias}.{flag}, {object_fields}",
            alias = alias,
            flag = MATCH_FLAG_FIELD,
            object_fields = object_fields,
        );
        raw_fields = format!(
            "{}, CAST(({}) AS boolean) AS {}",
            raw_fields, predicate, MATCH_FLAG_FIELD
        );
    }

    let chain = joins::collect_chain(cx, node)?;
    match resolved.edge.object_type {
        ObjectType::Array => {
            // Group-by over an intermediate chain also aggregates the
            // chain's key sets so deeper nodes can still correlate.
            let mut grouped_keys = BTreeSet::new();
            if node.options.has_group_by() && !resolved.edge.using.is_empty() {
                for (key, field) in joins::group_id_fields(&resolved.chain) {
                    raw_fields.push_str(", ");
                    raw_fields.push_str(&field);
                    grouped_keys.insert(key);
                }
            }

            let children = render_children(cx, node, &grouped_keys)?;
            let (source, correlations) = joins::render_node_source(cx, node, &chain, scope);
            let clauses = options::node_clauses(cx, node)?;
            let row_object = match children {
                Some(children) => format!("json_patch(json_object({}), {})", object_fields, children),
                None => format!("json_object({})", object_fields),
            };
            Ok(format!(
                "SELECT json_object('{display}', (SELECT json_group_array({row_object}) \
                 FROM (SELECT {raw_fields} {source}{where_clause}{clauses}) {alias}))",
                display = node.display_name(),
                row_object = row_object,
                raw_fields = raw_fields,
                source = source,
                where_clause = where_clause(&correlations),
                clauses = clauses,
                alias = alias,
            ))
        }
        ObjectType::Object => {
            let children = render_children(cx, node, &BTreeSet::new())?;
            let (source, correlations) = joins::render_node_source(cx, node, &chain, scope);
            let clauses = options::node_clauses(cx, node)?;
            let row_object = match children {
                Some(children) => format!("json_patch(json_object({}), {})", object_fields, children),
                None => format!("json_object({})", object_fields),
            };
            Ok(format!(
                "SELECT {row_object} {source}{where_clause}{clauses}",
                row_object = row_object,
                source = source,
                where_clause = where_clause(&correlations),
                clauses = clauses,
            ))
        }
    }
}
