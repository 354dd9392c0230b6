//! Rendering of node-local clauses: filters, grouping, ordering and paging.
//!
//! # Filter conditions
//!
//! A condition string takes one of two forms:
//! - `"<propRef> [operator]"` — `propRef` is a property of the node's own
//!   schema or a qualified `otherSchema.property` reference; the operator
//!   defaults to `=`. The supplied value is rendered as a SQL literal on the
//!   right-hand side.
//! - a raw template containing `?` — qualified `schema.property` references
//!   are rewritten to `<alias>.<column>` and `?` is replaced by the literal.
//!
//! A filter only renders when the query arguments carry a value under its
//! name. The reserved `static` filter always renders and takes no value.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::query_graph::GraphNode;

use super::errors::SqliteQueryGeneratorError;
use super::Cx;

lazy_static! {
    /// `schema.property` shaped references inside condition strings.
    static ref SCHEMA_REF_RE: Regex = Regex::new(r"(\w{2,})\.(\w{2,})").unwrap();
}

/// Filter name whose condition is applied verbatim on every query.
pub const STATIC_FILTER_NAME: &str = "static";

/// AND-joined predicate of every active filter on the node, or `None` when
/// no filter is active.
pub(crate) fn filter_predicate(
    cx: &Cx,
    node: &GraphNode,
) -> Result<Option<String>, SqliteQueryGeneratorError> {
    let mut parts = Vec::new();
    for (name, condition) in &node.options.filters {
        let Some(condition) = condition.as_str() else {
            log::warn!(
                "Filter `{}` on `{}` is not a string condition; skipping",
                name,
                node.name
            );
            continue;
        };
        if name == STATIC_FILTER_NAME {
            parts.push(render_condition(cx, node, name, condition, None)?);
        } else if let Some(value) = cx.args.filters.get(name) {
            if value.is_null() {
                continue;
            }
            parts.push(render_condition(cx, node, name, condition, Some(value))?);
        }
    }
    Ok(if parts.is_empty() { None } else { Some(parts.join(" AND ")) })
}

/// Schemas (other than the node's own) referenced by the node's active
/// filter conditions, in declaration order, deduplicated. Only references to
/// registered schemas count — anything else is treated as plain SQL text.
pub(crate) fn referenced_schemas(cx: &Cx, node: &GraphNode) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, condition) in &node.options.filters {
        if name == STATIC_FILTER_NAME {
            continue;
        }
        let Some(condition) = condition.as_str() else { continue };
        if !cx.args.filters.get(name).is_some_and(|v| !v.is_null()) {
            continue;
        }
        for cap in SCHEMA_REF_RE.captures_iter(condition) {
            let schema_name = cap[1].to_string();
            if schema_name != node.schema.name
                && cx.registry.contains(&schema_name)
                && !names.contains(&schema_name)
            {
                names.push(schema_name);
            }
        }
    }
    names
}

fn render_condition(
    cx: &Cx,
    node: &GraphNode,
    filter: &str,
    condition: &str,
    value: Option<&Value>,
) -> Result<String, SqliteQueryGeneratorError> {
    if condition.contains('?') {
        let rewritten = rewrite_schema_refs(cx, condition)?;
        return Ok(match value {
            Some(v) => rewritten.replace('?', &literal(v)),
            None => rewritten,
        });
    }

    let mut tokens = condition.split_whitespace();
    let prop_ref = tokens.next().ok_or_else(|| {
        SqliteQueryGeneratorError::InvalidFilterCondition {
            filter: filter.to_string(),
            message: "empty condition".to_string(),
        }
    })?;
    let operator = {
        let rest = tokens.collect::<Vec<_>>().join(" ");
        if rest.is_empty() { "=".to_string() } else { rest }
    };
    let (alias, column) = resolve_prop_ref(cx, node, prop_ref)?;
    Ok(match value {
        Some(v) => format!("{}.{} {} {}", alias, column, operator, literal(v)),
        None => format!("{}.{} {}", alias, column, operator),
    })
}

/// Rewrite `schema.property` references to `<alias>.<column>`, leaving
/// unregistered names untouched.
fn rewrite_schema_refs(cx: &Cx, condition: &str) -> Result<String, SqliteQueryGeneratorError> {
    let mut out = String::new();
    let mut last = 0;
    for cap in SCHEMA_REF_RE.captures_iter(condition) {
        let whole = cap.get(0).expect("capture 0 always present");
        let schema_name = &cap[1];
        if let Ok(schema) = cx.registry.schema_by_name(schema_name) {
            let prop = schema.translate_to_property(&cap[2])?;
            out.push_str(&condition[last..whole.start()]);
            out.push_str(&format!(
                "{}.{}",
                schema.hash,
                prop.column_name(&cx.args.locale_suffix)
            ));
            last = whole.end();
        }
    }
    out.push_str(&condition[last..]);
    Ok(out)
}

fn resolve_prop_ref(
    cx: &Cx,
    node: &GraphNode,
    prop_ref: &str,
) -> Result<(String, String), SqliteQueryGeneratorError> {
    let (schema, prop_name) = match prop_ref.split_once('.') {
        Some((schema_name, prop_name)) => (cx.registry.schema_by_name(schema_name)?, prop_name),
        None => (cx.registry.schema_by_name(&node.schema.name)?, prop_ref),
    };
    let prop = schema.translate_to_property(prop_name)?;
    Ok((schema.hash.clone(), prop.column_name(&cx.args.locale_suffix)))
}

/// Render a JSON value as a SQL literal. Single quotes are escaped by
/// doubling them; arrays render as parenthesized lists for `IN`.
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(items) => format!(
            "({})",
            items.iter().map(literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(_) => "NULL".to_string(),
    }
}

/// ` GROUP BY <alias>.<column>, ...` or empty.
pub(crate) fn group_by_clause(
    cx: &Cx,
    node: &GraphNode,
) -> Result<String, SqliteQueryGeneratorError> {
    let Some(group_by) = &node.options.group_by else { return Ok(String::new()) };
    let mut columns = Vec::new();
    for name in group_by.values() {
        let prop = node.schema.translate_to_property(name)?;
        columns.push(format!(
            "{}.{}",
            node.schema.hash,
            prop.column_name(&cx.args.locale_suffix)
        ));
    }
    if columns.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" GROUP BY {}", columns.join(", ")))
}

/// ` ORDER BY <alias>.<column> [DESC], ...` or empty. A leading `-` on a
/// property name sorts descending.
pub(crate) fn order_by_clause(
    cx: &Cx,
    node: &GraphNode,
) -> Result<String, SqliteQueryGeneratorError> {
    let Some(order_by) = &node.options.order_by else { return Ok(String::new()) };
    let mut columns = Vec::new();
    for name in order_by.values() {
        let (name, direction) = match name.strip_prefix('-') {
            Some(stripped) => (stripped, " DESC"),
            None => (name, ""),
        };
        let prop = node.schema.translate_to_property(name)?;
        columns.push(format!(
            "{}.{}{}",
            node.schema.hash,
            prop.column_name(&cx.args.locale_suffix),
            direction
        ));
    }
    if columns.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" ORDER BY {}", columns.join(", ")))
}

/// ` LIMIT <size> [OFFSET <(page-1)*size>]` or empty.
pub(crate) fn limit_clause(size: Option<u64>, page: Option<u64>) -> String {
    let Some(size) = size else { return String::new() };
    let offset = page.unwrap_or(1).saturating_sub(1) * size;
    if offset > 0 {
        format!(" LIMIT {} OFFSET {}", size, offset)
    } else {
        format!(" LIMIT {}", size)
    }
}

/// Non-filter clauses of a nested node (its `where` only feeds the match
/// flag; paging comes from the node options alone).
pub(crate) fn node_clauses(
    cx: &Cx,
    node: &GraphNode,
) -> Result<String, SqliteQueryGeneratorError> {
    Ok(format!(
        "{}{}{}",
        group_by_clause(cx, node)?,
        order_by_clause(cx, node)?,
        limit_clause(node.options.size, node.options.page),
    ))
}
