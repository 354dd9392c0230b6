//! Field-list translation for a graph node.
//!
//! Two views of the same visible properties:
//! - object fields: the `json_object` key/value argument list, keys being
//!   `'<schemaHash>.<externalName>'` so the decoder can find its way back to
//!   the schema and property;
//! - raw fields: the flat SELECT column list feeding the wrapping subquery.

use crate::query_graph::GraphNode;

use super::errors::SqliteQueryGeneratorError;

/// `'<hash>.<name>', <hash>.<column>` pairs for `json_object`.
pub(crate) fn object_fields(
    node: &GraphNode,
    locale_suffix: &str,
) -> Result<String, SqliteQueryGeneratorError> {
    let hash = &node.schema.hash;
    Ok(node
        .visible_properties()?
        .iter()
        .map(|p| format!("'{}.{}', {}.{}", hash, p.name, hash, p.column_name(locale_suffix)))
        .collect::<Vec<_>>()
        .join(", "))
}

/// Flat column list. Locale-suffixed columns win over raw expression
/// templates; raw expressions are aliased back to the storage column name so
/// the outer `json_object` can reference them.
pub(crate) fn raw_fields(
    node: &GraphNode,
    locale_suffix: &str,
) -> Result<String, SqliteQueryGeneratorError> {
    let hash = &node.schema.hash;
    Ok(node
        .visible_properties()?
        .iter()
        .map(|p| {
            let column = p.column_name(locale_suffix);
            match p.raw_expression() {
                Some(expr) if !p.use_locale => format!("{} AS {}", expr, column),
                _ => format!("{}.{}", hash, column),
            }
        })
        .collect::<Vec<_>>()
        .join(", "))
}
