//! Decoding of database rows back into typed, nested application objects.
//!
//! Each row carries one JSON text column (the `response` field) holding the
//! document produced by the query generator. The decoder parses it, walks
//! the tree in pre-order tracking a typed path, and rebuilds the output
//! object with:
//! - schema-aware type coercion (leaf keys are `<schemaHash>.<property>`;
//!   the alias half resolves the schema, the property half the coercion),
//! - match-flag booleans set structurally, without any schema lookup,
//! - highlight wrapping for flagged string properties,
//! - array-index path segments turned into real array positions.
//!
//! Unrecognized leaf keys pass through unchanged, which keeps the decoder
//! total over well-formed JSON.

use serde_json::Value;

use crate::engine::Row;
use crate::schema_catalog::property::truthy;
use crate::schema_catalog::SchemaRegistry;
use crate::sqlite_query_generator::{MATCH_FLAG_FIELD, RESPONSE_FIELD};
use crate::utils::json_path::{JsonPath, PathSegment};

use super::errors::DecodeError;
use super::highlight::highlight_terms;

pub struct DecodeContext<'a> {
    pub registry: &'a SchemaRegistry,
    /// Highlight terms supplied for the query; empty disables wrapping.
    pub highlight: &'a [String],
}

/// Result of decoding a batch: the healthy rows plus per-row failures.
#[derive(Debug, Default)]
pub struct DecodedRows {
    pub rows: Vec<Value>,
    pub failures: Vec<DecodeError>,
}

/// Decode a batch of rows. A malformed row lands in `failures` without
/// affecting its siblings.
pub fn decode_rows(rows: &[Row], cx: &DecodeContext) -> DecodedRows {
    let mut decoded = DecodedRows::default();
    for (index, row) in rows.iter().enumerate() {
        match decode_row(row, index, cx) {
            Ok(value) => decoded.rows.push(value),
            Err(error) => decoded.failures.push(error),
        }
    }
    decoded
}

/// Decode a single row's JSON document into a typed nested object.
pub fn decode_row(row: &Row, index: usize, cx: &DecodeContext) -> Result<Value, DecodeError> {
    let text = row
        .get(RESPONSE_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::MissingResponseField {
            index,
            field: RESPONSE_FIELD.to_string(),
        })?;
    let document: Value = serde_json::from_str(text).map_err(|e| DecodeError::MalformedRow {
        index,
        message: e.to_string(),
    })?;

    let mut output = Value::Object(serde_json::Map::new());
    let mut path = JsonPath::new();
    walk(&document, &mut path, &mut output, cx);
    Ok(output)
}

fn walk(value: &Value, path: &mut JsonPath, output: &mut Value, cx: &DecodeContext) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push_key(key);
                walk(child, path, output, cx);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push_index(index);
                walk(child, path, output, cx);
                path.pop();
            }
        }
        leaf => decode_leaf(leaf, path, output, cx),
    }
}

fn decode_leaf(value: &Value, path: &JsonPath, output: &mut Value, cx: &DecodeContext) {
    // Scalars sitting directly in arrays (grouped-id key sets) are
    // internal plumbing, not record fields.
    let Some(key) = path.last_key() else { return };

    // The match flag is structural: always a boolean, no schema involved.
    if key == MATCH_FLAG_FIELD || key.rsplit('.').next() == Some(MATCH_FLAG_FIELD) {
        set_output(output, path, Some(MATCH_FLAG_FIELD), Value::Bool(truthy(value)));
        return;
    }

    if let Some((alias, prop_name)) = key.split_once('.') {
        if let Ok(schema) = cx.registry.schema_by_hash(alias) {
            match schema.translate_to_property(prop_name) {
                Ok(prop) => {
                    let mut decoded = prop.parse_value(value.clone());
                    if prop.supports_highlight && !cx.highlight.is_empty() {
                        if let Value::String(text) = &decoded {
                            decoded = Value::String(highlight_terms(text, cx.highlight));
                        }
                    }
                    set_output(output, path, Some(prop_name), decoded);
                }
                Err(_) => {
                    log::debug!(
                        "Unknown property `{}` on `{}` at {}; passing through",
                        prop_name,
                        schema.name,
                        path
                    );
                    set_output(output, path, Some(prop_name), value.clone());
                }
            }
            return;
        }
        log::debug!("Leaf key `{}` at {} is not schema-qualified", key, path);
    }
    set_output(output, path, None, value.clone());
}

fn container_for(segment: &PathSegment) -> Value {
    match segment {
        PathSegment::Key(_) => Value::Object(serde_json::Map::new()),
        PathSegment::Index(_) => Value::Array(Vec::new()),
    }
}

/// Write `value` into the output tree, creating intermediate containers.
/// The final key drops the schema-alias half when `final_key` is given.
fn set_output(output: &mut Value, path: &JsonPath, final_key: Option<&str>, value: Value) {
    let segments = path.segments();
    let Some((last, head)) = segments.split_last() else { return };

    let mut cursor = output;
    for (position, segment) in head.iter().enumerate() {
        let next = &segments[position + 1];
        match segment {
            PathSegment::Key(key) => {
                let Value::Object(map) = cursor else { return };
                cursor = map.entry(key.clone()).or_insert_with(|| container_for(next));
            }
            PathSegment::Index(index) => {
                let Value::Array(items) = cursor else { return };
                while items.len() <= *index {
                    items.push(Value::Null);
                }
                if items[*index].is_null() {
                    items[*index] = container_for(next);
                }
                cursor = &mut items[*index];
            }
        }
    }

    let PathSegment::Key(last_key) = last else { return };
    if let Value::Object(map) = cursor {
        map.insert(final_key.unwrap_or(last_key).to_string(), value);
    }
}
