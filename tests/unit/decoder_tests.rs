//! Decode-side coercion and path handling, driven through the public API.

use nestlite::engine::Row;
use nestlite::response::{decode_row, decode_rows, DecodeContext};
use nestlite::SchemaRegistry;
use serde_json::{json, Value};
use test_case::test_case;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define_schema_from_value(json!({
            "name": "product",
            "tableName": "products",
            "properties": {
                "product_id": "primaryKey",
                "title": { "type": "string", "htm": true },
                "stock": "integer",
                "active": "boolean",
                "rating": "float",
                "code": { "type": "string", "defaultValue": "n/a" }
            }
        }))
        .unwrap();
    registry
}

fn response_row(document: Value) -> Row {
    let mut row = Row::new();
    row.insert("response".to_string(), Value::String(document.to_string()));
    row
}

#[test_case("stock", json!("42"), json!(42); "integer parses strings")]
#[test_case("stock", json!(7.9), json!(7); "integer truncates floats")]
#[test_case("active", json!(0), json!(false); "boolean zero is false")]
#[test_case("active", json!("yes"), json!(true); "boolean non-empty string is true")]
#[test_case("rating", json!("4.5"), json!(4.5); "float parses strings")]
#[test_case("code", json!(""), json!("n/a"); "empty string takes the default")]
#[test_case("title", json!(12), json!("12"); "string coerces numbers")]
fn kind_coercion(property: &str, raw: Value, expected: Value) {
    let registry = registry();
    let hash = registry.schema_by_name("product").unwrap().hash.clone();
    let cx = DecodeContext { registry: &registry, highlight: &[] };
    let document = json!({ "rows": [{ format!("{}.{}", hash, property): raw }] });
    let decoded = decode_row(&response_row(document), 0, &cx).unwrap();
    assert_eq!(decoded, json!({ "rows": [{ property: expected }] }));
}

#[test]
fn round_trip_of_a_single_node_row() {
    let registry = registry();
    let cx = DecodeContext { registry: &registry, highlight: &[] };
    let document = json!({ "items": [{ "id": 7, "title": "Hello" }] });
    let decoded = decode_row(&response_row(document), 0, &cx).unwrap();
    assert_eq!(decoded, json!({ "items": [{ "id": 7, "title": "Hello" }] }));
}

#[test]
fn highlight_is_idempotent_across_decodes() {
    let registry = registry();
    let hash = registry.schema_by_name("product").unwrap().hash.clone();
    let terms = vec!["phone".to_string()];
    let cx = DecodeContext { registry: &registry, highlight: &terms };

    let document = json!({ "rows": [{ format!("{}.title", hash): "Black Phone" }] });
    let decoded = decode_row(&response_row(document), 0, &cx).unwrap();
    let first = decoded["rows"][0]["title"].as_str().unwrap().to_string();
    assert_eq!(first, "Black <b>Phone</b>");

    // Feeding already-highlighted text through again must not double-wrap.
    let document = json!({ "rows": [{ format!("{}.title", hash): first.clone() }] });
    let decoded = decode_row(&response_row(document), 0, &cx).unwrap();
    assert_eq!(decoded["rows"][0]["title"].as_str().unwrap(), first);
}

#[test]
fn batch_reports_failures_without_dropping_siblings() {
    let registry = registry();
    let cx = DecodeContext { registry: &registry, highlight: &[] };
    let mut malformed = Row::new();
    malformed.insert("response".to_string(), Value::String("{broken".into()));
    let rows = vec![
        response_row(json!({ "rows": [] })),
        malformed,
        response_row(json!({ "rows": [] })),
    ];
    let decoded = decode_rows(&rows, &cx);
    assert_eq!(decoded.rows.len(), 2);
    assert_eq!(decoded.failures.len(), 1);
}
