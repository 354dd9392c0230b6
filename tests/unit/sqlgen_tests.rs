//! Compiled-SQL properties exercised through the public API.

use nestlite::query_graph::QueryGraph;
use nestlite::schema_catalog::AssociationOptions;
use nestlite::sqlite_query_generator::{build_count_query, build_query, CompileArgs};
use nestlite::SchemaRegistry;
use serde_json::json;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define_schema_from_value(json!({
            "name": "product",
            "tableName": "products",
            "properties": { "product_id": "primaryKey", "title": "string" }
        }))
        .unwrap();
    registry
        .define_schema_from_value(json!({
            "name": "photo",
            "tableName": "photos",
            "properties": { "photo_id": "primaryKey", "url": "string" }
        }))
        .unwrap();
    registry
        .has_many(
            "product",
            "photo",
            serde_json::from_value::<AssociationOptions>(json!({
                "useSourceKey": "product_id",
                "useTargetKey": "product_id"
            }))
            .unwrap(),
        )
        .unwrap();
    registry
}

fn compile(registry: &SchemaRegistry, spec: serde_json::Value, args: &CompileArgs) -> String {
    let graph = QueryGraph::build(&spec, registry).unwrap();
    build_query(&graph, registry, args).unwrap()
}

#[test]
fn single_node_query_compiles_to_the_exact_shell() {
    let registry = registry();
    let hash = registry.schema_by_name("product").unwrap().hash.clone();
    let sql = compile(&registry, json!({ "product": {} }), &CompileArgs::default());
    assert_eq!(
        sql,
        format!(
            "SELECT json_object('product', (SELECT json_group_array(json_object(\
             '{h}.id', {h}.product_id, '{h}.title', {h}.title)) \
             FROM (SELECT {h}.product_id, {h}.title FROM products {h}) {h})) AS response",
            h = hash
        )
    );
}

#[test]
fn nested_query_carries_the_json_aggregation_shell() {
    let registry = registry();
    let product = registry.schema_by_name("product").unwrap().hash.clone();
    let photo = registry.schema_by_name("photo").unwrap().hash.clone();
    let sql = compile(&registry, json!({ "product": { "photo": {} } }), &CompileArgs::default());
    assert!(sql.contains("json_group_array"));
    assert!(sql.contains("json_patch(json_object("));
    assert!(sql.contains(&format!("FROM photos {}", photo)));
    assert!(sql.contains(&format!("WHERE {}.product_id = {}.product_id", photo, product)));
    assert!(sql.ends_with("AS response"));
}

#[test]
fn compilation_is_deterministic() {
    let registry = registry();
    let spec = json!({ "product": { "photo": {}, "size": 3 } });
    let first = compile(&registry, spec.clone(), &CompileArgs::default());
    let second = compile(&registry, spec, &CompileArgs::default());
    assert_eq!(first, second);
}

#[test]
fn count_query_counts_distinct_root_keys() {
    let registry = registry();
    let hash = registry.schema_by_name("product").unwrap().hash.clone();
    let graph = QueryGraph::build(&json!({ "product": { "size": 5 } }), &registry).unwrap();
    let sql = build_count_query(&graph, &registry, &CompileArgs::default()).unwrap();
    assert_eq!(
        sql,
        format!(
            "SELECT COUNT(DISTINCT {h}.product_id) AS count FROM products {h}",
            h = hash
        )
    );
}

#[test]
fn nested_paging_stays_inside_the_subquery() {
    let registry = registry();
    let sql = compile(
        &registry,
        json!({ "product": { "photo": { "size": 2, "page": 3 } } }),
        &CompileArgs::default(),
    );
    assert!(sql.contains("LIMIT 2 OFFSET 4"));
}
