//! Graph-shape properties of the query builder.

use nestlite::query_graph::{QueryGraph, QueryGraphError};
use nestlite::schema_catalog::AssociationOptions;
use nestlite::SchemaRegistry;
use serde_json::json;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for (name, table, key) in [
        ("category", "categories", "category_id"),
        ("product", "products", "product_id"),
        ("photo", "photos", "photo_id"),
    ] {
        registry
            .define_schema_from_value(json!({
                "name": name,
                "tableName": table,
                "properties": { key: "primaryKey", "title": "string" }
            }))
            .unwrap();
    }
    registry
        .has_many("category", "product", AssociationOptions::default())
        .unwrap();
    registry
        .has_many("product", "photo", AssociationOptions::default())
        .unwrap();
    registry
}

#[test]
fn node_count_equals_non_reserved_keys() {
    let registry = registry();
    let spec = json!({
        "category": {
            "properties": ["title"],
            "where": { "byTitle": "title LIKE" },
            "orderBy": ["title"],
            "size": 5,
            "product": {
                "as": "items",
                "htm": ["x"],
                "photo": { "page": 2 }
            }
        }
    });
    let graph = QueryGraph::build(&spec, &registry).unwrap();
    // Three schema keys; every reserved key configures its node instead.
    assert_eq!(graph.len(), 3);
}

#[test]
fn exactly_one_root_and_bounded_parent_chains() {
    let registry = registry();
    let spec = json!({ "category": { "product": { "photo": {} } } });
    let graph = QueryGraph::build(&spec, &registry).unwrap();

    let roots: Vec<_> = graph.iter().filter(|n| n.is_root).collect();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name, "category");

    // Every parent chain terminates at the root within nesting depth.
    for node in graph.iter() {
        let mut steps = 0;
        let mut walker = node.parent;
        while let Some(parent) = walker {
            steps += 1;
            walker = graph.node(parent).parent;
            assert!(steps <= 3, "parent chain of `{}` does not terminate", node.name);
        }
    }
}

#[test]
fn children_keep_declaration_order() {
    let registry = registry();
    let spec = json!({ "product": { "photo": {}, "as": "items" } });
    let graph = QueryGraph::build(&spec, &registry).unwrap();
    let root = graph.root();
    assert_eq!(root.display_name(), "items");
    let children: Vec<String> = root
        .children
        .iter()
        .map(|id| graph.node(*id).name.clone())
        .collect();
    assert_eq!(children, vec!["photo".to_string()]);
}

#[test]
fn second_top_level_schema_is_rejected() {
    let registry = registry();
    let err = QueryGraph::build(&json!({ "category": {}, "product": {} }), &registry).unwrap_err();
    assert!(matches!(err, QueryGraphError::MultipleRoots { .. }));
}

#[test]
fn unknown_nested_schema_aborts_the_build() {
    let registry = registry();
    let err = QueryGraph::build(&json!({ "category": { "vendor": {} } }), &registry).unwrap_err();
    assert!(matches!(err, QueryGraphError::Catalog(_)));
}
