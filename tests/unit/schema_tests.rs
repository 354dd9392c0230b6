//! Schema catalog invariants exercised through the public API.

use std::sync::Arc;

use nestlite::schema_catalog::{AssociationOptions, SchemaCatalogError};
use nestlite::SchemaRegistry;
use serde_json::json;

fn base_registry() -> SchemaRegistry {
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
}

#[test]
fn schema_without_primary_key_is_rejected() {
    let mut registry = SchemaRegistry::new();
    let err = registry
        .define_schema_from_value(json!({
            "name": "tag",
            "tableName": "tags",
            "properties": { "label": "string" }
        }))
        .unwrap_err();
    assert_eq!(err, SchemaCatalogError::MissingPrimaryKey { schema: "tag".into() });
}

#[test]
fn schema_with_two_primary_keys_is_rejected() {
    let mut registry = SchemaRegistry::new();
    let err = registry
        .define_schema_from_value(json!({
            "name": "tag",
            "tableName": "tags",
            "properties": { "a": "primaryKey", "b": "primaryKey" }
        }))
        .unwrap_err();
    assert_eq!(err, SchemaCatalogError::MultiplePrimaryKeys { schema: "tag".into() });
}

#[test]
fn primary_key_is_exposed_under_the_uniform_id_name() {
    let registry = base_registry();
    let schema = registry.schema_by_name("product").unwrap();
    let pk = schema.primary_key_property();
    assert_eq!(pk.name, "id");
    assert_eq!(pk.alias, "product_id");
    assert_eq!(schema.primary_key, "product_id");
}

#[test]
fn association_resolution_is_symmetric() {
    let mut registry = base_registry();
    registry
        .has_many("category", "product", AssociationOptions::default())
        .unwrap();
    let forward = registry.resolve_association("category", "product").unwrap();
    let backward = registry.resolve_association("product", "category").unwrap();
    assert!(Arc::ptr_eq(&forward.edge, &backward.edge));
    assert_eq!(forward.edge.source_hash, backward.edge.source_hash);
    assert_eq!(forward.edge.target_hash, backward.edge.target_hash);
}

#[test]
fn using_chain_expands_to_adjacent_links() {
    let mut registry = base_registry();
    registry
        .has_many("category", "product", AssociationOptions::default())
        .unwrap();
    registry
        .has_many("product", "photo", AssociationOptions::default())
        .unwrap();
    registry
        .has_many(
            "category",
            "photo",
            serde_json::from_value(json!({ "using": ["product"] })).unwrap(),
        )
        .unwrap();

    let resolved = registry.resolve_association("category", "photo").unwrap();
    assert_eq!(resolved.chain.len(), 2);
    assert_eq!(resolved.chain[0].source_schema, "category");
    assert_eq!(resolved.chain[0].target_schema, "product");
    assert_eq!(resolved.chain[1].source_schema, "product");
    assert_eq!(resolved.chain[1].target_schema, "photo");
}

#[test]
fn removing_an_intermediate_declaration_breaks_the_chain() {
    let mut registry = base_registry();
    registry
        .has_many("category", "product", AssociationOptions::default())
        .unwrap();
    registry
        .has_many(
            "category",
            "photo",
            serde_json::from_value(json!({ "using": ["product"] })).unwrap(),
        )
        .unwrap();

    let err = registry.resolve_association("category", "photo").unwrap_err();
    assert_eq!(
        err,
        SchemaCatalogError::NoAssociation { from: "product".into(), to: "photo".into() }
    );
}

#[test]
fn unrelated_schemas_have_no_association() {
    let registry = base_registry();
    let err = registry.resolve_association("category", "photo").unwrap_err();
    assert_eq!(
        err,
        SchemaCatalogError::NoAssociation { from: "category".into(), to: "photo".into() }
    );
}
