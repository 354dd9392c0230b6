//! End-to-end pipeline tests against a mocked execution collaborator:
//! specification -> graph -> SQL -> (mock) execute -> decode.

use std::sync::Arc;

use mockall::mock;
use nestlite::engine::{Connection, ConnectionError, EngineError, Row};
use nestlite::schema_catalog::AssociationOptions;
use nestlite::{Engine, QueryArgs, SchemaRegistry};
use serde_json::{json, Value};

mock! {
    pub Conn {}

    #[async_trait::async_trait]
    impl Connection for Conn {
        async fn execute(&self, sql: &str) -> Result<Vec<Row>, ConnectionError>;
    }
}

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define_schema_from_value(json!({
            "name": "category",
            "tableName": "categories",
            "properties": { "category_id": "primaryKey", "title": "string" }
        }))
        .unwrap();
    registry
        .define_schema_from_value(json!({
            "name": "product",
            "tableName": "products",
            "properties": {
                "product_id": "primaryKey",
                "title": { "type": "string", "htm": true },
                "stock": "integer"
            }
        }))
        .unwrap();
    registry
        .has_many(
            "category",
            "product",
            serde_json::from_value::<AssociationOptions>(json!({
                "foreignTable": "product_categories",
                "foreignKey": "category_id"
            }))
            .unwrap(),
        )
        .unwrap();
    registry
}

fn schema_hash(registry: &SchemaRegistry, name: &str) -> String {
    registry.schema_by_name(name).unwrap().hash.clone()
}

fn response_row(document: Value) -> Row {
    let mut row = Row::new();
    row.insert("response".to_string(), Value::String(document.to_string()));
    row
}

fn count_row(total: i64) -> Row {
    let mut row = Row::new();
    row.insert("count".to_string(), json!(total));
    row
}

fn engine_with(registry: SchemaRegistry, connection: MockConn, spec: Value) -> Engine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = Engine::new(registry, Arc::new(connection));
    engine.define_query("catalog", spec).unwrap();
    engine
}

#[tokio::test]
async fn first_page_issues_main_and_count_statements() -> anyhow::Result<()> {
    let registry = registry();
    let category = schema_hash(&registry, "category");
    let product = schema_hash(&registry, "product");

    let document = json!({
        "category": [{
            format!("{}.id", category): 1,
            format!("{}.title", category): "Tools",
            "product": [{
                format!("{}.id", product): 10,
                format!("{}.title", product): "Hammer",
                format!("{}.stock", product): "3"
            }]
        }]
    });

    let mut connection = MockConn::new();
    let main_row = response_row(document);
    connection
        .expect_execute()
        .withf(|sql: &str| sql.starts_with("SELECT json_object"))
        .times(1)
        .returning(move |_| Ok(vec![main_row.clone()]));
    connection
        .expect_execute()
        .withf(|sql: &str| sql.starts_with("SELECT COUNT(DISTINCT"))
        .times(1)
        .returning(|_| Ok(vec![count_row(57)]));

    let engine = engine_with(registry, connection, json!({ "category": { "product": {} } }));
    let response = engine.find_all("catalog", QueryArgs::new().with_page(1)).await?;

    assert_eq!(response.total, Some(57));
    assert_eq!(
        response.rows,
        vec![json!({
            "id": 1,
            "title": "Tools",
            "product": [{ "id": 10, "title": "Hammer", "stock": 3 }]
        })]
    );
    Ok(())
}

#[tokio::test]
async fn second_page_issues_only_the_main_statement() {
    let registry = registry();
    let mut connection = MockConn::new();
    connection
        .expect_execute()
        .withf(|sql: &str| sql.starts_with("SELECT json_object"))
        .times(1)
        .returning(|_| Ok(vec![response_row(json!({ "category": [] }))]));

    let engine = engine_with(registry, connection, json!({ "category": {} }));
    let response = engine.find_all("catalog", QueryArgs::new().with_page(2)).await.unwrap();
    assert_eq!(response.total, None);
    assert!(response.rows.is_empty());
}

#[tokio::test]
async fn match_flags_and_highlights_survive_the_round_trip() {
    let registry = registry();
    let product = schema_hash(&registry, "product");
    let document = json!({
        "category": [{
            "product": [{
                format!("{}._match", product): 1,
                format!("{}.id", product): 10,
                format!("{}.title", product): "Claw hammer"
            }]
        }]
    });

    let mut connection = MockConn::new();
    let main_row = response_row(document);
    connection
        .expect_execute()
        .times(1)
        .returning(move |_| Ok(vec![main_row.clone()]));

    let spec = json!({ "category": { "product": { "where": { "byTitle": "title LIKE" } } } });
    let engine = engine_with(registry, connection, spec);
    let response = engine
        .find_all(
            "catalog",
            QueryArgs::new()
                .with_count(false)
                .with_highlight(vec!["hammer".to_string()]),
        )
        .await
        .unwrap();

    assert_eq!(
        response.rows,
        vec![json!({
            "product": [{ "_match": true, "id": 10, "title": "Claw <b>hammer</b>" }]
        })]
    );
}

#[tokio::test]
async fn execution_failures_pass_through_unchanged() {
    let registry = registry();
    let mut connection = MockConn::new();
    connection
        .expect_execute()
        .times(1)
        .returning(|_| Err(ConnectionError::ExecutionFailed("disk I/O error".into())));

    let engine = engine_with(registry, connection, json!({ "category": {} }));
    let err = engine.find_all("catalog", QueryArgs::new()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Execution(ConnectionError::ExecutionFailed("disk I/O error".into()))
    );
}

#[tokio::test]
async fn malformed_rows_are_reported_not_fatal() {
    let registry = registry();
    let mut bad = Row::new();
    bad.insert("response".to_string(), Value::String("{oops".into()));
    let good = response_row(json!({ "category": [{ "id": 1 }] }));

    let mut connection = MockConn::new();
    connection
        .expect_execute()
        .times(1)
        .returning(move |_| Ok(vec![bad.clone(), good.clone()]));

    let engine = engine_with(registry, connection, json!({ "category": {} }));
    let response = engine
        .find_all("catalog", QueryArgs::new().with_count(false))
        .await
        .unwrap();
    assert_eq!(response.failed_rows, 1);
    assert_eq!(response.rows, vec![json!({ "id": 1 })]);
}

#[tokio::test]
async fn find_one_returns_at_most_one_record() {
    let registry = registry();
    let mut connection = MockConn::new();
    connection
        .expect_execute()
        .withf(|sql: &str| sql.contains("LIMIT 1"))
        .times(1)
        .returning(|_| Ok(vec![response_row(json!({ "category": [{ "id": 4 }] }))]));

    let engine = engine_with(registry, connection, json!({ "category": {} }));
    let response = engine
        .find_one("catalog", QueryArgs::new().with_count(false))
        .await
        .unwrap();
    assert_eq!(response.rows, vec![json!({ "id": 4 })]);
}
