use eavstore_model::{Entity, EntityDetail, EntityRef, Instance, PropertyDetail};
use eavstore_server::{build_router, AppState, MessageResponse};
use eavstore_store::{EavStore, ValidationMode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

/// Spin up the API over a fresh in-memory store, returning the base URL.
async fn spawn_test_server(mode: ValidationMode) -> String {
    let store = EavStore::open_in_memory().unwrap();
    let app = build_router(AppState::new(store, mode));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}/api", port)
}

async fn create_entity(base: &str, name: &str, properties: &[&str]) -> Entity {
    let resp = reqwest::Client::new()
        .post(format!("{base}/entity/new"))
        .json(&json!({ "name": name, "properties": properties }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

async fn create_instance(base: &str, entity: &str, properties: Value) -> Instance {
    let resp = reqwest::Client::new()
        .post(format!("{base}/instance/new"))
        .json(&json!({ "entity": entity, "properties": properties }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

async fn query(base: &str, predicates: Value) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{base}/instance/data"))
        .json(&json!({ "properties": predicates }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_and_fetch_entity() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let car = create_entity(&base, "Car", &["color", "doors"]).await;
    assert_eq!(car.property_names(), vec!["color", "doors"]);

    let resp = reqwest::get(format!("{base}/entity/name/Car")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: Entity = resp.json().await.unwrap();
    assert_eq!(fetched, car);

    let count: usize = reqwest::get(format!("{base}/entity/count"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn missing_entity_name_is_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::get(format!("{base}/entity/name/Boat")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: MessageResponse = resp.json().await.unwrap();
    assert_eq!(body.message, "Entity not found.");
}

#[tokio::test]
async fn duplicate_entity_is_conflict() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &[]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/entity/new"))
        .json(&json!({ "name": "Car" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn entity_without_name_is_rejected() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/entity/new"))
        .json(&json!({ "properties": ["color"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: MessageResponse = resp.json().await.unwrap();
    assert!(body.message.contains("name"));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/entity/new"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::get(format!("{base}/entity/id/abc")).await.unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn entity_detail_includes_instances() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let car = create_entity(&base, "Car", &["color"]).await;
    create_instance(&base, "Car", json!([{ "name": "color", "value": "red" }])).await;

    let resp = reqwest::get(format!("{base}/entity/id/{}", car.id)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let detail: EntityDetail = resp.json().await.unwrap();
    assert_eq!(detail.entity.name, "Car");
    assert_eq!(detail.instances.len(), 1);
    assert_eq!(detail.instances[0].value("color"), Some("red"));
}

#[tokio::test]
async fn rename_and_delete_entity() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let car = create_entity(&base, "Car", &["color"]).await;
    create_instance(&base, "Car", json!([{ "name": "color", "value": "red" }])).await;
    let client = reqwest::Client::new();

    let renamed: Entity = client
        .put(format!("{base}/entity/rename"))
        .json(&json!({ "id": car.id, "name": "Automobile" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed.name, "Automobile");

    let resp = client
        .delete(format!("{base}/entity/{}", car.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let instances: usize = reqwest::get(format!("{base}/instance/count"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(instances, 0);

    let resp = client
        .delete(format!("{base}/entity/{}", car.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn property_lifecycle() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let car = create_entity(&base, "Car", &["year"]).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/property/new"))
        .json(&json!({ "name": "color", "entity_id": car.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: PropertyDetail<Entity> = resp.json().await.unwrap();
    let color = created.property.clone();
    assert_eq!(color.entity_id, car.id);
    assert_eq!(created.entity.name, "Car");
    assert_eq!(created.entity.property_names(), vec!["year", "color"]);

    let resp = client
        .post(format!("{base}/property/new"))
        .json(&json!({ "name": "color", "entity_id": car.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let shown: PropertyDetail = reqwest::get(format!("{base}/property/id/{}", color.id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shown.property, color);
    assert_eq!(shown.entity, car.to_ref());

    let by_name: Vec<PropertyDetail> = reqwest::get(format!("{base}/property/name/color"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_name, vec![shown]);

    let renamed: PropertyDetail<Entity> = client
        .put(format!("{base}/property/rename"))
        .json(&json!({ "id": color.id, "name": "colour" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed.property.name, "colour");
    assert_eq!(renamed.entity.property_names(), vec!["year", "colour"]);

    let resp = client
        .delete(format!("{base}/property/{}", color.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: MessageResponse = resp.json().await.unwrap();
    assert_eq!(body.message, "Property deleted successfully.");

    let resp = reqwest::get(format!("{base}/property/id/{}", color.id)).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn property_lookup_by_name_nests_each_owner() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let car = create_entity(&base, "Car", &["color"]).await;
    let bike = create_entity(&base, "Bike", &["color"]).await;

    let found: Vec<PropertyDetail> = reqwest::get(format!("{base}/property/name/color"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let owners: Vec<EntityRef> = found.into_iter().map(|d| d.entity).collect();
    assert_eq!(owners, vec![car.to_ref(), bike.to_ref()]);
}

#[tokio::test]
async fn property_for_unknown_entity_is_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/property/new"))
        .json(&json!({ "name": "color", "entity_id": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn instance_ignores_unknown_properties_by_default() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color"]).await;
    let instance = create_instance(
        &base,
        "Car",
        json!([
            { "name": "color", "value": "red" },
            { "name": "wings", "value": 2 }
        ]),
    )
    .await;
    assert_eq!(instance.data.len(), 1);
    assert_eq!(instance.value("color"), Some("red"));
}

#[tokio::test]
async fn instance_with_only_unknown_properties_is_rejected() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color"]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/instance/new"))
        .json(&json!({ "entity": "Car", "properties": [{ "name": "wings", "value": "2" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn strict_mode_rejects_unknown_properties() {
    let base = spawn_test_server(ValidationMode::Strict).await;
    create_entity(&base, "Car", &["color"]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/instance/new"))
        .json(&json!({
            "entity": "Car",
            "properties": [
                { "name": "color", "value": "red" },
                { "name": "wings", "value": "2" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: MessageResponse = resp.json().await.unwrap();
    assert!(body.message.contains("wings"));
}

#[tokio::test]
async fn instance_for_unknown_entity_is_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/instance/new"))
        .json(&json!({ "entity": "Boat", "properties": [{ "name": "color", "value": "red" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn query_by_data_requires_every_predicate() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color", "doors"]).await;
    let red_two = create_instance(
        &base,
        "Car",
        json!([{ "name": "color", "value": "red" }, { "name": "doors", "value": "2" }]),
    )
    .await;
    create_instance(
        &base,
        "Car",
        json!([{ "name": "color", "value": "red" }, { "name": "doors", "value": "4" }]),
    )
    .await;

    let resp = query(
        &base,
        json!([{ "name": "color", "value": "red" }, { "name": "doors", "value": 2 }]),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let found: Vec<Instance> = resp.json().await.unwrap();
    assert_eq!(found, vec![red_two]);

    let resp = query(&base, json!([{ "name": "color", "value": "red" }])).await;
    let found: Vec<Instance> = resp.json().await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn query_by_data_without_matches_is_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color"]).await;
    create_instance(&base, "Car", json!([{ "name": "color", "value": "red" }])).await;

    let resp = query(&base, json!([{ "name": "color", "value": "blue" }])).await;
    assert_eq!(resp.status(), 404);
    let body: MessageResponse = resp.json().await.unwrap();
    assert_eq!(body.message, "No instances found.");
}

#[tokio::test]
async fn query_by_data_with_empty_list_returns_all() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color"]).await;
    create_instance(&base, "Car", json!([{ "name": "color", "value": "red" }])).await;
    create_instance(&base, "Car", json!([{ "name": "color", "value": "blue" }])).await;

    let resp = query(&base, json!([])).await;
    assert_eq!(resp.status(), 200);
    let found: Vec<Instance> = resp.json().await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn query_by_data_without_properties_field_is_rejected() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/instance/data"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn update_and_delete_instance() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    create_entity(&base, "Car", &["color", "doors"]).await;
    let car = create_instance(&base, "Car", json!([{ "name": "color", "value": "red" }])).await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/instance/update"))
        .json(&json!({
            "id": car.id,
            "properties": [
                { "name": "color", "value": "blue" },
                { "name": "doors", "value": "4" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Instance = resp.json().await.unwrap();
    assert_eq!(updated.value("color"), Some("blue"));
    assert_eq!(updated.value("doors"), Some("4"));

    let by_entity: Vec<Instance> = reqwest::get(format!("{base}/instance/entity/Car"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_entity, vec![updated]);

    let resp = client
        .delete(format!("{base}/instance/{}", car.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: MessageResponse = resp.json().await.unwrap();
    assert_eq!(body.message, "Instance deleted successfully.");

    let resp = reqwest::get(format!("{base}/instance/id/{}", car.id)).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn update_of_missing_instance_is_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::Client::new()
        .put(format!("{base}/instance/update"))
        .json(&json!({ "id": 99, "properties": [{ "name": "color", "value": "red" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server(ValidationMode::Lenient).await;
    let resp = reqwest::get(format!("{base}/nonexistent")).await.unwrap();
    assert_eq!(resp.status(), 404);
}
