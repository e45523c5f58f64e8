use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use eavstore_model::{Instance, InstanceId, PropertyValue};
use serde::Deserialize;
use tracing::debug;

use super::body;
use crate::error::required;
use crate::{ApiError, AppState, MessageResponse};

#[derive(Debug, Deserialize)]
struct CreateInstanceRequest {
    entity: Option<String>,
    properties: Option<Vec<PropertyValue>>,
}

#[derive(Debug, Deserialize)]
struct UpdateInstanceRequest {
    id: Option<InstanceId>,
    properties: Option<Vec<PropertyValue>>,
}

#[derive(Debug, Deserialize)]
struct DataQueryRequest {
    properties: Option<Vec<PropertyValue>>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/count", get(count))
        .route("/entity/{name}", get(by_entity))
        .route("/id/{id}", get(show))
        .route("/data", get(by_data))
        .route("/new", post(create))
        .route("/update", put(update))
        .route("/{id}", delete(destroy))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Instance>>, ApiError> {
    Ok(Json(state.run(|store| store.instances().list()).await?))
}

async fn count(State(state): State<AppState>) -> Result<Json<usize>, ApiError> {
    Ok(Json(state.run(|store| store.instances().count()).await?))
}

async fn by_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Instance>>, ApiError> {
    Ok(Json(
        state
            .run(move |store| store.instances().get_by_entity(&name))
            .await?,
    ))
}

async fn show(
    State(state): State<AppState>,
    id: Result<Path<InstanceId>, PathRejection>,
) -> Result<Json<Instance>, ApiError> {
    let Path(id) = id?;
    Ok(Json(
        state
            .run(move |store| store.instances().find_by_id(id))
            .await?,
    ))
}

/// Predicate query. An empty predicate list matches every instance; an
/// empty result is reported as 404.
async fn by_data(
    State(state): State<AppState>,
    payload: Result<Json<DataQueryRequest>, JsonRejection>,
) -> Result<Json<Vec<Instance>>, ApiError> {
    let predicates = required(body(payload)?.properties, "properties")?;
    let instances = state
        .run(move |store| store.instances().get_by_data(&predicates))
        .await?;
    if instances.is_empty() {
        return Err(ApiError::NotFound("No instances found.".to_string()));
    }
    Ok(Json(instances))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateInstanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Instance>), ApiError> {
    let request = body(payload)?;
    let entity = required(request.entity, "entity")?;
    let properties = required(request.properties, "properties")?;
    let mode = state.mode();
    let instance = state
        .run(move |store| store.create_instance(&entity, &properties, mode))
        .await?;
    debug!(instance_id = %instance.id, entity = %instance.entity.name, "instance created");
    Ok((StatusCode::CREATED, Json(instance)))
}

async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateInstanceRequest>, JsonRejection>,
) -> Result<Json<Instance>, ApiError> {
    let request = body(payload)?;
    let id = required(request.id, "id")?;
    let properties = required(request.properties, "properties")?;
    let mode = state.mode();
    Ok(Json(
        state
            .run(move |store| store.update_instance(id, &properties, mode))
            .await?,
    ))
}

async fn destroy(
    State(state): State<AppState>,
    id: Result<Path<InstanceId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state.run(move |store| store.instances().destroy(id)).await?;
    debug!(instance_id = %id, "instance deleted");
    Ok(Json(MessageResponse::new("Instance deleted successfully.")))
}
