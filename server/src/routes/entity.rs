use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use eavstore_model::{Entity, EntityDetail, EntityId};
use serde::Deserialize;
use tracing::debug;

use super::body;
use crate::error::required;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
struct CreateEntityRequest {
    name: Option<String>,
    #[serde(default)]
    properties: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RenameEntityRequest {
    id: Option<EntityId>,
    name: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/count", get(count))
        .route("/name/{name}", get(show_by_name))
        .route("/id/{id}", get(show_by_id))
        .route("/new", post(create))
        .route("/rename", put(rename))
        .route("/{id}", delete(destroy))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Entity>>, ApiError> {
    Ok(Json(state.run(|store| store.entities().list()).await?))
}

async fn count(State(state): State<AppState>) -> Result<Json<usize>, ApiError> {
    Ok(Json(state.run(|store| store.entities().count()).await?))
}

async fn show_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Entity>, ApiError> {
    state
        .run(move |store| store.entities().get_by_name(&name))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Entity not found.".to_string()))
}

async fn show_by_id(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<EntityDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.run(move |store| store.entity_detail(id)).await?))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entity>), ApiError> {
    let request = body(payload)?;
    let name = required(request.name, "name")?;
    let properties = request.properties;
    let entity = state
        .run(move |store| store.entities().create_with_properties(&name, &properties))
        .await?;
    debug!(entity_id = %entity.id, name = %entity.name, "entity created");
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn rename(
    State(state): State<AppState>,
    payload: Result<Json<RenameEntityRequest>, JsonRejection>,
) -> Result<Json<Entity>, ApiError> {
    let request = body(payload)?;
    let id = required(request.id, "id")?;
    let name = required(request.name, "name")?;
    Ok(Json(
        state
            .run(move |store| store.entities().rename(id, &name))
            .await?,
    ))
}

async fn destroy(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.run(move |store| store.entities().delete(id)).await?;
    debug!(entity_id = %id, "entity deleted");
    Ok(StatusCode::NO_CONTENT)
}
