use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use eavstore_model::{Entity, EntityId, Property, PropertyDetail, PropertyId};
use serde::Deserialize;

use super::body;
use crate::error::required;
use crate::{ApiError, AppState, MessageResponse};

#[derive(Debug, Deserialize)]
struct CreatePropertyRequest {
    name: Option<String>,
    entity_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
struct RenamePropertyRequest {
    id: Option<PropertyId>,
    name: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/count", get(count))
        .route("/id/{id}", get(show))
        .route("/name/{name}", get(show_by_name))
        .route("/new", post(create))
        .route("/rename", put(rename))
        .route("/{id}", delete(destroy))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.run(|store| store.properties().list()).await?))
}

async fn count(State(state): State<AppState>) -> Result<Json<usize>, ApiError> {
    Ok(Json(state.run(|store| store.properties().count()).await?))
}

async fn show(
    State(state): State<AppState>,
    id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<PropertyDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(
        state
            .run(move |store| store.properties().find_with_entity(id))
            .await?,
    ))
}

async fn show_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<PropertyDetail>>, ApiError> {
    Ok(Json(
        state
            .run(move |store| store.properties().find_by_name_with_entity(&name))
            .await?,
    ))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyDetail<Entity>>), ApiError> {
    let request = body(payload)?;
    let name = required(request.name, "name")?;
    let entity_id = required(request.entity_id, "entity_id")?;
    let detail = state
        .run(move |store| {
            let property = store.properties().store(&name, entity_id)?;
            store.properties().find_with_owner(property.id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn rename(
    State(state): State<AppState>,
    payload: Result<Json<RenamePropertyRequest>, JsonRejection>,
) -> Result<Json<PropertyDetail<Entity>>, ApiError> {
    let request = body(payload)?;
    let id = required(request.id, "id")?;
    let name = required(request.name, "name")?;
    Ok(Json(
        state
            .run(move |store| {
                store.properties().rename(id, &name)?;
                store.properties().find_with_owner(id)
            })
            .await?,
    ))
}

async fn destroy(
    State(state): State<AppState>,
    id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state.run(move |store| store.properties().destroy(id)).await?;
    Ok(Json(MessageResponse::new("Property deleted successfully.")))
}
