//! HTTP API for EAVStore.
//!
//! Three resource groups under `/api` (`entity`, `property`, `instance`)
//! mapped directly onto the store operations. Store calls run on tokio's
//! blocking pool.

mod error;
mod routes;

use axum::Router;
use eavstore_store::{EavStore, StoreResult, ValidationMode};
use serde::{Deserialize, Serialize};

pub use error::ApiError;

/// Body of deletion confirmations and error responses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// State shared by all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    store: EavStore,
    mode: ValidationMode,
}

impl AppState {
    pub fn new(store: EavStore, mode: ValidationMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Runs a store operation on the blocking pool.
    pub(crate) async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&EavStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
    }
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/entity", routes::entity::router())
        .nest("/api/property", routes::property::router())
        .nest("/api/instance", routes::instance::router())
        .with_state(state)
}
