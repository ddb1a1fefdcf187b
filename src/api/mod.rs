//! HTTP API server

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::storage::PlantStore;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Build the API router using the provided application state
///
/// The bare `/api/<op>/` paths exist so an empty id reaches the handler and
/// gets the "id is required" answer instead of a routing 404.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::hello))
        .route("/health", get(handlers::health))
        .nest(
            "/api",
            Router::new()
                .route("/create_plant", post(handlers::create_plant))
                .route("/get_plants", get(handlers::get_plants))
                .route("/get_plant/", get(handlers::get_plant))
                .route("/get_plant/:id", get(handlers::get_plant))
                .route("/update_plant/", put(handlers::update_plant))
                .route("/update_plant/:id", put(handlers::update_plant))
                .route("/delete_plant/", delete(handlers::delete_plant))
                .route("/delete_plant/:id", delete(handlers::delete_plant)),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Convenience helper when only a store is at hand
pub fn create_store_router(store: Arc<dyn PlantStore>) -> Router {
    create_router(AppState::new(store))
}
