//! API handlers
//!
//! One storage call per request (Update does a read then a write). Missing
//! ids are answered inline with a 400 and are not treated as handler
//! failures; every other failure goes through [`ApiError`].

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::{ApiError, AppState};
use crate::types::{NewPlant, Plant, PlantId, PlantPatch};
use crate::{Error, Result};

pub const GREETING: &str = "Hello, World!";

const REQUEST_FAILED: &str = "request failed";
const ID_REQUIRED: &str = "id is required";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub message: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

/// Liveness greeting
pub async fn hello() -> &'static str {
    GREETING
}

/// Readiness check against the store
pub async fn health(State(state): State<AppState>) -> Response {
    let backend = state.store.backend_name();
    let (code, status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(err) => {
            tracing::warn!(error = %err, backend, "Store ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            backend,
        }),
    )
        .into_response()
}

/// Create a plant
pub async fn create_plant(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewPlant>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(plant) = payload.map_err(|e| ApiError::unprocessable(REQUEST_FAILED, e))?;

    let plant = state
        .store
        .create(plant)
        .await
        .map_err(|e| ApiError::bad_request("could not create plant", e))?;

    tracing::info!(id = plant.id, "Plant created");

    Ok(Json(DataResponse {
        message: "plant created",
        data: plant,
    })
    .into_response())
}

/// List every plant
pub async fn get_plants(
    State(state): State<AppState>,
) -> std::result::Result<Json<DataResponse<Vec<Plant>>>, ApiError> {
    let plants = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::bad_request("could not get plants", e))?;

    Ok(Json(DataResponse {
        message: "plants fetched successfully",
        data: plants,
    }))
}

/// Fetch one plant by id
pub async fn get_plant(
    State(state): State<AppState>,
    id: std::result::Result<Path<String>, PathRejection>,
) -> std::result::Result<Response, ApiError> {
    const FAILED: &str = "could not get plant";

    let Some(raw) = path_id(id, FAILED)? else {
        return Ok(id_required());
    };

    let id = parse_id(&raw).map_err(|e| ApiError::bad_request(FAILED, e))?;
    let plant = state
        .store
        .get(id)
        .await
        .map_err(|e| ApiError::bad_request(FAILED, e))?;

    Ok(Json(DataResponse {
        message: "plant fetched successfully",
        data: plant,
    })
    .into_response())
}

/// Merge the body over the stored plant and save it
///
/// Read then write with no locking: two concurrent updates of the same id
/// can lose one of the writes.
pub async fn update_plant(
    State(state): State<AppState>,
    id: std::result::Result<Path<String>, PathRejection>,
    payload: std::result::Result<Json<PlantPatch>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    const NOT_LOADED: &str = "could not get plant";

    let Some(raw) = path_id(id, NOT_LOADED)? else {
        return Ok(id_required());
    };

    let id = parse_id(&raw).map_err(|e| ApiError::bad_request(NOT_LOADED, e))?;
    let mut plant = state
        .store
        .get(id)
        .await
        .map_err(|e| ApiError::bad_request(NOT_LOADED, e))?;

    // The body is only looked at once the record is known to exist.
    let Json(patch) = payload.map_err(|e| ApiError::unprocessable(REQUEST_FAILED, e))?;
    if patch.is_empty() {
        tracing::debug!(id, "Update carries no fields");
    }
    plant.apply(patch);

    let plant = state
        .store
        .save(&plant)
        .await
        .map_err(|e| ApiError::bad_request("could not update plant", e))?;

    tracing::info!(id, "Plant updated");

    Ok(Json(DataResponse {
        message: "plant updated successfully",
        data: plant,
    })
    .into_response())
}

/// Delete by id; deleting a missing id still succeeds
pub async fn delete_plant(
    State(state): State<AppState>,
    id: std::result::Result<Path<String>, PathRejection>,
) -> std::result::Result<Response, ApiError> {
    const FAILED: &str = "could not delete plant";

    let Some(raw) = path_id(id, FAILED)? else {
        return Ok(id_required());
    };

    let id = parse_id(&raw).map_err(|e| ApiError::bad_request(FAILED, e))?;
    let removed = state
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::bad_request(FAILED, e))?;

    if removed == 0 {
        tracing::debug!(id, "Delete matched no rows");
    } else {
        tracing::info!(id, "Plant deleted");
    }

    Ok(Json(MessageResponse {
        message: "plant deleted successfully",
    })
    .into_response())
}

/// `Ok(None)` when the id segment is missing or blank. Any other path
/// rejection (bad percent-encoding, say) is the operation's own failure.
fn path_id(
    id: std::result::Result<Path<String>, PathRejection>,
    failed: &'static str,
) -> std::result::Result<Option<String>, ApiError> {
    match id {
        Ok(Path(id)) if id.trim().is_empty() => Ok(None),
        Ok(Path(id)) => Ok(Some(id)),
        Err(PathRejection::MissingPathParams(_)) => Ok(None),
        Err(rejection) => Err(ApiError::bad_request(failed, rejection)),
    }
}

fn id_required() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse {
            message: ID_REQUIRED,
        }),
    )
        .into_response()
}

fn parse_id(raw: &str) -> Result<PlantId> {
    raw.trim()
        .parse::<PlantId>()
        .map_err(|_| Error::InvalidId(raw.to_string()))
}
