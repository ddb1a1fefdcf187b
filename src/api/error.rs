//! Failure responses for the resource handlers

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::handlers::MessageResponse;

/// A handler failure: status plus the generic message the client sees.
///
/// The cause is only logged. Storage details never reach the response body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
    pub cause: String,
}

impl ApiError {
    /// Body could not be parsed (422)
    pub fn unprocessable(message: &'static str, cause: impl Display) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message,
            cause: cause.to_string(),
        }
    }

    /// Storage operation failed, including lookups that found nothing (400)
    pub fn bad_request(message: &'static str, cause: impl Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            cause: cause.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(
            status = self.status.as_u16(),
            cause = %self.cause,
            "{}",
            self.message
        );

        (
            self.status,
            Json(MessageResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}
