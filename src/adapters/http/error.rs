use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::error;

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// Cualquier fallo (decodificación o inferencia) llega al cliente como 500 + `detail`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.0.to_string();
        error!("Error procesando frame: {}", detail);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { detail })).into_response()
    }
}
