use axum::{extract::{rejection::JsonRejection, State}, Json};

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{ProcessFrameRequest, ProcessFrameResponse, StatusResponse};
use crate::domain::errors::DomainError;

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::default())
}

pub async fn process_frame(
    State(st): State<HttpState>,
    payload: Result<Json<ProcessFrameRequest>, JsonRejection>,
) -> Result<Json<ProcessFrameResponse>, ApiError> {
    // Un cuerpo sin `frame` (o que no es JSON) también es un error de decodificación.
    let Json(req) = payload.map_err(|e| DomainError::Decode(e.body_text()))?;

    let bounding_boxes = st.detection.process(req).await?;
    Ok(Json(ProcessFrameResponse { bounding_boxes }))
}
