use std::sync::Arc;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Contiene el caso de uso; el modelo vive dentro del detector, cargado una sola vez.
#[derive(Clone)]
pub struct HttpState {
    pub detection: Arc<DetectionService>,
}
