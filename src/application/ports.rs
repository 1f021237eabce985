use async_trait::async_trait;
use crate::domain::{detection::{Detection, DetectionBox}, errors::DomainResult, frame::Frame, model::ModelId};

/// Detector opaco: imagen de entrada, detecciones en su orden nativo de salida.
/// Recibe el frame en propiedad para poder moverlo a un hilo bloqueante sin copiarlo.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, frame: Frame) -> DomainResult<Vec<Detection>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

/// Destino opcional de los frames procesados. No debe bloquear la respuesta.
pub trait FrameRecorderPort: Send + Sync {
    fn record(&self, frame: Frame, boxes: Vec<DetectionBox>);
}
