use std::sync::Arc;
use tracing::debug;

use crate::{
    application::{
        dto::ProcessFrameRequest,
        frame_decoder::decode_frame,
        ports::{DetectorPort, FrameRecorderPort, ModelCatalogPort},
    },
    domain::{
        detection::DetectionBox,
        errors::{DomainError, DomainResult},
        frame::Frame,
        model::ModelId,
    },
};

/// Caso de uso principal: frame en base64 -> cajas normalizadas.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    recorder: Option<Arc<dyn FrameRecorderPort>>,
}

impl DetectionService {
    pub fn new(detector: Arc<dyn DetectorPort>) -> Self {
        Self { detector, recorder: None }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn FrameRecorderPort>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Decodifica el data URL, ejecuta el detector y, si hay grabador, le pasa el resultado.
    pub async fn process(&self, req: ProcessFrameRequest) -> DomainResult<Vec<DetectionBox>> {
        let payload = req.base64_payload()?.to_owned();

        // base64 + códec de imagen son CPU puro: fuera del runtime async.
        let frame = tokio::task::spawn_blocking(move || decode_frame(&payload))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("tarea de decodificación abortada: {}", e)))??;

        debug!(width = frame.width(), height = frame.height(), "frame decodificado");

        // Sólo se copia el frame cuando hay que grabarlo.
        let to_record = self.recorder.as_ref().map(|r| (r.clone(), frame.clone()));

        let boxes = self.detect(frame).await?;

        if let Some((recorder, frame)) = to_record {
            recorder.record(frame, boxes.clone());
        }

        Ok(boxes)
    }

    /// Una llamada al detector por frame; el orden de salida es el del detector.
    pub async fn detect(&self, frame: Frame) -> DomainResult<Vec<DetectionBox>> {
        let detections = self.detector.detect(frame).await?;
        Ok(detections.iter().map(DetectionBox::from).collect())
    }
}

/// Valida el modelo antes de cargarlo en el arranque.
#[derive(Clone)]
pub struct ModelService {
    catalog: Arc<dyn ModelCatalogPort>,
}

impl ModelService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn validate(&self, model: &ModelId) -> DomainResult<()> {
        self.catalog.validate_model(model).await
    }
}
