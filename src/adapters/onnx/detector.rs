use async_trait::async_trait;
use image::RgbImage;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, warn};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    frame::Frame,
};

/// Motor de inferencia síncrono que necesita acceso exclusivo para ejecutarse.
pub trait InferenceEngine: Send + 'static {
    fn infer(&mut self, rgb: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

impl InferenceEngine for OnnxYoloEngine {
    fn infer(&mut self, rgb: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        OnnxYoloEngine::infer(self, rgb)
    }
}

/// Adaptador del motor al puerto de detección.
/// La sesión de ONNX Runtime necesita `&mut`, así que sólo hay una inferencia en vuelo;
/// el resto de peticiones esperan en el mutex.
pub struct OnnxDetector<E: InferenceEngine = OnnxYoloEngine> {
    engine: Arc<Mutex<E>>,
}

impl<E: InferenceEngine> OnnxDetector<E> {
    pub fn new(engine: E) -> Self {
        Self { engine: Arc::new(Mutex::new(engine)) }
    }
}

#[async_trait]
impl<E: InferenceEngine> DetectorPort for OnnxDetector<E> {
    async fn detect(&self, frame: Frame) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();

        tokio::task::spawn_blocking(move || -> DomainResult<Vec<Detection>> {
            // El motor no guarda estado entre peticiones: tras un pánico se puede seguir usando.
            let mut eng = engine.lock().unwrap_or_else(|poisoned| {
                warn!("Motor de inferencia recuperado tras un pánico previo");
                PoisonError::into_inner(poisoned)
            });

            let t_infer_start = Instant::now();
            let detections = eng
                .infer(&frame.image)
                .map_err(|e| DomainError::Inference(format!("{:#}", e)))?;
            let infer_ms = t_infer_start.elapsed().as_secs_f32() * 1000.0;

            debug!(infer_ms, detections = detections.len(), "inferencia completada");
            Ok(detections)
        })
        .await
        .map_err(|e| DomainError::Inference(format!("tarea de inferencia abortada: {}", e)))?
    }
}
