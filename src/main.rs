mod domain;
mod application;
mod adapters;
mod config;

use std::sync::Arc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::services::{DetectionService, ModelService};
use crate::adapters::{
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    storage::frame_recorder::FsFrameRecorder,
    http::{cors_layer, router, state::HttpState},
};
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::parse();
    let infer = cfg.inference();

    // 2. Validar y cargar el modelo una sola vez; se comparte entre todas las peticiones.
    tracing::info!("🔧 Cargando modelo {} ({})...", infer.model.name, infer.model.onnx_path);
    ModelService::new(Arc::new(OnnxModelCatalog::new()))
        .validate(&infer.model)
        .await?;
    let engine = OnnxYoloEngine::load(&infer.model.onnx_path, infer.params, cfg.intra_threads)?;

    // 3. Caso de uso de detección (y grabación opcional de frames)
    let mut detection = DetectionService::new(Arc::new(OnnxDetector::new(engine)));
    if cfg.save_frames {
        let recorder = FsFrameRecorder::new(&cfg.save_dir)?;
        tracing::info!("📂 Guardando frames procesados en '{}'", cfg.save_dir);
        detection = detection.with_recorder(Arc::new(recorder));
    }

    let state = HttpState { detection: Arc::new(detection) };

    // 4. Router de Axum con CORS restringido al frontend
    let app = router(state, cors_layer(&cfg.frontend_origin)?);

    // 5. Lanzar el Servidor
    let addr = cfg.bind_addr();
    tracing::info!("🚀 Servidor YOLO iniciado en http://{}", addr);
    tracing::info!("🌐 Origen permitido por CORS: {}", cfg.frontend_origin);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
