use clap::Parser;

use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Opciones de arranque del servidor. Los valores por defecto reproducen el despliegue
/// habitual: frontend Vite en :5173 y modelo `yolov8n` exportado a ONNX.
#[derive(Debug, Clone, Parser)]
#[command(name = "yolo-frame-backend", version, about)]
pub struct ServerConfig {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Modelo YOLO exportado a ONNX.
    #[arg(long, default_value = "models/yolov8n.onnx")]
    pub model: String,

    /// Único origen autorizado por CORS.
    #[arg(long, default_value = "http://localhost:5173")]
    pub frontend_origin: String,

    #[arg(long, default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, default_value_t = 4)]
    pub intra_threads: usize,

    /// Guarda cada frame procesado (con sus cajas) en `--save-dir`.
    #[arg(long)]
    pub save_frames: bool,

    #[arg(long, default_value = "saved_frames")]
    pub save_dir: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId::from_path(&self.model),
            params: YoloParams { input_size: self.input_size, ..YoloParams::default() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_usual_deployment() {
        let cfg = ServerConfig::parse_from(["yolo-frame-backend"]);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.frontend_origin, "http://localhost:5173");
        assert!(!cfg.save_frames);

        let infer = cfg.inference();
        assert_eq!(infer.model.name, "yolov8n");
        assert_eq!(infer.params.input_size, 640);
        assert_eq!(infer.params.conf_threshold, 0.25);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::parse_from([
            "yolo-frame-backend",
            "--port", "9000",
            "--model", "weights/yolo11s.onnx",
            "--input-size", "1280",
            "--save-frames",
        ]);
        assert_eq!(cfg.port, 9000);
        assert!(cfg.save_frames);
        assert_eq!(cfg.inference().model.name, "yolo11s");
        assert_eq!(cfg.inference().params.input_size, 1280);
    }
}
