use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use tracing::{info, warn};

use crate::adapters::onnx::labels::{coco_labels, parse_names_metadata};
use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloEngine {
    session: Session,
    params: YoloParams,
    labels: Vec<String>,
}

/// Escala y desplazamiento aplicados por el letterbox, para deshacerlos en la salida.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl OnnxYoloEngine {
    pub fn load(path: &str, params: YoloParams, intra_threads: usize) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        let labels = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .and_then(|raw| parse_names_metadata(&raw))
            .unwrap_or_else(|| {
                warn!("El modelo no trae tabla de clases en metadatos; se usa COCO-80");
                coco_labels()
            });

        info!("Modelo cargado: {} ({} clases, entrada {}px)", path, labels.len(), params.input_size);

        Ok(Self { session, params, labels })
    }

    pub fn infer(&mut self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let (input, lb) = letterbox(rgb, self.params.input_size)?;
        let input_tensor = Tensor::from_array(input)?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[0] != 1 || dims[1] < 5 {
            bail!("salida inesperada del modelo: {:?} (se esperaba [1, 4 + nc, N])", dims);
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view
            .index_axis(Axis(0), 0)
            .into_dimensionality::<ndarray::Ix2>()?;

        Ok(decode_predictions(view, &lb, &self.params, &self.labels))
    }
}

/// Redimensiona manteniendo proporción y rellena con gris hasta `size`×`size` (NCHW, RGB, 0..1).
pub fn letterbox(rgb: &RgbImage, size: u32) -> Result<(Array4<f32>, Letterbox)> {
    let (orig_w, orig_h) = rgb.dimensions();
    if orig_w == 0 || orig_h == 0 || size == 0 {
        bail!("dimensiones inválidas: {}x{} -> {}", orig_w, orig_h, size);
    }

    let scale = (size as f32 / orig_w as f32).min(size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, size);
    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

    let pad_x = ((size - new_w) / 2) as usize;
    let pad_y = ((size - new_h) / 2) as usize;

    let imgsz = size as usize;
    let mut input = Array4::<f32>::from_elem((1, 3, imgsz, imgsz), PAD_VALUE);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (px, py) = (x as usize + pad_x, y as usize + pad_y);
        input[[0, 0, py, px]] = pixel[0] as f32 / 255.0;
        input[[0, 1, py, px]] = pixel[1] as f32 / 255.0;
        input[[0, 2, py, px]] = pixel[2] as f32 / 255.0;
    }

    Ok((
        input,
        Letterbox { scale, pad_x: pad_x as f32, pad_y: pad_y as f32, orig_w, orig_h },
    ))
}

/// Convierte la salida `[4 + nc, N]` (cx, cy, w, h, puntuaciones) en detecciones
/// sobre la imagen original: umbral de confianza, NMS por clase y límite de cajas.
pub fn decode_predictions(
    view: ArrayView2<f32>,
    lb: &Letterbox,
    params: &YoloParams,
    labels: &[String],
) -> Vec<Detection> {
    let num_candidates = view.shape()[1];
    let (max_x, max_y) = (lb.orig_w as f32, lb.orig_h as f32);

    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > params.conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            let unpad_x = |v: f32| ((v - lb.pad_x) / lb.scale).clamp(0.0, max_x);
            let unpad_y = |v: f32| ((v - lb.pad_y) / lb.scale).clamp(0.0, max_y);

            detections.push(Detection {
                x1: unpad_x(cx - w / 2.0),
                y1: unpad_y(cy - h / 2.0),
                x2: unpad_x(cx + w / 2.0),
                y2: unpad_y(cy + h / 2.0),
                score: max_score,
                class_id,
                label: labels
                    .get(class_id)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", class_id)),
            });
        }
    }

    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept = nms_per_class(detections, params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

/// NMS voraz; sólo se suprimen cajas de la misma clase. Entrada ordenada por puntuación.
fn nms_per_class(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

fn iou(a: &Detection, b: &Detection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use ndarray::Array2;

    fn labels() -> Vec<String> {
        vec!["person".into(), "car".into(), "dog".into()]
    }

    /// Construye una salida `[4 + 3, N]` a partir de (cx, cy, w, h, clase, score).
    fn output(cands: &[(f32, f32, f32, f32, usize, f32)]) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((7, cands.len()));
        for (i, &(cx, cy, w, h, cls, score)) in cands.iter().enumerate() {
            out[[0, i]] = cx;
            out[[1, i]] = cy;
            out[[2, i]] = w;
            out[[3, i]] = h;
            out[[4 + cls, i]] = score;
        }
        out
    }

    fn identity(w: u32, h: u32) -> Letterbox {
        Letterbox { scale: 1.0, pad_x: 0.0, pad_y: 0.0, orig_w: w, orig_h: h }
    }

    #[test]
    fn letterbox_keeps_aspect_and_pads_with_grey() {
        let img = RgbImage::from_pixel(320, 160, Rgb([255, 0, 0]));
        let (input, lb) = letterbox(&img, 640).unwrap();

        assert_eq!(input.shape(), &[1, 3, 640, 640]);
        assert_eq!(lb.scale, 2.0);
        assert_eq!((lb.pad_x, lb.pad_y), (0.0, 160.0));
        assert_eq!(input[[0, 0, 10, 10]], PAD_VALUE);
        assert!(input[[0, 0, 320, 320]] > 0.99);
        assert!(input[[0, 1, 320, 320]] < 0.01);
    }

    #[test]
    fn letterbox_rejects_empty_image() {
        assert!(letterbox(&RgbImage::new(0, 10), 640).is_err());
    }

    #[test]
    fn below_threshold_candidates_are_dropped() {
        let out = output(&[(50.0, 50.0, 20.0, 20.0, 0, 0.2), (150.0, 150.0, 20.0, 20.0, 1, 0.8)]);
        let dets = decode_predictions(out.view(), &identity(640, 640), &YoloParams::default(), &labels());
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "car");
        assert_eq!((dets[0].x1, dets[0].y1, dets[0].x2, dets[0].y2), (140.0, 140.0, 160.0, 160.0));
    }

    #[test]
    fn nms_suppresses_same_class_only() {
        let out = output(&[
            (100.0, 100.0, 40.0, 40.0, 0, 0.6),
            (102.0, 101.0, 40.0, 40.0, 0, 0.9),
            (101.0, 100.0, 40.0, 40.0, 2, 0.7),
        ]);
        let dets = decode_predictions(out.view(), &identity(640, 640), &YoloParams::default(), &labels());
        let summary: Vec<_> = dets.iter().map(|d| (d.label.as_str(), d.score)).collect();
        assert_eq!(summary, vec![("person", 0.9), ("dog", 0.7)]);
    }

    #[test]
    fn boxes_are_mapped_back_and_clipped() {
        let lb = Letterbox { scale: 2.0, pad_x: 0.0, pad_y: 160.0, orig_w: 320, orig_h: 160 };
        let out = output(&[(100.0, 260.0, 40.0, 20.0, 0, 0.9), (630.0, 300.0, 40.0, 20.0, 1, 0.9)]);
        let dets = decode_predictions(out.view(), &lb, &YoloParams::default(), &labels());

        assert_eq!((dets[0].x1, dets[0].y1, dets[0].x2, dets[0].y2), (40.0, 45.0, 60.0, 55.0));
        assert_eq!(dets[1].x2, 320.0);
    }

    #[test]
    fn respects_max_detections_and_unknown_classes() {
        let params = YoloParams { max_detections: 2, ..YoloParams::default() };
        let out = output(&[
            (10.0, 10.0, 5.0, 5.0, 0, 0.5),
            (100.0, 100.0, 5.0, 5.0, 0, 0.9),
            (200.0, 200.0, 5.0, 5.0, 0, 0.7),
        ]);
        let dets = decode_predictions(out.view(), &identity(640, 640), &params, &labels());
        assert_eq!(dets.iter().map(|d| d.score).collect::<Vec<_>>(), vec![0.9, 0.7]);

        let short = vec!["person".to_string()];
        let out = output(&[(10.0, 10.0, 5.0, 5.0, 2, 0.9)]);
        let dets = decode_predictions(out.view(), &identity(640, 640), &YoloParams::default(), &short);
        assert_eq!(dets[0].label, "class_2");
    }

    #[test]
    fn no_candidates_no_detections() {
        let out = Array2::<f32>::zeros((7, 0));
        assert!(decode_predictions(out.view(), &identity(64, 64), &YoloParams::default(), &labels()).is_empty());
    }
}
