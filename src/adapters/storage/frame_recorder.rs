use image::Rgb;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

use crate::application::ports::FrameRecorderPort;
use crate::domain::{
    detection::DetectionBox,
    errors::{DomainError, DomainResult},
    frame::Frame,
};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Guarda en disco cada frame procesado con sus cajas dibujadas.
/// La escritura va en una tarea bloqueante aparte; la respuesta HTTP no la espera.
pub struct FsFrameRecorder {
    dir: PathBuf,
    counter: AtomicU64,
}

impl FsFrameRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> DomainResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DomainError::OperationFailed(format!("no se pudo crear {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir, counter: AtomicU64::new(0) })
    }

    /// `frame_<timestamp>_<n>.png`; el contador evita colisiones dentro del mismo milisegundo.
    pub fn next_file_name(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("frame_{}_{:06}.png", chrono::Local::now().format("%Y%m%d_%H%M%S_%3f"), n)
    }
}

impl FrameRecorderPort for FsFrameRecorder {
    fn record(&self, frame: Frame, boxes: Vec<DetectionBox>) {
        let path = self.dir.join(self.next_file_name());
        tokio::task::spawn_blocking(move || match save_annotated(&path, frame, &boxes) {
            Ok(()) => debug!("Frame guardado en {}", path.display()),
            Err(e) => error!("Error guardando frame: {}", e),
        });
    }
}

pub fn save_annotated(path: &Path, frame: Frame, boxes: &[DetectionBox]) -> DomainResult<()> {
    let mut img = frame.image;
    for b in boxes {
        // Las cajas degeneradas no se pueden dibujar.
        if b.width <= 0 || b.height <= 0 {
            continue;
        }
        draw_hollow_rect_mut(&mut img, Rect::at(b.x, b.y).of_size(b.width as u32, b.height as u32), BOX_COLOR);
    }
    img.save(path)
        .map_err(|e| DomainError::OperationFailed(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::collections::HashSet;

    #[test]
    fn file_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let rec = FsFrameRecorder::new(dir.path()).unwrap();
        let names: HashSet<_> = (0..500).map(|_| rec.next_file_name()).collect();
        assert_eq!(names.len(), 500);
        assert!(names.iter().all(|n| n.starts_with("frame_") && n.ends_with(".png")));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("saved_frames").join("hoy");
        FsFrameRecorder::new(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn saves_png_with_boxes_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.png");
        let frame = Frame::new(RgbImage::new(20, 20));
        let boxes = vec![
            DetectionBox { x: 2, y: 2, width: 10, height: 10, name: "cat".into() },
            DetectionBox { x: 5, y: 5, width: -3, height: 4, name: "dog".into() },
        ];

        save_annotated(&path, frame, &boxes).unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*saved.get_pixel(2, 2), BOX_COLOR);
        assert_eq!(*saved.get_pixel(7, 7), Rgb([0, 0, 0]));
    }

    #[tokio::test]
    async fn record_writes_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let rec = FsFrameRecorder::new(dir.path()).unwrap();
        rec.record(Frame::new(RgbImage::new(8, 8)), vec![]);

        let mut found = 0;
        for _ in 0..100 {
            found = std::fs::read_dir(dir.path()).unwrap().count();
            if found > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(found, 1);
    }
}
