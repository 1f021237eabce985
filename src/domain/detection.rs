use serde::{Deserialize, Serialize};

/// Detección tal y como la produce el detector (esquinas en píxeles de la imagen original).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

/// Caja normalizada que recibe el frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub name: String,
}

impl From<&Detection> for DetectionBox {
    /// Las esquinas se truncan a enteros antes de restar; el ancho y alto no se recortan a cero.
    fn from(d: &Detection) -> Self {
        let (x_min, y_min) = (d.x1 as i32, d.y1 as i32);
        let (x_max, y_max) = (d.x2 as i32, d.y2 as i32);
        Self {
            x: x_min,
            y: y_min,
            width: x_max.saturating_sub(x_min),
            height: y_max.saturating_sub(y_min),
            name: d.label.clone(),
        }
    }
}
