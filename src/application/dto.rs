use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::DetectionBox,
    errors::{DomainError, DomainResult},
};

pub const STATUS_MESSAGE: &str = "YOLO Backend Running";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessFrameRequest {
    /// Data URL del canvas: `data:image/jpeg;base64,<datos>`.
    pub frame: String,
}

impl ProcessFrameRequest {
    /// Devuelve la parte base64 (lo que va tras la primera coma).
    pub fn base64_payload(&self) -> DomainResult<&str> {
        self.frame
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| DomainError::Decode("el frame no contiene el separador ',' del data URL".into()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessFrameResponse {
    pub bounding_boxes: Vec<DetectionBox>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

impl Default for StatusResponse {
    fn default() -> Self {
        Self { message: STATUS_MESSAGE.to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_text_after_first_comma() {
        let req = ProcessFrameRequest { frame: "data:image/png;base64,QUJD".into() };
        assert_eq!(req.base64_payload().unwrap(), "QUJD");
    }

    #[test]
    fn missing_comma_is_a_decode_error() {
        let req = ProcessFrameRequest { frame: "QUJD".into() };
        assert!(matches!(req.base64_payload(), Err(DomainError::Decode(_))));
    }

    #[test]
    fn response_serializes_expected_shape() {
        let res = ProcessFrameResponse {
            bounding_boxes: vec![DetectionBox { x: 1, y: 2, width: 3, height: 4, name: "cat".into() }],
        };
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v, serde_json::json!({
            "bounding_boxes": [{ "x": 1, "y": 2, "width": 3, "height": 4, "name": "cat" }]
        }));
    }
}
