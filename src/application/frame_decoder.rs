use base64::{prelude::BASE64_STANDARD, Engine};
use image::ImageFormat;

use crate::domain::{
    errors::{DomainError, DomainResult},
    frame::Frame,
};

/// Convierte el contenido base64 de un data URL en un frame RGB listo para el detector.
pub fn decode_frame(payload: &str) -> DomainResult<Frame> {
    // El navegador puede partir el base64 en varias líneas.
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DomainError::Decode(format!("base64 inválido: {}", e)))?;

    decode_image_bytes(&bytes)
}

/// Decodifica PNG/JPEG y normaliza a RGB8 sea cual sea el formato nativo del códec.
pub fn decode_image_bytes(bytes: &[u8]) -> DomainResult<Frame> {
    let format = image::guess_format(bytes)
        .map_err(|_| DomainError::Decode("los datos no son una imagen reconocible".into()))?;

    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(DomainError::Decode(format!("formato de imagen no soportado: {:?}", format)));
    }

    // Los propios códecs rechazan cabeceras de 0 píxeles.
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DomainError::Decode(format!("imagen corrupta: {}", e)))?;

    Ok(Frame::new(img.to_rgb8()))
}
