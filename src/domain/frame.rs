use image::RgbImage;

/// Frame decodificado de una única petición (RGB de 8 bits, alto × ancho × 3).
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
