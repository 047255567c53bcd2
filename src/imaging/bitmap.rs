//! Decoded photos and the CPU-drawable capability.
//!
//! Photo loaders may hand back pixels that live in graphics memory (a GPU
//! texture, a hardware buffer). Those cannot be composed on a software
//! canvas, so they must be read back into an [`RgbaImage`] first.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::{MapError, Result};

/// Pixel storage that is not directly addressable by the CPU
pub trait HardwarePixels: Send + Sync + fmt::Debug {
    fn dimensions(&self) -> (u32, u32);

    /// Copies the pixels into CPU memory
    fn read_back(&self) -> Result<RgbaImage>;
}

/// A decoded photo as produced by a [`PhotoLoader`](crate::imaging::loader::PhotoLoader)
#[derive(Debug, Clone)]
pub enum DecodedPhoto {
    Software(RgbaImage),
    Hardware(Arc<dyn HardwarePixels>),
}

impl DecodedPhoto {
    /// Decodes any format the `image` crate understands
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::Software(image.to_rgba8()))
    }

    /// Whether the pixels can be drawn on a software canvas as they are
    pub fn is_cpu_drawable(&self) -> bool {
        matches!(self, Self::Software(_))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Software(image) => image.dimensions(),
            Self::Hardware(pixels) => pixels.dimensions(),
        }
    }

    /// Converts into a CPU-drawable buffer, reading back hardware pixels if needed
    pub fn into_software(self) -> Result<RgbaImage> {
        let image = match self {
            Self::Software(image) => image,
            Self::Hardware(pixels) => {
                let image = pixels.read_back()?;
                if image.dimensions() != pixels.dimensions() {
                    return Err(MapError::Image(format!(
                        "hardware read-back returned {:?}, expected {:?}",
                        image.dimensions(),
                        pixels.dimensions()
                    )));
                }
                image
            }
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(MapError::Image("photo has no pixels".into()));
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[derive(Debug)]
    struct FakeTexture {
        size: (u32, u32),
        readable: bool,
    }

    impl HardwarePixels for FakeTexture {
        fn dimensions(&self) -> (u32, u32) {
            self.size
        }

        fn read_back(&self) -> Result<RgbaImage> {
            if self.readable {
                Ok(RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([1, 2, 3, 255])))
            } else {
                Err(MapError::Image("texture lost".into()))
            }
        }
    }

    #[test]
    fn test_software_photo_is_drawable() {
        let photo = DecodedPhoto::Software(RgbaImage::new(4, 3));
        assert!(photo.is_cpu_drawable());
        assert_eq!(photo.dimensions(), (4, 3));
        assert_eq!(photo.into_software().unwrap().dimensions(), (4, 3));
    }

    #[test]
    fn test_hardware_photo_is_read_back() {
        let photo = DecodedPhoto::Hardware(Arc::new(FakeTexture {
            size: (8, 8),
            readable: true,
        }));
        assert!(!photo.is_cpu_drawable());

        let image = photo.into_software().unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_failed_read_back_is_an_error() {
        let photo = DecodedPhoto::Hardware(Arc::new(FakeTexture {
            size: (8, 8),
            readable: false,
        }));
        assert!(photo.into_software().is_err());
    }

    #[test]
    fn test_empty_and_garbage_photos_are_rejected() {
        assert!(DecodedPhoto::Software(RgbaImage::new(0, 0)).into_software().is_err());
        assert!(matches!(
            DecodedPhoto::decode(b"definitely not a jpeg"),
            Err(MapError::Decode(_))
        ));
    }
}
