use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

/// Which of the two marker sizes an icon is drawn for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconVariant {
    Regular,
    Selected,
}

impl From<bool> for IconVariant {
    fn from(selected: bool) -> Self {
        if selected {
            Self::Selected
        } else {
            Self::Regular
        }
    }
}

/// Bitmap handed to a map surface as a placemark icon.
///
/// Cloning is cheap; the pixels are shared.
#[derive(Clone)]
pub struct MarkerIcon {
    image: Arc<RgbaImage>,
    has_photo: bool,
}

impl MarkerIcon {
    pub fn new(image: RgbaImage, has_photo: bool) -> Self {
        Self {
            image: Arc::new(image),
            has_photo,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// False for shell icons (shadow and border only)
    pub fn has_photo(&self) -> bool {
        self.has_photo
    }
}

impl fmt::Debug for MarkerIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerIcon")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("has_photo", &self.has_photo)
            .finish()
    }
}
