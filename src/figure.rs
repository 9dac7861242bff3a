use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader};

use crate::detection::preprocessing::{self, FloatImage, INK};
use crate::error::{ExtractError, Result};
use crate::models::Panel;

/// A scanned figure in two aligned representations: a normalized luma grid for
/// collaborators and a binary ink grid for segmentation.
#[derive(Debug, Clone)]
pub struct Figure {
    pub img: FloatImage,
    pub raw: GrayImage,
    source: DynamicImage,
}

impl Figure {
    /// Decode an image file and binarize it with Otsu's level
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_threshold(path, None)
    }

    pub fn open_with_threshold<P: AsRef<Path>>(path: P, threshold: Option<u8>) -> Result<Self> {
        let path = path.as_ref();
        let decoded = ImageReader::open(path)
            .map_err(|e| ExtractError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?
            .with_guessed_format()
            .map_err(|e| ExtractError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?
            .decode()
            .map_err(|source| ExtractError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_image(decoded, threshold))
    }

    pub fn from_image(image: DynamicImage, threshold: Option<u8>) -> Self {
        let gray = preprocessing::to_grayscale(&image);
        let raw = preprocessing::binarize(&gray, threshold);
        let img = preprocessing::to_normalized(&image);
        Self {
            img,
            raw,
            source: image,
        }
    }

    /// Same figure with a replacement binary grid
    pub(crate) fn with_raw(&self, raw: GrayImage) -> Self {
        Self {
            img: self.img.clone(),
            raw,
            source: self.source.clone(),
        }
    }

    pub fn width(&self) -> u32 {
        self.raw.width()
    }

    pub fn height(&self) -> u32 {
        self.raw.height()
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Panel covering the whole figure
    pub fn bounding_box(&self) -> Panel {
        Panel::new(0, 0, self.width(), self.height(), 0)
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.raw.get_pixel(x, y)[0] == INK
    }

    /// Number of ink pixels inside a panel, clamped to the figure
    pub fn ink_count(&self, panel: &Panel) -> u64 {
        let right = panel.right().min(self.width());
        let bottom = panel.bottom().min(self.height());
        let mut count = 0;
        for y in panel.top..bottom {
            for x in panel.left..right {
                if self.is_ink(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Crop a panel out of the original artwork for the OCR and structure collaborators
    pub fn crop(&self, panel: &Panel) -> Option<DynamicImage> {
        let x = panel.left.min(self.width());
        let y = panel.top.min(self.height());
        let width = panel.width.min(self.width() - x);
        let height = panel.height.min(self.height() - y);

        // Ensure valid dimensions
        if width == 0 || height == 0 {
            return None;
        }

        Some(self.source.crop_imm(x, y, width, height))
    }
}
