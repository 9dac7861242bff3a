use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
pub use ocrs::{ImageSource, OcrEngine}; // Re-export for use in other modules
use ocrs::{OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::figure::Figure;
use crate::models::{BoundingBox, Panel, TextLine};

/// White margin added around label crops before recognition
const LABEL_BORDER: u32 = 10;

/// `ocrs` reports no per-line score, so recognized lines get this one
const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Reads the text of a label panel.
///
/// Returns lines in reading order with boxes in figure coordinates. Finding no
/// text is not an error.
pub trait TextRecognizer: Send + Sync {
    fn read_label(&self, figure: &Figure, panel: &Panel) -> Result<Vec<TextLine>>;
}

/// Strip the whitespace OCR scatters through short chemical labels
pub fn clean_output(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Initialize OCR engine with models from standard cache location
pub fn init_ocr_engine() -> anyhow::Result<OcrEngine> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;

    let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
    let detection_model_path = cache_dir.join("text-detection.rten");
    let recognition_model_path = cache_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    init_ocr_engine_from(&detection_model_path, &recognition_model_path)
}

pub fn init_ocr_engine_from(detection_model: &Path, recognition_model: &Path) -> anyhow::Result<OcrEngine> {
    let detection_model = Model::load_file(detection_model)?;
    let recognition_model = Model::load_file(recognition_model)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Label crop prepared for OCR, remembering how to map back to the figure
#[derive(Debug, Clone)]
pub struct PreparedCrop {
    pub image: GrayImage,
    origin: (u32, u32),
    size: (u32, u32),
    scale: f32,
}

impl PreparedCrop {
    /// Crop a label, upscale short text to `min_height` and pad it with white
    pub fn new(figure: &Figure, panel: &Panel, min_height: u32) -> Option<Self> {
        let gray = figure.crop(panel)?.to_luma8();
        let (width, height) = gray.dimensions();

        let scale = if height < min_height {
            min_height as f32 / height as f32
        } else {
            1.0
        };
        let scaled = if scale > 1.0 {
            let scaled_w = ((width as f32 * scale).round() as u32).max(1);
            let scaled_h = ((height as f32 * scale).round() as u32).max(1);
            imageops::resize(&gray, scaled_w, scaled_h, FilterType::CatmullRom)
        } else {
            gray
        };

        let mut canvas = GrayImage::from_pixel(
            scaled.width() + 2 * LABEL_BORDER,
            scaled.height() + 2 * LABEL_BORDER,
            Luma([255u8]),
        );
        imageops::overlay(&mut canvas, &scaled, LABEL_BORDER.into(), LABEL_BORDER.into());

        Some(Self {
            image: canvas,
            origin: (panel.left, panel.top),
            size: (width, height),
            scale,
        })
    }

    /// Map a rectangle in crop pixels back into figure coordinates, clamped to the panel
    pub fn to_figure(&self, left: i32, top: i32, right: i32, bottom: i32) -> BoundingBox {
        let unscale = |v: i32, limit: u32| -> u32 {
            let local = (v - LABEL_BORDER as i32).max(0) as f32 / self.scale;
            (local.round() as u32).min(limit)
        };
        let x0 = unscale(left, self.size.0);
        let y0 = unscale(top, self.size.1);
        let x1 = unscale(right, self.size.0).max(x0);
        let y1 = unscale(bottom, self.size.1).max(y0);
        BoundingBox {
            x: self.origin.0 + x0,
            y: self.origin.1 + y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Text recognizer backed by the `ocrs` engine
pub struct OcrsRecognizer {
    engine: OcrEngine,
    /// Crops shorter than this are upscaled before recognition
    pub min_height: u32,
}

impl OcrsRecognizer {
    pub fn new(engine: OcrEngine) -> Self {
        Self {
            engine,
            min_height: 48,
        }
    }

    /// Load the detection and recognition models from `~/.cache/ocrs`
    pub fn from_cache() -> anyhow::Result<Self> {
        Ok(Self::new(init_ocr_engine()?))
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn read_label(&self, figure: &Figure, panel: &Panel) -> Result<Vec<TextLine>> {
        let ocr_error = |e: anyhow::Error| ExtractError::Ocr {
            panel: panel.tag,
            message: e.to_string(),
        };

        let Some(crop) = PreparedCrop::new(figure, panel, self.min_height) else {
            return Ok(Vec::new());
        };

        // ocrs expects RGB input
        let rgb = image::DynamicImage::ImageLuma8(crop.image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions()).map_err(|e| {
            ExtractError::Ocr {
                panel: panel.tag,
                message: e.to_string(),
            }
        })?;
        let input = self.engine.prepare_input(source).map_err(ocr_error)?;

        let words = self.engine.detect_words(&input).map_err(ocr_error)?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        let recognized = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(ocr_error)?;

        let lines: Vec<TextLine> = recognized
            .into_iter()
            .flatten()
            .filter_map(|line| {
                let text = clean_output(&line.to_string());
                if text.is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                Some(TextLine {
                    text,
                    bbox: crop.to_figure(rect.left(), rect.top(), rect.right(), rect.bottom()),
                    confidence: DEFAULT_CONFIDENCE,
                })
            })
            .collect();

        debug!(label = panel.tag, lines = lines.len(), "recognized label text");
        Ok(lines)
    }
}
