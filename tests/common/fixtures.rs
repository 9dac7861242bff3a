use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;

use schematic_resolver::detection::{Recognition, StructureRecognizer, TextRecognizer};
use schematic_resolver::error::Result as ExtractResult;
use schematic_resolver::{BoundingBox, ExtractError, Figure, Panel, TextLine};

/// White canvas of the given size
pub fn blank_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255u8, 255u8, 255u8]))
}

/// Paint a solid black rectangle
pub fn fill_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32) {
    for py in y..y + height {
        for px in x..x + width {
            img.put_pixel(px, py, Rgb([0u8, 0u8, 0u8]));
        }
    }
}

/// Figure with a black rectangle per `(x, y, width, height)` entry
pub fn figure_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Figure {
    let mut img = blank_image(width, height);
    for &(x, y, w, h) in rects {
        fill_rect(&mut img, x, y, w, h);
    }
    Figure::from_image(DynamicImage::ImageRgb8(img), Some(128))
}

/// Two 60x60 diagrams side by side, each with a small label underneath
pub fn two_diagram_figure() -> Figure {
    figure_with_rects(
        300,
        200,
        &[
            (20, 20, 60, 60),
            (180, 20, 60, 60),
            (40, 100, 20, 8),
            (200, 100, 20, 8),
        ],
    )
}

pub fn panel(left: u32, top: u32, width: u32, height: u32) -> Panel {
    Panel::new(left, top, width, height, 0)
}

pub fn text_line(text: &str) -> TextLine {
    TextLine {
        text: text.to_string(),
        bbox: BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        },
        confidence: 0.9,
    }
}

/// Geometry-only sort key for comparing panel sets
pub fn sorted_geometry(panels: &[Panel]) -> Vec<(u32, u32, u32, u32)> {
    let mut geometry: Vec<_> = panels
        .iter()
        .map(|p| (p.left, p.top, p.width, p.height))
        .collect();
    geometry.sort();
    geometry
}

/// Text recognizer answering from a table keyed by label position
#[derive(Default)]
pub struct FakeOcr {
    lines: HashMap<(u32, u32), Vec<String>>,
}

impl FakeOcr {
    pub fn with_label(mut self, left: u32, top: u32, lines: &[&str]) -> Self {
        self.lines
            .insert((left, top), lines.iter().map(|l| l.to_string()).collect());
        self
    }
}

impl TextRecognizer for FakeOcr {
    fn read_label(&self, _figure: &Figure, panel: &Panel) -> ExtractResult<Vec<TextLine>> {
        Ok(self
            .lines
            .get(&(panel.left, panel.top))
            .map(|lines| {
                lines
                    .iter()
                    .map(|text| TextLine {
                        text: text.clone(),
                        bbox: panel.bbox(),
                        confidence: 0.9,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Text recognizer that always fails
pub struct BrokenOcr;

impl TextRecognizer for BrokenOcr {
    fn read_label(&self, _figure: &Figure, panel: &Panel) -> ExtractResult<Vec<TextLine>> {
        Err(ExtractError::Ocr {
            panel: panel.tag,
            message: "engine unavailable".to_string(),
        })
    }
}

/// Structure recognizer producing `C[<var>:<value>]...` so tests can see the
/// substitutions it was given; plain diagrams come back as `template`
pub struct FakeRecognizer {
    pub template: String,
}

impl FakeRecognizer {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }
}

impl StructureRecognizer for FakeRecognizer {
    fn read_diagram(
        &self,
        _figure: &Figure,
        _panel: &Panel,
        substitutions: &[(String, String)],
    ) -> ExtractResult<Recognition> {
        let smiles = if substitutions.is_empty() {
            self.template.clone()
        } else {
            substitutions
                .iter()
                .fold(String::from("C"), |acc, (var, value)| format!("{}[{}:{}]", acc, var, value))
        };
        Ok(Recognition {
            smiles,
            confidence: 5.0,
        })
    }
}
