use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Plain rectangle in figure coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rectangular region of a figure with no meaning until classified.
///
/// Equality and hashing look at geometry only; `tag` is a tracing id assigned
/// at segmentation time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Panel {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub tag: usize,
}

impl PartialEq for Panel {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left
            && self.top == other.top
            && self.width == other.width
            && self.height == other.height
    }
}

impl Eq for Panel {}

impl Hash for Panel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.left, self.top, self.width, self.height).hash(state);
    }
}

impl Panel {
    pub fn new(left: u32, top: u32, width: u32, height: u32, tag: usize) -> Self {
        Self { left, top, width, height, tag }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width as f64 + self.height as f64)
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get center coordinates
    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn center_distance(&self, other: &Panel) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// True when `other` lies entirely inside this panel (edges may touch)
    pub fn contains(&self, other: &Panel) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Axis-aligned gap between two boxes, 0 when they touch or overlap
    pub fn gap(&self, other: &Panel) -> f64 {
        let dx = if other.left >= self.right() {
            other.left - self.right()
        } else if self.left >= other.right() {
            self.left - other.right()
        } else {
            0
        };
        let dy = if other.top >= self.bottom() {
            other.top - self.bottom()
        } else if self.top >= other.bottom() {
            self.top - other.bottom()
        } else {
            0
        };
        ((dx as f64).powi(2) + (dy as f64).powi(2)).sqrt()
    }

    /// Minimal rectangle covering both panels, keeping the smaller tag
    pub fn union(&self, other: &Panel) -> Panel {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Panel {
            left,
            top,
            width: right - left,
            height: bottom - top,
            tag: self.tag.min(other.tag),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            x: self.left,
            y: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// Arrange panels row by row, top to bottom, and left to right within a row.
///
/// A panel joins the current row when its top edge lies above the row's
/// lowest bottom edge, so panels a few pixels out of line still read as one
/// row.
pub fn in_reading_order(mut panels: Vec<Panel>) -> Vec<Panel> {
    panels.sort_by_key(|p| (p.top, p.left, p.tag));

    let mut rows: Vec<Vec<Panel>> = Vec::new();
    let mut row_bottom = 0;
    for panel in panels {
        match rows.last_mut() {
            Some(row) if panel.top < row_bottom => {
                row_bottom = row_bottom.max(panel.bottom());
                row.push(panel);
            }
            _ => {
                row_bottom = panel.bottom();
                rows.push(vec![panel]);
            }
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by_key(|p| (p.left, p.top, p.tag));
            row
        })
        .collect()
}

/// One line of recognized label text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A piece of label text together with the box of the line it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub text: String,
    pub bbox: BoundingBox,
}

/// One row of a substituent table: all variable assignments for one compound
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RGroupCombination {
    /// Non-assignment segments of the line, in source order
    pub identifiers: Vec<String>,
    /// `(variable, value)` pairs in the order the variables appear
    pub pairs: Vec<(Token, Token)>,
}

impl RGroupCombination {
    /// Identifying name of the compound, the trailing identifier segment
    pub fn tag(&self) -> Option<&str> {
        self.identifiers.last().map(String::as_str)
    }

    pub fn has_assignments(&self) -> bool {
        !self.pairs.is_empty()
    }

    /// Pairs as plain strings, handy for lookups and assertions
    pub fn assignments(&self) -> Vec<(&str, &str)> {
        self.pairs
            .iter()
            .map(|(var, value)| (var.text.as_str(), value.text.as_str()))
            .collect()
    }
}

/// Panel holding identifying text for a diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub panel: Panel,
    pub text: Vec<TextLine>,
    pub r_group: Vec<RGroupCombination>,
}

impl Label {
    pub fn new(panel: Panel) -> Self {
        Self {
            panel,
            text: Vec::new(),
            r_group: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: Vec<TextLine>) -> Self {
        self.text = text;
        self
    }

    /// Text of every recognized line, in OCR order
    pub fn lines(&self) -> Vec<&str> {
        self.text.iter().map(|line| line.text.as_str()).collect()
    }

    pub fn has_r_group(&self) -> bool {
        self.r_group.iter().any(RGroupCombination::has_assignments)
    }
}

/// Panel depicting a chemical structure, with the label resolved for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub panel: Panel,
    pub label: Option<Label>,
}

impl Diagram {
    pub fn new(panel: Panel) -> Self {
        Self { panel, label: None }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn tag(&self) -> usize {
        self.panel.tag
    }
}

/// One molecule extracted from a figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub diagram_tag: usize,
    pub labels: Vec<String>,
    pub smiles: String,
    pub confidence: f32,
}
