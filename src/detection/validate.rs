//! Scalar diagnostics over located diagrams, for external reporting only.

use crate::figure::Figure;
use crate::models::{Diagram, Panel};

/// Fraction of ink pixels inside a panel
pub fn pixel_ratio(figure: &Figure, panel: &Panel) -> f64 {
    if panel.area() == 0 {
        return 0.0;
    }
    figure.ink_count(panel) as f64 / panel.area() as f64
}

/// Mean ink fraction over all diagrams
pub fn total_pixel_ratio(figure: &Figure, diagrams: &[Diagram]) -> f64 {
    if diagrams.is_empty() {
        return 0.0;
    }
    diagrams
        .iter()
        .map(|d| pixel_ratio(figure, &d.panel))
        .sum::<f64>()
        / diagrams.len() as f64
}

/// Number of diagrams per pixel of figure area
pub fn diagram_to_image_area_ratio(figure: &Figure, diagrams: &[Diagram]) -> f64 {
    if figure.area() == 0 {
        return 0.0;
    }
    diagrams.len() as f64 / figure.area() as f64
}

/// Mean diagram area as a fraction of figure area
pub fn avg_diagram_area_to_image_area(figure: &Figure, diagrams: &[Diagram]) -> f64 {
    if diagrams.is_empty() || figure.area() == 0 {
        return 0.0;
    }
    let mean = diagrams.iter().map(|d| d.panel.area() as f64).sum::<f64>() / diagrams.len() as f64;
    mean / figure.area() as f64
}
