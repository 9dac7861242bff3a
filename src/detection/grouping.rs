use std::cmp::Ordering;
use tracing::debug;

use crate::config::GroupingConfig;
use crate::models::{Diagram, Label, Panel, in_reading_order};

/// Centre distance from a diagram to a candidate label, discounted by
/// `below_right_weight` when the label sits below or to the right, where
/// captions conventionally go.
///
/// Either offset alone is enough: a label above and to the right, or below
/// and to the left, is discounted too. Only labels whose centre is neither
/// right of nor below the diagram centre pay the full distance.
pub fn layout_distance(diagram: &Panel, label: &Panel, below_right_weight: f64) -> f64 {
    let (dx, dy) = {
        let (cx, cy) = diagram.center();
        let (lx, ly) = label.center();
        (lx - cx, ly - cy)
    };
    let distance = (dx * dx + dy * dy).sqrt();
    if dx > 0.0 || dy > 0.0 {
        distance * below_right_weight
    } else {
        distance
    }
}

/// Associate each diagram with at most one label.
///
/// Diagrams are visited in reading order and each claims the closest label not
/// already claimed, provided it lies within the distance bound. The mapping is
/// injective; labels nobody claims are left out.
///
/// # Panics
/// If a zero-area panel reaches this stage, which means an upstream stage
/// broke its contract.
pub fn label_diags(
    labels: &[Panel],
    diagrams: &[Panel],
    figure_bbox: &Panel,
    config: &GroupingConfig,
) -> Vec<Diagram> {
    for panel in labels.iter().chain(diagrams) {
        assert!(
            !panel.is_degenerate(),
            "degenerate panel {} ({}x{}) reached grouping",
            panel.tag,
            panel.width,
            panel.height
        );
    }

    let diagonal = (figure_bbox.width as f64).hypot(figure_bbox.height as f64);
    let max_distance = config.max_distance_ratio * diagonal;

    let labels = in_reading_order(labels.to_vec());
    let diagrams = in_reading_order(diagrams.to_vec());

    let mut claimed = vec![false; labels.len()];
    let mut result = Vec::with_capacity(diagrams.len());

    for diagram in diagrams {
        let nearest = labels
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed[*i])
            .map(|(i, label)| (i, layout_distance(&diagram, label, config.below_right_weight)))
            .filter(|(_, distance)| *distance <= max_distance)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        match nearest {
            Some((i, distance)) => {
                claimed[i] = true;
                debug!(diagram = diagram.tag, label = labels[i].tag, distance, "paired label");
                result.push(Diagram::new(diagram).with_label(Label::new(labels[i])));
            }
            None => {
                debug!(diagram = diagram.tag, "no label within range");
                result.push(Diagram::new(diagram));
            }
        }
    }

    let unassigned = claimed.iter().filter(|c| !**c).count();
    if unassigned > 0 {
        debug!(unassigned, "labels left without a diagram");
    }
    result
}
