use petgraph::unionfind::UnionFind;
use std::collections::HashMap;
use tracing::debug;

use crate::config::MergeConfig;
use crate::figure::Figure;
use crate::models::{Panel, in_reading_order};

/// Repair over-segmentation and drop nested panels.
///
/// Same-class panels closer than a size-relative gap are unioned until no pair
/// qualifies (so merging is transitive), then any panel enclosed by another
/// panel of either class is removed. Running this on its own output changes
/// nothing, and it never returns more panels than it was given.
pub fn merge(
    labels: Vec<Panel>,
    diagrams: Vec<Panel>,
    figure: &Figure,
    config: &MergeConfig,
) -> (Vec<Panel>, Vec<Panel>) {
    let before = labels.len() + diagrams.len();

    let label_ratio = config.label_gap_ratio;
    let labels = merge_close(clip(labels, figure), |a, b| {
        a.gap(b) <= label_ratio * a.height.min(b.height) as f64
    });

    let diagram_ratio = config.diagram_gap_ratio;
    let diagrams = merge_close(clip(diagrams, figure), |a, b| {
        a.gap(b) <= diagram_ratio * a.min_side().min(b.min_side()) as f64
    });

    let (labels, diagrams) = remove_contained(labels, diagrams);
    debug!(
        before,
        labels = labels.len(),
        diagrams = diagrams.len(),
        "merged panels"
    );
    (labels, diagrams)
}

/// Keep panels inside the figure and drop any that end up empty
fn clip(panels: Vec<Panel>, figure: &Figure) -> Vec<Panel> {
    panels
        .into_iter()
        .filter_map(|mut p| {
            if p.left >= figure.width() || p.top >= figure.height() {
                return None;
            }
            p.width = p.width.min(figure.width() - p.left);
            p.height = p.height.min(figure.height() - p.top);
            (!p.is_degenerate()).then_some(p)
        })
        .collect()
}

/// Union panels transitively while any pair satisfies `close`
fn merge_close<F>(mut panels: Vec<Panel>, close: F) -> Vec<Panel>
where
    F: Fn(&Panel, &Panel) -> bool,
{
    loop {
        let n = panels.len();
        let mut groups = UnionFind::<usize>::new(n);
        let mut merged_any = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if close(&panels[i], &panels[j]) {
                    merged_any |= groups.union(i, j);
                }
            }
        }
        if !merged_any {
            return in_reading_order(panels);
        }

        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut merged: Vec<Panel> = Vec::new();
        for (i, panel) in panels.iter().enumerate() {
            let root = groups.find(i);
            match slot.get(&root) {
                Some(&s) => merged[s] = merged[s].union(panel),
                None => {
                    slot.insert(root, merged.len());
                    merged.push(*panel);
                }
            }
        }
        panels = merged;
    }
}

/// Drop every panel enclosed by another one. Of identical boxes the first
/// survives, and diagrams come before labels.
fn remove_contained(labels: Vec<Panel>, diagrams: Vec<Panel>) -> (Vec<Panel>, Vec<Panel>) {
    let all: Vec<(bool, Panel)> = diagrams
        .into_iter()
        .map(|p| (true, p))
        .chain(labels.into_iter().map(|p| (false, p)))
        .collect();

    let mut kept_labels = Vec::new();
    let mut kept_diagrams = Vec::new();
    for (j, (is_diagram, panel)) in all.iter().enumerate() {
        let enclosed = all.iter().enumerate().any(|(i, (_, outer))| {
            i != j && outer.contains(panel) && (outer != panel || i < j)
        });
        if enclosed {
            continue;
        }
        if *is_diagram {
            kept_diagrams.push(*panel);
        } else {
            kept_labels.push(*panel);
        }
    }

    (kept_labels, kept_diagrams)
}
