//! Partition panels into diagrams and labels.
//!
//! Two interchangeable strategies share the [`PanelClassifier`] trait:
//! k-means over panel size features, and a single cut of the minimum
//! spanning tree over panel centres. [`ClassifierKind`] selects one from
//! configuration.

use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::models::{Panel, in_reading_order};

/// Second-heaviest tree edges this close to the heaviest suggest the figure
/// needed more than one cut
const AMBIGUOUS_CUT_RATIO: f64 = 0.9;

/// Partitions panels by visual role
pub trait PanelClassifier: Send + Sync {
    /// Returns `(labels, diagrams)`; every input panel lands in exactly one set
    fn classify(&self, panels: Vec<Panel>) -> (Vec<Panel>, Vec<Panel>);

    /// Human-readable name for this strategy
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    #[value(name = "kmeans")]
    KMeans,
    Kruskal,
}

impl ClassifierKind {
    pub fn build(self) -> Box<dyn PanelClassifier> {
        match self {
            ClassifierKind::KMeans => Box::new(KMeansClassifier::default()),
            ClassifierKind::Kruskal => Box::new(KruskalClassifier),
        }
    }
}


/// Split `panels` by a per-panel flag into `(labels, diagrams)`
fn split(panels: Vec<Panel>, is_diagram: &[bool]) -> (Vec<Panel>, Vec<Panel>) {
    let (diagrams, labels): (Vec<_>, Vec<_>) = panels
        .into_iter()
        .zip(is_diagram.iter().copied())
        .partition(|(_, diagram)| *diagram);
    (
        in_reading_order(labels.into_iter().map(|(p, _)| p).collect()),
        in_reading_order(diagrams.into_iter().map(|(p, _)| p).collect()),
    )
}

/// Two-cluster k-means over width, height and area.
///
/// The cluster with the larger mean area becomes the diagrams, ties going to
/// the larger mean perimeter.
#[derive(Debug, Clone)]
pub struct KMeansClassifier {
    pub max_iterations: usize,
}

impl Default for KMeansClassifier {
    fn default() -> Self {
        Self { max_iterations: 100 }
    }
}

impl KMeansClassifier {
    /// Features scaled by their maxima so no single axis dominates
    fn features(panels: &[Panel]) -> Vec<[f64; 3]> {
        let raw: Vec<[f64; 3]> = panels
            .iter()
            .map(|p| [p.width as f64, p.height as f64, p.area() as f64])
            .collect();
        let mut max = [0.0f64; 3];
        for f in &raw {
            for (m, v) in max.iter_mut().zip(f) {
                *m = m.max(*v);
            }
        }
        raw.into_iter()
            .map(|f| {
                let mut scaled = [0.0; 3];
                for i in 0..3 {
                    scaled[i] = if max[i] > 0.0 { f[i] / max[i] } else { 0.0 };
                }
                scaled
            })
            .collect()
    }

    fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// Cluster index (0 or 1) for every feature vector
    fn cluster(&self, features: &[[f64; 3]], seeds: [usize; 2]) -> Vec<usize> {
        let mut centroids = [features[seeds[0]], features[seeds[1]]];
        let mut assignment = vec![usize::MAX; features.len()];

        for _ in 0..self.max_iterations {
            let next: Vec<usize> = features
                .iter()
                .map(|f| {
                    if Self::distance(f, &centroids[1]) < Self::distance(f, &centroids[0]) {
                        1
                    } else {
                        0
                    }
                })
                .collect();
            if next == assignment {
                break;
            }
            assignment = next;

            for (k, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&[f64; 3]> = features
                    .iter()
                    .zip(&assignment)
                    .filter(|(_, a)| **a == k)
                    .map(|(f, _)| f)
                    .collect();
                // An empty cluster keeps its previous centroid
                if members.is_empty() {
                    continue;
                }
                let n = members.len() as f64;
                for i in 0..3 {
                    centroid[i] = members.iter().map(|m| m[i]).sum::<f64>() / n;
                }
            }
        }

        assignment
    }
}

impl PanelClassifier for KMeansClassifier {
    fn classify(&self, panels: Vec<Panel>) -> (Vec<Panel>, Vec<Panel>) {
        if panels.len() <= 1 {
            return (Vec::new(), panels);
        }

        let features = Self::features(&panels);
        let smallest = (0..panels.len())
            .min_by_key(|&i| panels[i].area())
            .unwrap_or(0);
        let largest = (0..panels.len())
            .max_by_key(|&i| panels[i].area())
            .unwrap_or(0);
        let assignment = self.cluster(&features, [smallest, largest]);

        // (mean area, mean perimeter) per cluster, None when empty
        let stats: Vec<Option<(f64, f64)>> = (0..2)
            .map(|k| {
                let members: Vec<&Panel> = panels
                    .iter()
                    .zip(&assignment)
                    .filter(|(_, a)| **a == k)
                    .map(|(p, _)| p)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                let n = members.len() as f64;
                Some((
                    members.iter().map(|p| p.area() as f64).sum::<f64>() / n,
                    members.iter().map(|p| p.perimeter()).sum::<f64>() / n,
                ))
            })
            .collect();

        let diagram_cluster = match (stats[0], stats[1]) {
            (Some(a), Some(b)) => match a.partial_cmp(&b) {
                Some(Ordering::Greater) => 0,
                _ => 1,
            },
            (Some(_), None) => 0,
            _ => 1,
        };

        let is_diagram: Vec<bool> = assignment.iter().map(|a| *a == diagram_cluster).collect();
        let (labels, diagrams) = split(panels, &is_diagram);
        debug!(labels = labels.len(), diagrams = diagrams.len(), "k-means classification");
        (labels, diagrams)
    }

    fn name(&self) -> &str {
        "k-means"
    }
}

/// Minimum-spanning-tree classifier.
///
/// Builds the complete graph over panel centres, keeps its minimum spanning
/// tree and removes the heaviest edge. Of the two resulting groups the one with
/// the larger total area holds the diagrams. Figures whose panels form more
/// than two clear clusters are only split once.
#[derive(Debug, Clone, Copy, Default)]
pub struct KruskalClassifier;

impl KruskalClassifier {
    /// Minimum spanning tree edges as `(source, target, weight)`
    fn spanning_tree(panels: &[Panel]) -> Vec<(usize, usize, f64)> {
        let n = panels.len();
        let mut graph = UnGraph::<usize, f64>::with_capacity(n, n * n.saturating_sub(1) / 2);
        let nodes: Vec<_> = (0..n).map(|i| graph.add_node(i)).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                graph.add_edge(nodes[i], nodes[j], panels[i].center_distance(&panels[j]));
            }
        }

        min_spanning_tree(&graph)
            .filter_map(|element| match element {
                Element::Edge {
                    source,
                    target,
                    weight,
                } => Some((source, target, weight)),
                Element::Node { .. } => None,
            })
            .collect()
    }
}

impl PanelClassifier for KruskalClassifier {
    fn classify(&self, panels: Vec<Panel>) -> (Vec<Panel>, Vec<Panel>) {
        if panels.len() <= 1 {
            return (Vec::new(), panels);
        }

        let mut tree = Self::spanning_tree(&panels);
        tree.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));
        let Some((_, _, heaviest)) = tree.pop() else {
            return (Vec::new(), panels);
        };
        if let Some((_, _, runner_up)) = tree.last() {
            if *runner_up >= heaviest * AMBIGUOUS_CUT_RATIO {
                warn!(
                    heaviest,
                    runner_up = *runner_up,
                    "spanning tree has several comparable edges; a single cut may not separate diagrams from labels"
                );
            }
        }

        let mut groups = UnionFind::<usize>::new(panels.len());
        for (source, target, _) in &tree {
            groups.union(*source, *target);
        }

        let anchor = groups.find(0);
        let in_anchor: Vec<bool> = (0..panels.len()).map(|i| groups.find(i) == anchor).collect();

        // (total area, largest panel) for the anchor group and the other group
        let summarize = |want: bool| {
            panels
                .iter()
                .zip(&in_anchor)
                .filter(|(_, a)| **a == want)
                .fold((0u64, 0u64), |(total, largest), (p, _)| {
                    (total + p.area(), largest.max(p.area()))
                })
        };
        let anchor_stats = summarize(true);
        let other_stats = summarize(false);
        let anchor_is_diagrams = anchor_stats >= other_stats;

        let is_diagram: Vec<bool> = in_anchor
            .iter()
            .map(|a| *a == anchor_is_diagrams)
            .collect();
        let (labels, diagrams) = split(panels, &is_diagram);
        debug!(labels = labels.len(), diagrams = diagrams.len(), "spanning-tree classification");
        (labels, diagrams)
    }

    fn name(&self) -> &str {
        "kruskal"
    }
}
