//! Integration tests for panel merging and containment removal.

mod common;

use schematic_resolver::detection::merge;

use common::*;

fn canvas() -> Figure {
    figure_with_rects(400, 300, &[])
}

#[test]
fn test_characters_merge_into_one_label() {
    // "7ab" segmented glyph by glyph
    let glyphs = vec![panel(10, 10, 6, 10), panel(18, 10, 6, 10), panel(26, 10, 6, 10)];
    let (labels, diagrams) = merge(glyphs, Vec::new(), &canvas(), &MergeConfig::default());

    assert!(diagrams.is_empty());
    assert_eq!(sorted_geometry(&labels), vec![(10, 10, 22, 10)]);
}

#[test]
fn test_label_lines_merge_vertically() {
    let lines = vec![panel(10, 10, 22, 10), panel(10, 24, 30, 10)];
    let (labels, _) = merge(lines, Vec::new(), &canvas(), &MergeConfig::default());
    assert_eq!(sorted_geometry(&labels), vec![(10, 10, 30, 24)]);
}

#[test]
fn test_merge_is_transitive() {
    // A-B and B-C are within tolerance, A-C are not
    let a = panel(10, 10, 10, 10);
    let b = panel(25, 10, 10, 10);
    let c = panel(40, 10, 10, 10);
    assert!(a.gap(&c) > 0.6 * 10.0);

    let (labels, _) = merge(vec![c, a, b], Vec::new(), &canvas(), &MergeConfig::default());
    assert_eq!(sorted_geometry(&labels), vec![(10, 10, 40, 10)]);
}

#[test]
fn test_distant_labels_stay_apart() {
    let input = vec![panel(10, 100, 20, 8), panel(200, 100, 20, 8)];
    let (labels, _) = merge(input.clone(), Vec::new(), &canvas(), &MergeConfig::default());
    assert_eq!(sorted_geometry(&labels), sorted_geometry(&input));
}

#[test]
fn test_split_diagram_is_rejoined() {
    // Two halves of a structure separated by a 2px crack
    let halves = vec![panel(50, 50, 40, 60), panel(92, 50, 40, 60)];
    let (_, diagrams) = merge(Vec::new(), halves, &canvas(), &MergeConfig::default());
    assert_eq!(sorted_geometry(&diagrams), vec![(50, 50, 82, 60)]);
}

#[test]
fn test_neighbouring_diagrams_are_not_fused() {
    let input = vec![panel(20, 20, 60, 60), panel(180, 20, 60, 60)];
    let (_, diagrams) = merge(Vec::new(), input.clone(), &canvas(), &MergeConfig::default());
    assert_eq!(sorted_geometry(&diagrams), sorted_geometry(&input));
}

#[test]
fn test_contained_panels_are_dropped() {
    let diagram = panel(20, 20, 100, 100);
    let inner_atom_label = panel(60, 60, 8, 10);
    let nested_fragment = panel(30, 30, 10, 10);
    let outside_label = panel(40, 150, 30, 10);

    let (labels, diagrams) = merge(
        vec![inner_atom_label, outside_label],
        vec![diagram, nested_fragment],
        &canvas(),
        &MergeConfig::default(),
    );

    assert_eq!(diagrams, vec![diagram]);
    assert_eq!(labels, vec![outside_label]);
}

#[test]
fn test_identical_boxes_keep_the_diagram() {
    let shared = panel(10, 10, 30, 30);
    let (labels, diagrams) = merge(vec![shared], vec![shared], &canvas(), &MergeConfig::default());
    assert!(labels.is_empty());
    assert_eq!(diagrams, vec![shared]);
}

#[test]
fn test_merge_is_idempotent_and_never_grows() {
    let labels_in = vec![
        panel(10, 200, 6, 10),
        panel(18, 200, 6, 10),
        panel(10, 214, 14, 10),
        panel(300, 200, 20, 10),
        panel(65, 65, 5, 5),
    ];
    let diagrams_in = vec![
        panel(20, 20, 80, 80),
        panel(101, 20, 30, 80),
        panel(250, 20, 80, 80),
        panel(260, 30, 10, 10),
    ];
    let figure = canvas();
    let config = MergeConfig::default();

    let (labels, diagrams) = merge(labels_in.clone(), diagrams_in.clone(), &figure, &config);
    assert!(labels.len() + diagrams.len() <= labels_in.len() + diagrams_in.len());

    // Every output lies inside the union of the inputs
    let hull = labels_in
        .iter()
        .chain(&diagrams_in)
        .fold(labels_in[0], |acc, p| acc.union(p));
    for p in labels.iter().chain(&diagrams) {
        assert!(hull.contains(p));
    }

    let (labels_again, diagrams_again) = merge(labels.clone(), diagrams.clone(), &figure, &config);
    assert_eq!(labels_again, labels);
    assert_eq!(diagrams_again, diagrams);
}

#[test]
fn test_merged_panel_keeps_smallest_tag() {
    let a = Panel::new(10, 10, 6, 10, 7);
    let b = Panel::new(18, 10, 6, 10, 3);
    let (labels, _) = merge(vec![a, b], Vec::new(), &canvas(), &MergeConfig::default());
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].tag, 3);
}

#[test]
fn test_panels_outside_the_figure_are_clipped() {
    let figure = figure_with_rects(100, 100, &[]);
    let (labels, diagrams) = merge(
        vec![panel(90, 90, 30, 30)],
        vec![panel(150, 150, 10, 10)],
        &figure,
        &MergeConfig::default(),
    );
    assert_eq!(sorted_geometry(&labels), vec![(90, 90, 10, 10)]);
    assert!(diagrams.is_empty());
}
