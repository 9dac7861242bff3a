//! End-to-end tests for the extraction pipeline with stand-in collaborators.

mod common;

use std::fs;

use schematic_resolver::detection::validate;
use schematic_resolver::ExtractError;

use common::*;

fn labelled_ocr() -> FakeOcr {
    FakeOcr::default()
        .with_label(40, 100, &["MeNAPH:R=CH3", "EtNAPH:R=C2H5"])
        .with_label(200, 100, &["7"])
}

#[test]
fn test_locate_pairs_each_diagram_with_its_label() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let diagrams = Pipeline::default().locate(&figure)?;

    assert_eq!(diagrams.len(), 2);
    assert_eq!(diagrams[0].panel, panel(20, 20, 60, 60));
    assert_eq!(diagrams[1].panel, panel(180, 20, 60, 60));
    let label_boxes: Vec<_> = diagrams
        .iter()
        .map(|d| d.label.as_ref().map(|l| l.panel))
        .collect();
    assert_eq!(
        label_boxes,
        vec![Some(panel(40, 100, 20, 8)), Some(panel(200, 100, 20, 8))]
    );
    Ok(())
}

#[test]
fn test_full_run_produces_one_record_per_combination() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let pipeline = Pipeline::default()
        .with_text_recognizer(labelled_ocr())
        .with_structure_recognizer(FakeRecognizer::new("c1ccccc1"));

    let report = pipeline.run(&figure)?;

    assert!(report.failures.is_empty());
    assert_eq!(report.diagrams.len(), 2);
    let first_label = report.diagrams[0].label.as_ref().unwrap();
    assert_eq!(first_label.lines(), vec!["MeNAPH:R=CH3", "EtNAPH:R=C2H5"]);
    assert!(first_label.has_r_group());

    let records: Vec<(Vec<String>, String)> = report
        .records
        .iter()
        .map(|r| (r.labels.clone(), r.smiles.clone()))
        .collect();
    assert_eq!(
        records,
        vec![
            (vec!["MeNAPH".to_string()], "C[R:CH3]".to_string()),
            (vec!["EtNAPH".to_string()], "C[R:C2H5]".to_string()),
            (vec!["7".to_string()], "c1ccccc1".to_string()),
        ]
    );
    assert_eq!(report.records[0].diagram_tag, report.diagrams[0].tag());
    assert_eq!(report.records[2].diagram_tag, report.diagrams[1].tag());
    Ok(())
}

#[test]
fn test_plain_name_label_gives_single_record() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let ocr = FakeOcr::default().with_label(40, 100, &["EtNAPH"]);
    let pipeline = Pipeline::default()
        .with_text_recognizer(ocr)
        .with_structure_recognizer(FakeRecognizer::new("CCc1ccc2ccccc2c1"));

    let report = pipeline.run(&figure)?;

    let first = &report.records[0];
    assert_eq!(first.labels, vec!["EtNAPH"]);
    assert_eq!(first.smiles, "CCc1ccc2ccccc2c1");
    // The second diagram's label reads as nothing but is still recognized
    assert_eq!(report.records.len(), 2);
    assert!(report.records[1].labels.is_empty());
    Ok(())
}

#[test]
fn test_ocr_failure_is_recorded_and_run_continues() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let pipeline = Pipeline::default()
        .with_text_recognizer(BrokenOcr)
        .with_structure_recognizer(FakeRecognizer::new("C"));

    let report = pipeline.run(&figure)?;

    assert_eq!(report.diagrams.len(), 2);
    assert_eq!(report.failures.len(), 2);
    for failure in &report.failures {
        assert_eq!(failure.stage, Stage::Ocr);
        assert!(failure.message.contains("engine unavailable"));
    }
    assert!(report.diagrams.iter().all(|d| d.label.as_ref().unwrap().text.is_empty()));
    assert_eq!(report.records.len(), 2);
    Ok(())
}

#[test]
fn test_wildcard_structures_are_discarded() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let report = Pipeline::default()
        .with_structure_recognizer(FakeRecognizer::new("*c1ccccc1"))
        .run(&figure)?;
    assert!(report.records.is_empty());

    let keep = ExtractionConfig {
        discard_wildcards: false,
        ..ExtractionConfig::default()
    };
    let report = Pipeline::new(keep)
        .with_structure_recognizer(FakeRecognizer::new("*c1ccccc1"))
        .run(&figure)?;
    assert_eq!(report.records.len(), 2);
    Ok(())
}

#[test]
fn test_without_collaborators_only_locates() -> anyhow::Result<()> {
    let report = Pipeline::default().run(&two_diagram_figure())?;
    assert_eq!(report.diagrams.len(), 2);
    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
    assert!(report.diagrams.iter().all(|d| d.label.as_ref().unwrap().r_group.is_empty()));
    Ok(())
}

#[test]
fn test_empty_figure_yields_empty_report() -> anyhow::Result<()> {
    let figure = figure_with_rects(100, 100, &[]);
    let report = Pipeline::default()
        .with_text_recognizer(labelled_ocr())
        .with_structure_recognizer(FakeRecognizer::new("C"))
        .run(&figure)?;
    assert!(report.diagrams.is_empty());
    assert!(report.records.is_empty());
    Ok(())
}

#[test]
fn test_kruskal_strategy_through_pipeline() -> anyhow::Result<()> {
    let figure = figure_with_rects(
        300,
        200,
        &[
            (20, 20, 60, 60),
            (90, 20, 60, 60),
            (250, 150, 20, 8),
            (250, 165, 20, 8),
        ],
    );
    let config = ExtractionConfig {
        classifier: ClassifierKind::Kruskal,
        ..ExtractionConfig::default()
    };

    let diagrams = Pipeline::new(config).locate(&figure)?;
    let panels: Vec<Panel> = diagrams.iter().map(|d| d.panel).collect();
    assert_eq!(sorted_geometry(&panels), vec![(20, 20, 60, 60), (90, 20, 60, 60)]);
    Ok(())
}

#[test]
fn test_debug_mode_writes_stage_directories() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");

    let pipeline = Pipeline::default().with_debug(debug_dir.clone())?;
    pipeline.locate(&two_diagram_figure())?;

    for stage in [
        "01_segmentation",
        "02_classified_labels",
        "03_classified_diagrams",
        "04_merged_labels",
        "05_merged_diagrams",
        "06_grouped",
    ] {
        assert!(debug_dir.join(stage).is_dir(), "missing {stage}");
    }
    let segmented = fs::read_dir(debug_dir.join("01_segmentation"))?.count();
    assert_eq!(segmented, 4);
    let grouped = fs::read_dir(debug_dir.join("06_grouped"))?.count();
    assert_eq!(grouped, 4);
    Ok(())
}

#[test]
fn test_debug_directory_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    fs::write(dir.path().join("leftover.txt"), "x")?;

    let result = Pipeline::default().with_debug(dir.path().to_path_buf());
    assert!(matches!(result, Err(ExtractError::Config(_))));
    Ok(())
}

#[test]
fn test_config_file_fills_missing_fields_with_defaults() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "min_panel_size": 5, "classifier": "kruskal", "merge": { "label_gap_ratio": 1.0 } }"#,
    )?;

    let config = ExtractionConfig::from_file(&path)?;
    assert_eq!(config.min_panel_size, 5);
    assert_eq!(config.classifier, ClassifierKind::Kruskal);
    assert_eq!(config.merge.label_gap_ratio, 1.0);
    assert_eq!(config.merge.diagram_gap_ratio, MergeConfig::default().diagram_gap_ratio);
    assert_eq!(config.connectivity, Connectivity::Eight);
    assert!(config.discard_wildcards);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;

    let negative = dir.path().join("negative.json");
    fs::write(&negative, r#"{ "grouping": { "max_distance_ratio": -1.0 } }"#)?;
    let err = ExtractionConfig::from_file(&negative).unwrap_err();
    assert!(matches!(err, ExtractError::Config(_)));

    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, "{ min_panel_size = 3 }")?;
    let err = ExtractionConfig::from_file(&garbled).unwrap_err();
    assert!(err.to_string().contains("garbled.json"));
    Ok(())
}

#[test]
fn test_pipeline_is_shared_across_threads() -> anyhow::Result<()> {
    let pipeline = Pipeline::default()
        .with_text_recognizer(labelled_ocr())
        .with_structure_recognizer(FakeRecognizer::new("c1ccccc1"));
    let figures: Vec<Figure> = (0..4).map(|_| two_diagram_figure()).collect();

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = figures
            .iter()
            .map(|figure| {
                let pipeline = &pipeline;
                scope.spawn(move || pipeline.run(figure).map(|r| r.records.len()))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<Result<Vec<usize>, ExtractError>>()
    })?;

    assert_eq!(counts, vec![3; 4]);
    Ok(())
}

#[test]
fn test_validation_metrics_on_located_diagrams() -> anyhow::Result<()> {
    let figure = two_diagram_figure();
    let diagrams = Pipeline::default().locate(&figure)?;

    assert_eq!(validate::pixel_ratio(&figure, &diagrams[0].panel), 1.0);
    assert_eq!(validate::total_pixel_ratio(&figure, &diagrams), 1.0);
    let expected_area = 3600.0 / (300.0 * 200.0);
    assert!((validate::avg_diagram_area_to_image_area(&figure, &diagrams) - expected_area).abs() < 1e-12);
    assert!((validate::diagram_to_image_area_ratio(&figure, &diagrams) - 2.0 / 60_000.0).abs() < 1e-12);
    assert_eq!(validate::total_pixel_ratio(&figure, &[]), 0.0);
    Ok(())
}

#[test]
fn test_missing_config_file_is_a_load_failure() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let err = ExtractionConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ExtractError::Config(_)));
    assert_eq!(err.stage(), Stage::Load);
    assert!(err.to_string().contains("absent.json"));
    Ok(())
}
