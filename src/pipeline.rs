use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::detection::ocr::TextRecognizer;
use crate::detection::structure::StructureRecognizer;
use crate::detection::{grouping, merge, rgroup, segment};
use crate::error::{ExtractError, Result, StageFailure};
use crate::figure::Figure;
use crate::models::{Diagram, ExtractionRecord, Panel};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context shared by every stage of a run
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    /// Save the crop of every panel produced by a stage, if debug mode is enabled
    fn save_panels(
        &self,
        step_index: usize,
        step_name: &str,
        figure: &Figure,
        panels: &[Panel],
    ) -> Result<()> {
        let Some(debug_config) = self.debug.as_ref().filter(|d| d.enabled) else {
            return Ok(());
        };

        let step_dir_name = format!(
            "{:02}_{}",
            step_index,
            step_name.to_lowercase().replace(' ', "_")
        );
        let step_dir = debug_config.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        for (idx, panel) in panels.iter().enumerate() {
            if let Some(crop) = figure.crop(panel) {
                let output_path = step_dir.join(format!("{:02}.png", idx + 1));
                crop.save(&output_path)
                    .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?;
            }
        }

        if self.verbose {
            info!("Debug: saved {} images to {}/", panels.len(), step_dir_name);
        }
        Ok(())
    }

    fn log_panels(&self, stage: &str, panels: &[Panel]) {
        if !self.verbose {
            return;
        }
        for panel in panels {
            info!(
                stage,
                tag = panel.tag,
                left = panel.left,
                top = panel.top,
                width = panel.width,
                height = panel.height,
                "panel"
            );
        }
    }
}

/// Everything extracted from one figure.
///
/// Collaborator failures on individual diagrams are listed in `failures`
/// while the other diagrams are still reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FigureReport {
    pub diagrams: Vec<Diagram>,
    pub records: Vec<ExtractionRecord>,
    pub failures: Vec<StageFailure>,
}

/// Segment → classify → merge → group, then OCR, R-group parsing and
/// structure recognition through pluggable collaborators.
///
/// A `Pipeline` holds no per-figure state, so one instance can process many
/// figures, including from several threads.
pub struct Pipeline {
    config: ExtractionConfig,
    context: PipelineContext,
    text_recognizer: Option<Arc<dyn TextRecognizer>>,
    structure_recognizer: Option<Arc<dyn StructureRecognizer>>,
}

impl Pipeline {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            context: PipelineContext::default(),
            text_recognizer: None,
            structure_recognizer: None,
        }
    }

    /// Log every panel at each stage
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(ExtractError::Config(format!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn with_text_recognizer<R: TextRecognizer + 'static>(mut self, recognizer: R) -> Self {
        self.text_recognizer = Some(Arc::new(recognizer));
        self
    }

    pub fn with_structure_recognizer<R: StructureRecognizer + 'static>(mut self, recognizer: R) -> Self {
        self.structure_recognizer = Some(Arc::new(recognizer));
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Decode a figure with the configured threshold and run the full pipeline
    pub fn run_path<P: AsRef<Path>>(&self, path: P) -> Result<FigureReport> {
        let figure = Figure::open_with_threshold(path, self.config.threshold)?;
        self.run(&figure)
    }

    /// Locate diagrams and their labels without calling any collaborator
    pub fn locate(&self, figure: &Figure) -> Result<Vec<Diagram>> {
        let config = &self.config;

        let panels = segment::segment(figure, config.min_panel_size, config.connectivity);
        info!(panels = panels.len(), "segmentation");
        self.context.log_panels("segmentation", &panels);
        self.context.save_panels(1, "Segmentation", figure, &panels)?;

        let classifier = config.classifier.build();
        let (labels, diagrams) = classifier.classify(panels);
        info!(
            strategy = classifier.name(),
            labels = labels.len(),
            diagrams = diagrams.len(),
            "classification"
        );
        self.context.save_panels(2, "Classified Labels", figure, &labels)?;
        self.context.save_panels(3, "Classified Diagrams", figure, &diagrams)?;

        let (labels, diagrams) = merge::merge(labels, diagrams, figure, &config.merge);
        info!(labels = labels.len(), diagrams = diagrams.len(), "merging");
        self.context.log_panels("merged labels", &labels);
        self.context.log_panels("merged diagrams", &diagrams);
        self.context.save_panels(4, "Merged Labels", figure, &labels)?;
        self.context.save_panels(5, "Merged Diagrams", figure, &diagrams)?;

        let grouped = grouping::label_diags(&labels, &diagrams, &figure.bounding_box(), &config.grouping);
        let paired = grouped.iter().filter(|d| d.label.is_some()).count();
        info!(diagrams = grouped.len(), labelled = paired, "grouping");
        let pairs: Vec<Panel> = grouped
            .iter()
            .flat_map(|d| std::iter::once(d.panel).chain(d.label.as_ref().map(|l| l.panel)))
            .collect();
        self.context.save_panels(6, "Grouped", figure, &pairs)?;

        Ok(grouped)
    }

    /// Run every stage on a figure
    pub fn run(&self, figure: &Figure) -> Result<FigureReport> {
        let mut report = FigureReport::default();

        for diagram in self.locate(figure)? {
            let diagram = self.read_label(figure, diagram, &mut report.failures);
            let diagram = rgroup::detect_r_group(diagram);
            self.read_structures(figure, &diagram, &mut report);
            report.diagrams.push(diagram);
        }

        info!(
            diagrams = report.diagrams.len(),
            records = report.records.len(),
            failures = report.failures.len(),
            "figure processed"
        );
        Ok(report)
    }

    fn read_label(&self, figure: &Figure, mut diagram: Diagram, failures: &mut Vec<StageFailure>) -> Diagram {
        let Some(recognizer) = &self.text_recognizer else {
            return diagram;
        };
        let tag = diagram.panel.tag;
        if let Some(label) = diagram.label.as_mut() {
            match recognizer.read_label(figure, &label.panel) {
                Ok(lines) => label.text = lines,
                Err(e) => {
                    warn!(diagram = tag, error = %e, "label OCR failed");
                    failures.push(StageFailure::new(tag, &e));
                }
            }
        }
        diagram
    }

    /// One record for a plain diagram, or one per R-group combination carrying
    /// assignments
    fn read_structures(&self, figure: &Figure, diagram: &Diagram, report: &mut FigureReport) {
        let Some(recognizer) = &self.structure_recognizer else {
            return;
        };

        let combinations: Vec<_> = diagram
            .label
            .iter()
            .flat_map(|l| l.r_group.iter())
            .filter(|c| c.has_assignments())
            .collect();

        let requests: Vec<(Vec<String>, Vec<(String, String)>)> = if combinations.is_empty() {
            let labels = diagram
                .label
                .iter()
                .flat_map(|l| l.r_group.iter())
                .flat_map(|c| c.identifiers.iter().cloned())
                .collect();
            vec![(labels, Vec::new())]
        } else {
            combinations
                .iter()
                .map(|c| {
                    let substitutions = c
                        .assignments()
                        .into_iter()
                        .map(|(var, value)| (var.to_string(), value.to_string()))
                        .collect();
                    (c.identifiers.clone(), substitutions)
                })
                .collect()
        };

        for (labels, substitutions) in requests {
            match recognizer.read_diagram(figure, &diagram.panel, &substitutions) {
                Ok(recognition) if recognition.is_empty() => {
                    debug!(diagram = diagram.panel.tag, "no structure recognized");
                }
                Ok(recognition) if self.config.discard_wildcards && recognition.has_wildcards() => {
                    debug!(
                        diagram = diagram.panel.tag,
                        smiles = %recognition.smiles,
                        "discarding structure with unresolved wildcards"
                    );
                }
                Ok(recognition) => report.records.push(ExtractionRecord {
                    diagram_tag: diagram.panel.tag,
                    labels,
                    smiles: recognition.smiles,
                    confidence: recognition.confidence,
                }),
                Err(e) => {
                    warn!(diagram = diagram.panel.tag, error = %e, "structure recognition failed");
                    report.failures.push(StageFailure::new(diagram.panel.tag, &e));
                }
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}
