use clap::Parser;
use std::path::PathBuf;

use schematic_resolver::detection::{OcrsRecognizer, OsraRecognizer, validate};
use schematic_resolver::{ClassifierKind, ExtractionConfig, Figure, Pipeline};

#[derive(Parser)]
#[command(name = "schematic-resolver")]
#[command(about = "Extract chemical diagrams, labels and R-group tables from figures")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with extraction settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Diagram/label classification strategy
    #[arg(long, value_enum)]
    classifier: Option<ClassifierKind>,

    /// Rogue-pixel threshold for segmentation
    #[arg(long, value_name = "PIXELS")]
    min_size: Option<u32>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Skip OCR (labels are located but not read)
    #[arg(long)]
    skip_ocr: bool,

    /// OSRA binary used for structure recognition
    #[arg(long, value_name = "PATH")]
    osra: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => ExtractionConfig::from_file(path)?,
        None => ExtractionConfig::default(),
    };
    if let Some(classifier) = args.classifier {
        config.classifier = classifier;
    }
    if let Some(min_size) = args.min_size {
        config.min_panel_size = min_size;
    }

    let figure = Figure::open_with_threshold(&args.image_path, config.threshold)?;
    tracing::info!("Image loaded: {}x{}", figure.width(), figure.height());

    let mut pipeline = Pipeline::new(config).with_verbose(args.verbose);
    if !args.skip_ocr {
        pipeline = pipeline.with_text_recognizer(OcrsRecognizer::from_cache()?);
    }
    if let Some(osra) = args.osra {
        pipeline = pipeline.with_structure_recognizer(OsraRecognizer::new(osra));
    }
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let report = pipeline.run(&figure)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n=== Diagram Extraction Results ===");
    println!("Total diagrams: {}", report.diagrams.len());
    for diagram in &report.diagrams {
        let p = diagram.panel;
        println!(
            "  Diagram [{}] at ({}, {}) {}x{}",
            p.tag, p.left, p.top, p.width, p.height
        );
        match &diagram.label {
            Some(label) => {
                println!("    Label [{}]: {:?}", label.panel.tag, label.lines());
                for combination in label.r_group.iter().filter(|c| c.has_assignments()) {
                    println!(
                        "      {}: {:?}",
                        combination.tag().unwrap_or("-"),
                        combination.assignments()
                    );
                }
            }
            None => println!("    No label"),
        }
    }

    if !report.records.is_empty() {
        println!("\nExtracted structures:");
        for record in &report.records {
            println!(
                "  {:?} ({:.2}): {}",
                record.labels, record.confidence, record.smiles
            );
        }
    }

    if !report.failures.is_empty() {
        println!("\nFailures:");
        for failure in &report.failures {
            println!(
                "  [{}] diagram {}: {}",
                failure.stage, failure.diagram_tag, failure.message
            );
        }
    }

    if args.verbose {
        println!("\nDiagnostics:");
        println!(
            "  Average ink ratio: {:.3}",
            validate::total_pixel_ratio(&figure, &report.diagrams)
        );
        println!(
            "  Average diagram / figure area: {:.3}",
            validate::avg_diagram_area_to_image_area(&figure, &report.diagrams)
        );
        println!(
            "  Diagrams per pixel: {:.3e}",
            validate::diagram_to_image_area_ratio(&figure, &report.diagrams)
        );
    }

    Ok(())
}
