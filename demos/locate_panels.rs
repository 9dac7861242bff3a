use std::path::PathBuf;

use schematic_resolver::detection::validate;
use schematic_resolver::{ClassifierKind, ExtractionConfig, Figure, Pipeline};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("test_figure.png"));
    let figure = Figure::open(&path)?;

    println!("Locating diagrams in {} ({}x{})\n", path.display(), figure.width(), figure.height());

    // Compare both classification strategies on the same figure
    for classifier in [ClassifierKind::KMeans, ClassifierKind::Kruskal] {
        let config = ExtractionConfig {
            classifier,
            ..ExtractionConfig::default()
        };
        let diagrams = Pipeline::new(config).locate(&figure)?;

        println!("=== {:?} ===", classifier);
        for diagram in &diagrams {
            let p = diagram.panel;
            let label = diagram
                .label
                .as_ref()
                .map(|l| format!("label at ({}, {}) {}x{}", l.panel.left, l.panel.top, l.panel.width, l.panel.height))
                .unwrap_or_else(|| "no label".to_string());
            println!("  diagram {} at ({}, {}) {}x{}: {}", p.tag, p.left, p.top, p.width, p.height, label);
        }
        println!(
            "  ink ratio {:.3}, mean area ratio {:.3}\n",
            validate::total_pixel_ratio(&figure, &diagrams),
            validate::avg_diagram_area_to_image_area(&figure, &diagrams)
        );
    }

    Ok(())
}
