#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from schematic_resolver for tests
pub use schematic_resolver::{
    ClassifierKind, Connectivity, Diagram, ExtractionConfig, Figure, GroupingConfig, Label,
    MergeConfig, Panel, Pipeline, Stage,
};
