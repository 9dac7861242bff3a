//! Locate chemical-structure diagrams and their labels in figure bitmaps and
//! parse substituent tables out of the label text.
//!
//! The pipeline runs segmentation, diagram/label classification, panel
//! merging and label association, then hands crops to external OCR and
//! structure recognizers and parses R-group assignments from the recognized
//! text.

pub mod config;
pub mod detection;
pub mod error;
pub mod figure;
pub mod models;
pub mod pipeline;

pub use config::{Connectivity, ExtractionConfig, GroupingConfig, MergeConfig};
pub use detection::ClassifierKind;
pub use error::{ExtractError, Stage, StageFailure};
pub use figure::Figure;
pub use models::{
    BoundingBox, Diagram, ExtractionRecord, Label, Panel, RGroupCombination, TextLine, Token,
    in_reading_order,
};
pub use pipeline::{DebugConfig, FigureReport, Pipeline, PipelineContext};
