use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage an error or failure originated from. The geometric stages
/// cannot fail, so only loading, the collaborators and debug output appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Load,
    Ocr,
    Recognize,
    Debug,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Ocr => "ocr",
            Stage::Recognize => "recognize",
            Stage::Debug => "debug",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to decode figure {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("OCR failed on label panel {panel}: {message}")]
    Ocr { panel: usize, message: String },
    #[error("structure recognition failed on diagram panel {panel}: {message}")]
    Recognizer { panel: usize, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Writing debug output
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub fn stage(&self) -> Stage {
        match self {
            ExtractError::Decode { .. } => Stage::Load,
            ExtractError::Ocr { .. } => Stage::Ocr,
            ExtractError::Recognizer { .. } => Stage::Recognize,
            ExtractError::Config(_) => Stage::Load,
            ExtractError::Io(_) => Stage::Debug,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// A collaborator failure recorded against one diagram while the rest of the
/// figure keeps going
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub diagram_tag: usize,
    pub message: String,
}

impl StageFailure {
    pub fn new(diagram_tag: usize, error: &ExtractError) -> Self {
        Self {
            stage: error.stage(),
            diagram_tag,
            message: error.to_string(),
        }
    }
}
