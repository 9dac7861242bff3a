use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::classify::ClassifierKind;
use crate::error::{ExtractError, Result};

/// Pixel adjacency used when labelling connected components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Four,
    #[default]
    Eight,
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => imageproc::region_labelling::Connectivity::Four,
            Connectivity::Eight => imageproc::region_labelling::Connectivity::Eight,
        }
    }
}

/// Gap tolerances for merging over-segmented panels, as fractions of panel size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Labels merge when the gap is below this fraction of the shorter line height
    pub label_gap_ratio: f64,
    /// Diagrams merge when the gap is below this fraction of the smaller panel's short side
    pub diagram_gap_ratio: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            label_gap_ratio: 0.6,
            diagram_gap_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Distance multiplier for labels sitting below or right of their diagram
    pub below_right_weight: f64,
    /// Maximum label distance as a fraction of the figure diagonal
    pub max_distance_ratio: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            below_right_weight: 0.8,
            max_distance_ratio: 0.5,
        }
    }
}

/// Tunables for one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Components smaller than this (pixels, or both sides) are treated as noise
    pub min_panel_size: u32,
    pub connectivity: Connectivity,
    /// Fixed binarization level; Otsu's level is used when unset
    pub threshold: Option<u8>,
    pub classifier: ClassifierKind,
    pub merge: MergeConfig,
    pub grouping: GroupingConfig,
    /// Drop recognized structures that still contain unresolved `*` atoms
    pub discard_wildcards: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_panel_size: 3,
            connectivity: Connectivity::Eight,
            threshold: None,
            classifier: ClassifierKind::KMeans,
            merge: MergeConfig::default(),
            grouping: GroupingConfig::default(),
            discard_wildcards: true,
        }
    }
}

impl ExtractionConfig {
    /// Load a JSON config; missing fields fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ExtractError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ExtractError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.merge.label_gap_ratio < 0.0 || self.merge.diagram_gap_ratio < 0.0 {
            return Err(ExtractError::Config("merge gap ratios must be non-negative".into()));
        }
        if self.grouping.below_right_weight <= 0.0 {
            return Err(ExtractError::Config("below_right_weight must be positive".into()));
        }
        if self.grouping.max_distance_ratio <= 0.0 {
            return Err(ExtractError::Config("max_distance_ratio must be positive".into()));
        }
        Ok(())
    }
}
