use image::ImageFormat;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::figure::Figure;
use crate::models::Panel;

/// Best-effort structure read from a diagram panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub smiles: String,
    pub confidence: f32,
}

impl Recognition {
    /// `*` atoms mark substituents the recognizer could not resolve
    pub fn has_wildcards(&self) -> bool {
        self.smiles.contains('*')
    }

    pub fn is_empty(&self) -> bool {
        self.smiles.is_empty()
    }
}

/// Turns a diagram panel into molecular notation.
///
/// `substitutions` maps substituent variables (`R1`) to their value (`OMe`)
/// for one R-group combination and is empty for plain diagrams.
pub trait StructureRecognizer: Send + Sync {
    fn read_diagram(
        &self,
        figure: &Figure,
        panel: &Panel,
        substitutions: &[(String, String)],
    ) -> Result<Recognition>;
}

/// SMILES fragment for a common substituent name, or the value itself
pub fn substituent_smiles(value: &str) -> String {
    let smiles = match value {
        "H" => "[H]",
        "Me" | "CH3" => "C",
        "Et" | "C2H5" | "CH2CH3" => "CC",
        "nPr" | "n-Pr" | "Pr" => "CCC",
        "iPr" | "i-Pr" => "C(C)C",
        "nBu" | "n-Bu" | "Bu" => "CCCC",
        "tBu" | "t-Bu" => "C(C)(C)C",
        "OMe" | "MeO" | "OCH3" => "OC",
        "OEt" | "EtO" | "OC2H5" => "OCC",
        "OH" => "O",
        "NH2" => "N",
        "NMe2" | "N(CH3)2" => "N(C)C",
        "CN" => "C#N",
        "NO2" => "[N+](=O)[O-]",
        "CF3" => "C(F)(F)F",
        "COOH" | "CO2H" => "C(=O)O",
        "CHO" => "C=O",
        "Ph" => "c1ccccc1",
        "2-ethylhexyl" => "CC(CC)CCCC",
        other => other,
    };
    smiles.to_string()
}

/// Structure recognizer that shells out to an OSRA binary
#[derive(Debug, Clone)]
pub struct OsraRecognizer {
    pub binary: PathBuf,
    /// Where crops and superatom files are written; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for OsraRecognizer {
    fn default() -> Self {
        Self::new("osra")
    }
}

impl OsraRecognizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            temp_dir: None,
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn temp_file(&self, suffix: &str) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.suffix(suffix);
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    /// First output line is `<smiles> <confidence>`; no output means nothing was found
    fn parse_output(stdout: &str) -> Recognition {
        let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Recognition {
                smiles: String::new(),
                confidence: 0.0,
            };
        };
        let mut fields = line.split_whitespace();
        let smiles = fields.next().unwrap_or_default().to_string();
        let confidence = fields
            .last()
            .and_then(|c| c.parse::<f32>().ok())
            .unwrap_or(0.0);
        Recognition { smiles, confidence }
    }
}

impl StructureRecognizer for OsraRecognizer {
    fn read_diagram(
        &self,
        figure: &Figure,
        panel: &Panel,
        substitutions: &[(String, String)],
    ) -> Result<Recognition> {
        let fail = |message: String| ExtractError::Recognizer {
            panel: panel.tag,
            message,
        };

        let crop = figure
            .crop(panel)
            .ok_or_else(|| fail("panel lies outside the figure".to_string()))?;
        let image_file = self
            .temp_file(".png")
            .map_err(|e| fail(format!("failed to create crop file: {}", e)))?;
        crop.save_with_format(image_file.path(), ImageFormat::Png)
            .map_err(|e| fail(format!("failed to write crop: {}", e)))?;

        let mut command = Command::new(&self.binary);
        command.args(["-f", "smi", "-p"]);

        // Keep the superatom file alive until OSRA has run
        let mut superatoms = None;
        if !substitutions.is_empty() {
            let write_superatoms = || -> std::io::Result<NamedTempFile> {
                let mut file = self.temp_file(".txt")?;
                for (variable, value) in substitutions {
                    writeln!(file, "{} {}", variable, substituent_smiles(value))?;
                }
                file.flush()?;
                Ok(file)
            };
            let file = write_superatoms()
                .map_err(|e| fail(format!("failed to write superatom file: {}", e)))?;
            command.arg("-a").arg(file.path());
            superatoms = Some(file);
        }
        command.arg(image_file.path());

        let output = command
            .output()
            .map_err(|e| fail(format!("failed to run {}: {}", self.binary.display(), e)))?;
        drop(superatoms);

        if !output.status.success() {
            return Err(fail(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let recognition = Self::parse_output(&String::from_utf8_lossy(&output.stdout));
        debug!(
            diagram = panel.tag,
            smiles = %recognition.smiles,
            confidence = recognition.confidence,
            "recognized structure"
        );
        Ok(recognition)
    }
}
