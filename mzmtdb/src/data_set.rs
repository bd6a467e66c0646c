use std::path::{Path, PathBuf};

use context_error::*;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::{AlignmentResult, Evidence, LcmsIdentificationTool, MtdbError, RetentionTimePredictor};

/// The identifications of a single LC-MS analysis by a single tool
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LcmsDataSet {
    /// The name, derived from the file name
    pub name: String,
    /// The file the evidence was read from
    pub path: PathBuf,
    /// The tool that generated the identifications
    pub tool: LcmsIdentificationTool,
    /// The evidence, after processing only the admitted and corrected evidence is left
    pub evidence: Vec<Evidence>,
    /// The alignment, set by processing
    pub alignment: Option<AlignmentResult>,
}

impl LcmsDataSet {
    /// Create a dataset, the name is derived from the path
    pub fn new(path: impl AsRef<Path>, tool: LcmsIdentificationTool, evidence: Vec<Evidence>) -> Self {
        let path = path.as_ref();
        Self {
            name: tool.dataset_name(path),
            path: path.to_path_buf(),
            tool,
            evidence,
            alignment: None,
        }
    }

    /// Check that all evidence was identified by the tool of this dataset.
    ///
    /// # Errors
    /// If any evidence has the scores of another tool.
    pub fn check_consistency(&self) -> Result<(), BoxedError<'static, MtdbError>> {
        match self.evidence.iter().find(|e| e.tool() != self.tool) {
            Some(evidence) => Err(BoxedError::new(
                MtdbError::InconsistentDataSet,
                "Inconsistent dataset",
                format!(
                    "The dataset {} is identified with {} but contains evidence from {} (scan {})",
                    self.name,
                    self.tool,
                    evidence.tool(),
                    evidence.scan
                ),
                Context::default().source(self.path.to_string_lossy()).to_owned(),
            )),
            None => Ok(()),
        }
    }

    /// Set the observed NET of every evidence by scaling the scan numbers to 0..=1. If all
    /// evidence has the same scan the NET is set to 0.
    pub fn calculate_observed_net(&mut self) {
        let (min, max) = match self.evidence.iter().map(|e| e.scan).minmax() {
            MinMaxResult::NoElements => return,
            MinMaxResult::OneElement(scan) => (scan, scan),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        for evidence in &mut self.evidence {
            evidence.observed_net = if max == min {
                0.0
            } else {
                (evidence.scan - min) as f64 / (max - min) as f64
            };
        }
    }

    /// Set the predicted NET of every evidence from its clean sequence
    pub fn calculate_predicted_net(&mut self, predictor: &RetentionTimePredictor) {
        for evidence in &mut self.evidence {
            evidence.predicted_net = predictor.predict(&evidence.clean_peptide);
        }
    }
}
