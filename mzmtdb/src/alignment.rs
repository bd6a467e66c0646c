use std::collections::BTreeMap;

use context_error::*;
use mzwarp::{RegressionResult, Residual, WarpAlignment};
use serde::{Deserialize, Serialize};

use crate::{Evidence, MtdbError};

/// The fitted model of an alignment
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum AlignmentModel {
    /// Scan to NET regression, standard workflow
    Regression(RegressionResult),
    /// Time warp onto the consensus, top-down workflow
    Warp(WarpAlignment),
}

/// The alignment of a single dataset
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AlignmentResult {
    /// The name of the dataset
    pub data_set: String,
    /// The number of evidence that passed the alignment filter
    pub anchors: usize,
    /// The fitted model
    pub model: AlignmentModel,
}

impl AlignmentResult {
    /// If there was not enough information to fit the model, in that case the evidence was not corrected
    pub const fn is_degenerate(&self) -> bool {
        match &self.model {
            AlignmentModel::Regression(regression) => regression.degenerate,
            AlignmentModel::Warp(warp) => warp.degenerate,
        }
    }

    /// The regression, if this is a standard workflow alignment
    pub const fn regression(&self) -> Option<&RegressionResult> {
        match &self.model {
            AlignmentModel::Regression(regression) => Some(regression),
            AlignmentModel::Warp(_) => None,
        }
    }

    /// The warp, if this is a top-down workflow alignment
    pub const fn warp(&self) -> Option<&WarpAlignment> {
        match &self.model {
            AlignmentModel::Warp(warp) => Some(warp),
            AlignmentModel::Regression(_) => None,
        }
    }
}

/// Pair up the residuals of an alignment with the evidence they were computed for and apply the
/// corrections: the corrected NET replaces the observed NET and the mass correction is subtracted
/// from the observed mass. Both sides are sorted on scan and id before pairing, every pair has to
/// have the same scan and id.
///
/// # Errors
/// If the number of residuals differs from the number of evidence, or if any pair does not match.
pub fn apply_residuals(
    evidence: &mut [Evidence],
    mut residuals: Vec<Residual>,
) -> Result<(), BoxedError<'static, MtdbError>> {
    if evidence.len() != residuals.len() {
        return Err(BoxedError::new(
            MtdbError::MisalignedResiduals,
            "Misaligned residuals",
            format!(
                "The alignment returned {} residuals for {} evidence",
                residuals.len(),
                evidence.len()
            ),
            Context::none(),
        ));
    }
    evidence.sort_by_key(Evidence::scan_key);
    residuals.sort_by_key(Residual::scan_key);
    for (evidence, residual) in evidence.iter_mut().zip(&residuals) {
        if evidence.scan_key() != residual.scan_key() {
            return Err(BoxedError::new(
                MtdbError::MisalignedResiduals,
                "Misaligned residuals",
                format!(
                    "The evidence with scan {} and id {} was paired with the residual for scan {} and id {}",
                    evidence.scan,
                    evidence.id.unwrap_or_default(),
                    residual.scan,
                    residual.id
                ),
                Context::none(),
            ));
        }
        evidence.observed_net = residual.net;
        evidence.monoisotopic_mass -= residual.mass_correction;
    }
    Ok(())
}

/// All corrected evidence of a run, keyed on evidence id
#[derive(Clone, Debug, Default)]
pub struct EvidenceMap {
    map: BTreeMap<usize, Evidence>,
}

impl EvidenceMap {
    /// Record a corrected evidence.
    ///
    /// # Errors
    /// If the evidence has no id, or if an evidence with the same id was already recorded.
    pub fn insert(&mut self, evidence: Evidence) -> Result<(), BoxedError<'static, MtdbError>> {
        let Some(id) = evidence.id else {
            return Err(BoxedError::new(
                MtdbError::MissingEvidence,
                "Evidence without id",
                format!(
                    "The evidence for {} in scan {} was never clustered",
                    evidence.clean_peptide, evidence.scan
                ),
                Context::none(),
            ));
        };
        if let Some(existing) = self.map.get(&id) {
            return Err(BoxedError::new(
                MtdbError::DuplicateEvidence,
                "Duplicate evidence",
                format!(
                    "The evidence id {id} was written by dataset {:?} and again by dataset {:?}",
                    existing.data_set, evidence.data_set
                ),
                Context::none(),
            ));
        }
        self.map.insert(id, evidence);
        Ok(())
    }

    /// Get the corrected evidence with the given id
    pub fn get(&self, id: usize) -> Option<&Evidence> {
        self.map.get(&id)
    }

    /// The number of recorded evidence
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
