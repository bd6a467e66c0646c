use std::collections::BTreeSet;

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{ConsensusTarget, Evidence, MtdbError};

/// The result of processing: all consensus targets with their evidence
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TargetDatabase {
    /// The targets, ordered by id
    pub consensus_targets: Vec<ConsensusTarget>,
}

impl TargetDatabase {
    /// Create a database from the given targets
    pub const fn new(consensus_targets: Vec<ConsensusTarget>) -> Self {
        Self { consensus_targets }
    }

    /// Add a target
    pub fn add(&mut self, target: ConsensusTarget) {
        self.consensus_targets.push(target);
    }

    /// Iterate over all targets
    pub fn iter(&self) -> std::slice::Iter<'_, ConsensusTarget> {
        self.consensus_targets.iter()
    }

    /// Iterate over all evidence of all targets
    pub fn evidence(&self) -> impl Iterator<Item = &Evidence> {
        self.consensus_targets.iter().flat_map(|t| t.evidence.iter())
    }

    /// Find a target by its id
    pub fn target(&self, id: usize) -> Option<&ConsensusTarget> {
        self.consensus_targets
            .get(id.wrapping_sub(1))
            .filter(|t| t.id == id)
            .or_else(|| self.consensus_targets.iter().find(|t| t.id == id))
    }

    /// The number of targets
    pub fn len(&self) -> usize {
        self.consensus_targets.len()
    }

    /// Check if there are no targets
    pub fn is_empty(&self) -> bool {
        self.consensus_targets.is_empty()
    }

    /// The total number of evidence over all targets
    pub fn evidence_count(&self) -> usize {
        self.consensus_targets.iter().map(|t| t.evidence.len()).sum()
    }

    /// All distinct clean peptide sequences, sorted
    pub fn peptides(&self) -> BTreeSet<&str> {
        self.consensus_targets
            .iter()
            .map(|t| t.clean_sequence.as_str())
            .collect()
    }

    /// All distinct protein names any target maps to, sorted
    pub fn proteins(&self) -> BTreeSet<&str> {
        self.consensus_targets
            .iter()
            .flat_map(|t| &t.proteins)
            .map(|p| p.protein_name.as_str())
            .collect()
    }

    /// Check the invariants of the database: every target has at least one member, target ids are
    /// dense from 1, evidence ids are unique and dense from 1, and every member points to its target.
    ///
    /// # Errors
    /// The first broken invariant is reported as [`MtdbError::InvalidDatabase`].
    pub fn validate(&self) -> Result<(), BoxedError<'static, MtdbError>> {
        let mut evidence_ids = Vec::with_capacity(self.evidence_count());
        for (index, target) in self.consensus_targets.iter().enumerate() {
            if target.id != index + 1 {
                return Err(invalid(format!(
                    "The target at index {index} has id {} instead of {}",
                    target.id,
                    index + 1
                )));
            }
            if target.evidence.is_empty() {
                return Err(invalid(format!("The target {} has no evidence", target.id)));
            }
            for evidence in &target.evidence {
                if evidence.parent != Some(target.id) {
                    return Err(invalid(format!(
                        "The evidence {:?} in target {} has parent {:?}",
                        evidence.id, target.id, evidence.parent
                    )));
                }
                let Some(id) = evidence.id else {
                    return Err(invalid(format!(
                        "An evidence in target {} has no id",
                        target.id
                    )));
                };
                evidence_ids.push(id);
            }
        }
        evidence_ids.sort_unstable();
        if let Some((index, id)) = evidence_ids
            .iter()
            .enumerate()
            .find(|(index, id)| **id != index + 1)
        {
            return Err(invalid(format!(
                "The evidence ids are not unique and dense from 1, found id {id} at position {}",
                index + 1
            )));
        }
        Ok(())
    }
}

fn invalid(long_description: String) -> BoxedError<'static, MtdbError> {
    BoxedError::new(
        MtdbError::InvalidDatabase,
        "Invalid target database",
        long_description,
        Context::none(),
    )
}

impl<'a> IntoIterator for &'a TargetDatabase {
    type Item = &'a ConsensusTarget;
    type IntoIter = std::slice::Iter<'a, ConsensusTarget>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
