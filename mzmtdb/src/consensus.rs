use itertools::Itertools;
use mzwarp::{mean, standard_deviation};
use serde::{Deserialize, Serialize};

use crate::{Evidence, ProteinInformation};

/// Summary statistics over all members of a [`ConsensusTarget`]
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TargetStatistics {
    /// The average observed NET
    pub average_net: f64,
    /// The standard deviation of the observed NET (population)
    pub net_stdev: f64,
    /// The average predicted NET
    pub predicted_net: f64,
    /// The average observed monoisotopic mass
    pub average_monoisotopic_mass: f64,
    /// The first scan any member was observed in
    pub scan_min: usize,
    /// The last scan any member was observed in
    pub scan_max: usize,
    /// The number of members
    pub observations: usize,
    /// The number of distinct datasets the members came from
    pub data_sets: usize,
}

/// A peptide (or proteoform) observed in one or more datasets, an entry in the [`TargetDatabase`](crate::TargetDatabase)
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ConsensusTarget {
    /// The id, dense from 1 within a database
    pub id: usize,
    /// The members, ordered by dataset and scan
    pub evidence: Vec<Evidence>,
    /// The distinct charge states of the members, sorted
    pub charges: Vec<isize>,
    /// The dataset of the first member
    pub data_set: Option<usize>,
    /// The reported sequence of the first member
    pub sequence: String,
    /// The bare amino acid sequence
    pub clean_sequence: String,
    /// The modifications
    pub modification_description: String,
    /// The number of modifications
    pub modification_count: usize,
    /// The theoretical monoisotopic mass
    pub theoretical_monoisotopic_mass: f64,
    /// The distinct proteins of all members, sorted
    pub proteins: Vec<ProteinInformation>,
    /// The statistics over all members
    pub statistics: TargetStatistics,
}

impl ConsensusTarget {
    /// Create a target from its members, the descriptive fields are taken from the first member
    /// and the statistics are calculated. The ids of the target and its members are left untouched.
    pub fn new(id: usize, evidence: Vec<Evidence>) -> Self {
        let mut target = Self {
            id,
            ..Self::default()
        };
        if let Some(first) = evidence.first() {
            target.data_set = first.data_set;
            target.sequence.clone_from(&first.sequence);
            target.clean_sequence.clone_from(&first.clean_peptide);
            target
                .modification_description
                .clone_from(&first.modification_description);
            target.modification_count = first.modification_count;
            target.theoretical_monoisotopic_mass = first.theoretical_monoisotopic_mass;
        }
        target.evidence = evidence;
        target.calculate_statistics();
        target
    }

    /// Recalculate the charges, proteins, and statistics, needed after any change in the members
    pub fn calculate_statistics(&mut self) {
        self.charges = self
            .evidence
            .iter()
            .map(|e| e.charge)
            .sorted_unstable()
            .dedup()
            .collect();
        self.proteins = self
            .evidence
            .iter()
            .flat_map(|e| &e.proteins)
            .sorted_unstable()
            .dedup()
            .cloned()
            .collect();
        let nets = self.evidence.iter().map(|e| e.observed_net).collect_vec();
        let predicted = self.evidence.iter().map(|e| e.predicted_net).collect_vec();
        let masses = self
            .evidence
            .iter()
            .map(|e| e.monoisotopic_mass)
            .collect_vec();
        let (scan_min, scan_max) = self
            .evidence
            .iter()
            .map(|e| e.scan)
            .minmax()
            .into_option()
            .unwrap_or_default();
        self.statistics = TargetStatistics {
            average_net: mean(&nets).unwrap_or_default(),
            net_stdev: standard_deviation(&nets).unwrap_or_default(),
            predicted_net: mean(&predicted).unwrap_or_default(),
            average_monoisotopic_mass: mean(&masses).unwrap_or_default(),
            scan_min,
            scan_max,
            observations: self.evidence.len(),
            data_sets: self.evidence.iter().map(|e| e.data_set).unique().count(),
        };
    }

    /// The members observed with the given charge
    pub fn evidence_with_charge(&self, charge: isize) -> impl Iterator<Item = &Evidence> {
        self.evidence.iter().filter(move |e| e.charge == charge)
    }

    /// The peptide key (clean sequence and modifications) of this target
    pub fn peptide_key(&self) -> (&str, &str) {
        (&self.clean_sequence, &self.modification_description)
    }
}
