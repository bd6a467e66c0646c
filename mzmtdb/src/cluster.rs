use std::collections::BTreeMap;

use itertools::Itertools;
use mzwarp::ppm;
use ordered_float::OrderedFloat;

use crate::{ConsensusTarget, Evidence, Options, TargetWorkflowType};

/// Groups evidence from all datasets into consensus targets
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetClusterer {
    /// One target per peptide (clean sequence and modifications), all charge states together
    BottomUp,
    /// Per proteoform, split further on gaps in observed mass and NET
    TopDown {
        /// Maximal gap in mass (ppm) within a target
        mass_tolerance_ppm: f64,
        /// Maximal gap in NET within a target
        net_tolerance: f64,
    },
}

impl TargetClusterer {
    /// Create the clusterer for the workflow in the options
    pub const fn new(options: &Options) -> Self {
        match options.workflow {
            TargetWorkflowType::Standard => Self::BottomUp,
            TargetWorkflowType::TopDown => Self::TopDown {
                mass_tolerance_ppm: options.cluster_mass_tolerance_ppm,
                net_tolerance: options.cluster_net_tolerance,
            },
        }
    }

    /// Cluster the evidence into targets. The targets are ordered on peptide key and then on mass,
    /// the members of each target on dataset and scan. Targets and evidence both get dense ids
    /// starting at 1 and the parent of each evidence is set to its target.
    pub fn cluster(&self, pool: Vec<Evidence>) -> Vec<ConsensusTarget> {
        let mut groups: BTreeMap<(String, String), Vec<Evidence>> = BTreeMap::new();
        for evidence in pool {
            groups
                .entry((
                    evidence.clean_peptide.clone(),
                    evidence.modification_description.clone(),
                ))
                .or_default()
                .push(evidence);
        }

        let clusters = groups.into_values().flat_map(|group| match *self {
            Self::BottomUp => vec![group],
            Self::TopDown {
                mass_tolerance_ppm,
                net_tolerance,
            } => split_on_gaps(group, |e| e.monoisotopic_mass, |a, b| {
                ppm(b, a).abs() > mass_tolerance_ppm
            })
            .into_iter()
            .flat_map(|by_mass| {
                split_on_gaps(by_mass, |e| e.observed_net, |a, b| b - a > net_tolerance)
            })
            .collect_vec(),
        });

        let mut evidence_id = 0;
        clusters
            .enumerate()
            .map(|(index, mut members)| {
                let target_id = index + 1;
                members.sort_by_key(|e| (e.data_set, e.scan, e.analysis_id));
                for member in &mut members {
                    evidence_id += 1;
                    member.id = Some(evidence_id);
                    member.parent = Some(target_id);
                }
                ConsensusTarget::new(target_id, members)
            })
            .collect()
    }
}

/// Sort on the value and split wherever two consecutive values are too far apart
fn split_on_gaps(
    mut group: Vec<Evidence>,
    value: impl Fn(&Evidence) -> f64,
    too_far: impl Fn(f64, f64) -> bool,
) -> Vec<Vec<Evidence>> {
    group.sort_by_key(|e| OrderedFloat(value(e)));
    let mut result: Vec<Vec<Evidence>> = Vec::new();
    for evidence in group {
        match result.last_mut() {
            Some(current)
                if current
                    .last()
                    .is_some_and(|last| !too_far(value(last), value(&evidence))) =>
            {
                current.push(evidence);
            }
            _ => result.push(vec![evidence]),
        }
    }
    result
}
