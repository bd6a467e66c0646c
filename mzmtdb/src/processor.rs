use context_error::*;
use itertools::Itertools;
use log::{debug, info, warn};
use mzwarp::{AlignError, AlignFeature, LcWarp, mean};

use crate::{
    AlignmentFilter, AlignmentModel, AlignmentResult, ConsensusTarget, Evidence, EvidenceMap,
    LcmsDataSet, MtdbError, Options, ProcessObserver, RetentionTimePredictor, TargetClusterer,
    TargetDatabase, TargetFilter, TargetWorkflowType, apply_residuals,
};

/// The mass of a proton in Dalton
const PROTON: f64 = 1.007_276_466_621;

/// Builds a [`TargetDatabase`] from the evidence of many datasets.
///
/// Processing happens in a fixed order of steps:
/// 1. Every dataset is checked for consistency and its evidence is filtered with the
///    [`TargetFilter`] of its tool. The evidence that passes the [`AlignmentFilter`] as well is
///    used as alignment anchor.
/// 2. Standard workflow: per dataset a regression from scan to predicted NET is fitted on the anchors.
/// 3. All admitted evidence is clustered into consensus targets with the [`TargetClusterer`].
/// 4. Every dataset is corrected: standard workflow with its regression, top-down workflow by
///    warping it onto the consensus targets (see [`LcWarp`]).
/// 5. The observer is notified of all alignments.
/// 6. The consensus targets are linked to the corrected evidence and their statistics updated.
///
/// The datasets are only changed if processing succeeds: they then contain only the admitted and
/// corrected evidence and their alignment.
#[derive(Clone, Debug)]
pub struct Processor {
    options: Options,
    predictor: RetentionTimePredictor,
}

impl Processor {
    /// Create a processor.
    ///
    /// # Errors
    /// If the options are not valid, see [`Options::validate`].
    pub fn new(options: Options) -> Result<Self, BoxedError<'static, MtdbError>> {
        options.validate()?;
        let predictor = RetentionTimePredictor::new(options.predictor_type)?;
        Ok(Self { options, predictor })
    }

    /// The options
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Fill in the predicted NET of all evidence with the configured predictor, for datasets
    /// read from files that do not contain a prediction
    pub fn predict_nets(&self, data_sets: &mut [LcmsDataSet]) {
        for data_set in data_sets {
            data_set.calculate_predicted_net(&self.predictor);
        }
    }

    /// Process the datasets into a database.
    ///
    /// # Errors
    /// * [`MtdbError::InconsistentDataSet`] if a dataset contains evidence of another tool.
    /// * [`MtdbError::Alignment`] if the aligner rejects the evidence (e.g. non finite values).
    /// * [`MtdbError::MisalignedResiduals`], [`MtdbError::DuplicateEvidence`],
    ///   [`MtdbError::MissingEvidence`], or [`MtdbError::InvalidDatabase`] if the corrected
    ///   evidence cannot be linked back up with the consensus targets.
    /// * [`MtdbError::Cancelled`] if the observer cancelled the run.
    pub fn process(
        &self,
        data_sets: &mut [LcmsDataSet],
        observer: &mut impl ProcessObserver,
    ) -> Result<TargetDatabase, BoxedError<'static, MtdbError>> {
        let total = data_sets.len();
        info!(
            "Processing {total} datasets with the {:?} workflow",
            self.options.workflow
        );

        // Filter
        let mut pool = Vec::new();
        let mut anchors = Vec::with_capacity(total);
        for (index, data_set) in data_sets.iter().enumerate() {
            check_cancelled(&*observer)?;
            data_set.check_consistency()?;
            if data_set.tool.is_top_down()
                != (self.options.workflow == TargetWorkflowType::TopDown)
            {
                warn!(
                    "Dataset {} contains {} identifications, which do not fit the {:?} workflow",
                    data_set.name, data_set.tool, self.options.workflow
                );
            }
            let filter = TargetFilter::new(data_set.tool, &self.options);
            let alignment_filter = AlignmentFilter::new(data_set.tool, &self.options);
            let before = pool.len();
            pool.extend(
                data_set
                    .evidence
                    .iter()
                    .filter(|e| !filter.should_filter(e))
                    .map(|e| Evidence {
                        id: None,
                        parent: None,
                        data_set: Some(index),
                        ..e.clone()
                    }),
            );
            let admitted = &pool[before..];
            let data_set_anchors = admitted
                .iter()
                .filter(|e| !alignment_filter.should_filter(e))
                .cloned()
                .collect_vec();
            debug!(
                "Dataset {}: {} evidence, {} admitted, {} rejected, {} anchors",
                data_set.name,
                data_set.evidence.len(),
                admitted.len(),
                data_set.evidence.len() - admitted.len(),
                data_set_anchors.len()
            );
            anchors.push(data_set_anchors);
        }

        // Fit
        let regressions = if self.options.workflow == TargetWorkflowType::Standard {
            data_sets
                .iter()
                .zip(&anchors)
                .map(|(data_set, anchors)| -> Result<_, BoxedError<'static, MtdbError>> {
                    let (x, y): (Vec<f64>, Vec<f64>) = anchors
                        .iter()
                        .map(|e| (e.scan as f64, e.predicted_net))
                        .unzip();
                    let regression = self
                        .options
                        .regression_type
                        .fit(&x, &y)
                        .map_err(alignment_error)?;
                    if regression.degenerate {
                        warn!(
                            "Dataset {} has {} alignment anchors, its NETs are not corrected",
                            data_set.name, regression.points
                        );
                    } else {
                        info!(
                            "Dataset {}: NET = {:.3e} * scan + {:.4} (R² {:.3}, {} anchors)",
                            data_set.name,
                            regression.slope,
                            regression.intercept,
                            regression.r_squared,
                            regression.points
                        );
                    }
                    Ok(regression)
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        // Cluster
        let mut targets = TargetClusterer::new(&self.options).cluster(pool);
        info!("Clustered into {} consensus targets", targets.len());
        let mut members: Vec<Vec<Evidence>> = vec![Vec::new(); total];
        for evidence in targets.iter().flat_map(|t| &t.evidence) {
            if let Some(list) = evidence.data_set.and_then(|index| members.get_mut(index)) {
                list.push(evidence.clone());
            }
        }
        let reference = if self.options.workflow == TargetWorkflowType::TopDown {
            reference_features(&targets)
        } else {
            Vec::new()
        };

        // Correct
        let warp = LcWarp::new(self.options.warp);
        let mut evidence_map = EvidenceMap::default();
        let mut results = Vec::with_capacity(total);
        let mut corrected = Vec::with_capacity(total);
        for (index, (data_set, mut evidence)) in data_sets.iter().zip(members).enumerate() {
            check_cancelled(&*observer)?;
            evidence.sort_by_key(Evidence::scan_key);
            let model = if let Some(regression) = regressions.get(index) {
                if !regression.degenerate {
                    for e in &mut evidence {
                        e.observed_net = regression.transform(e.scan as f64);
                    }
                }
                AlignmentModel::Regression(*regression)
            } else {
                let alignment_filter = AlignmentFilter::new(data_set.tool, &self.options);
                let features = evidence
                    .iter()
                    .map(|e| AlignFeature {
                        id: e.id.unwrap_or_default(),
                        charge: e.charge,
                        scan: e.scan,
                        scan_start: e.scan,
                        scan_end: e.scan,
                        net: e.observed_net,
                        monoisotopic_mass: e.monoisotopic_mass,
                        mz: e.mz,
                        anchor: !alignment_filter.should_filter(e),
                    })
                    .collect_vec();
                let alignment = warp
                    .align(&reference, &features)
                    .map_err(alignment_error)?;
                if alignment.degenerate {
                    warn!(
                        "Dataset {} has {} matched alignment anchors, its NETs and masses are not corrected",
                        data_set.name, alignment.matches
                    );
                } else {
                    info!(
                        "Dataset {}: warped with {} matches, NET stdev {:.4}, mass stdev {:.2} ppm",
                        data_set.name,
                        alignment.matches,
                        alignment.net_residual_stdev,
                        alignment.mass_residual_stdev_ppm
                    );
                }
                apply_residuals(&mut evidence, alignment.residuals.clone())?;
                AlignmentModel::Warp(alignment)
            };
            for e in &evidence {
                evidence_map.insert(e.clone())?;
            }
            results.push(AlignmentResult {
                data_set: data_set.name.clone(),
                anchors: anchors[index].len(),
                model,
            });
            corrected.push(evidence);
            observer.progress(index + 1, total, &format!("Aligned {}", data_set.name));
        }

        observer.alignment_complete(&results);

        // Link
        for target in &mut targets {
            relink(target, &evidence_map)?;
        }
        let database = TargetDatabase::new(targets);
        database.validate()?;

        for ((data_set, evidence), result) in data_sets.iter_mut().zip(corrected).zip(results) {
            data_set.evidence = evidence;
            data_set.alignment = Some(result);
        }
        info!(
            "Created a database with {} targets from {} evidence",
            database.len(),
            database.evidence_count()
        );
        Ok(database)
    }
}

fn alignment_error(error: BoxedError<'static, AlignError>) -> BoxedError<'static, MtdbError> {
    error.convert(|_| MtdbError::Alignment)
}

fn check_cancelled(observer: &impl ProcessObserver) -> Result<(), BoxedError<'static, MtdbError>> {
    if observer.is_cancelled() {
        Err(BoxedError::new(
            MtdbError::Cancelled,
            "Cancelled",
            "Processing was cancelled before all datasets were handled",
            Context::none(),
        ))
    } else {
        Ok(())
    }
}

/// One reference feature per consensus target and charge state, spanning the scans of all members
fn reference_features(targets: &[ConsensusTarget]) -> Vec<AlignFeature> {
    targets
        .iter()
        .flat_map(|target| {
            target.charges.iter().map(move |charge| {
                let nets = target
                    .evidence_with_charge(*charge)
                    .map(|e| e.observed_net)
                    .collect_vec();
                let net = mean(&nets).unwrap_or_default();
                let (scan_start, scan_end) =
                    (target.statistics.scan_min, target.statistics.scan_max);
                let mass = target.theoretical_monoisotopic_mass;
                AlignFeature {
                    id: target.id,
                    charge: *charge,
                    scan: scan_start + (scan_end - scan_start) / 2,
                    scan_start,
                    scan_end,
                    net,
                    monoisotopic_mass: mass,
                    mz: (*charge as f64).mul_add(PROTON, mass) / (charge.unsigned_abs().max(1) as f64),
                    anchor: true,
                }
            })
        })
        .collect()
}

/// Replace all members of the target with their corrected counterpart and update the statistics
fn relink(
    target: &mut ConsensusTarget,
    evidence_map: &EvidenceMap,
) -> Result<(), BoxedError<'static, MtdbError>> {
    for member in &mut target.evidence {
        let corrected = member.id.and_then(|id| evidence_map.get(id)).ok_or_else(|| {
            BoxedError::new(
                MtdbError::MissingEvidence,
                "Missing evidence",
                format!(
                    "The evidence {:?} of target {} was not corrected by any dataset",
                    member.id, target.id
                ),
                Context::none(),
            )
        })?;
        member.clone_from(corrected);
    }
    target.calculate_statistics();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LcmsIdentificationTool, RecordingObserver, ToolScores};

    fn evidence(sequence: &str, scan: usize, predicted_net: f64) -> Evidence {
        let mut evidence = Evidence::new(
            sequence,
            2,
            scan,
            ToolScores::XTandem {
                hyperscore: 60.0,
                log_peptide_e_value: -8.0,
                num_tryptic_ends: 2,
            },
        );
        evidence.predicted_net = predicted_net;
        evidence
    }

    #[test]
    fn atomic_on_cancel() {
        let mut data_sets = vec![
            LcmsDataSet::new(
                "a_xt.txt",
                LcmsIdentificationTool::XTandem,
                vec![evidence("AAAK", 10, 0.1), evidence("CCCK", 20, 0.2)],
            ),
            LcmsDataSet::new(
                "b_xt.txt",
                LcmsIdentificationTool::XTandem,
                vec![evidence("AAAK", 15, 0.1)],
            ),
        ];
        let original = data_sets.clone();
        let mut observer = RecordingObserver {
            cancel_after: Some(1),
            ..RecordingObserver::default()
        };
        let error = Processor::new(Options::default())
            .unwrap()
            .process(&mut data_sets, &mut observer)
            .unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::Cancelled);
        assert_eq!(data_sets, original);
        assert_eq!(observer.progress.len(), 1);
        assert!(observer.alignments.is_empty());
    }

    #[test]
    fn reference() {
        let mut a = evidence("AAAK", 10, 0.1);
        a.observed_net = 0.2;
        a.theoretical_monoisotopic_mass = 1000.0;
        let mut b = a.clone();
        b.scan = 30;
        b.observed_net = 0.4;
        let mut c = a.clone();
        c.charge = 3;
        c.scan = 50;
        let target = ConsensusTarget::new(1, vec![a, b, c]);
        let features = reference_features(&[target]);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].charge, 2);
        assert!((features[0].net - 0.3).abs() < 1e-12);
        assert!((features[1].net - 0.2).abs() < 1e-12);
        assert_eq!((features[0].scan_start, features[0].scan_end), (10, 50));
        assert_eq!((features[1].scan_start, features[1].scan_end), (10, 50));
        assert_eq!(features[0].scan, 30);
        assert!((features[1].mz - (1000.0 + 3.0 * PROTON) / 3.0).abs() < 1e-9);
    }
}
