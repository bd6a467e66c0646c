use context_error::*;
use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    AlignError, AlignFeature, RegressionResult, RegressionType, Residual,
    helper_functions::{ppm, standard_deviation},
    warp_matrix::WarpMatrix,
};

/// The parameters for [`LcWarp`]
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct WarpOptions {
    /// The number of sections the NET axis of the dataset is split into
    pub time_sections: usize,
    /// The number of reference sections per dataset section, the resolution of the warp
    pub contraction_factor: usize,
    /// A dataset section can be stretched over at most `contraction_factor * max_section_distortion` reference sections
    pub max_section_distortion: usize,
    /// The maximal mass difference (in ppm) for a feature to be matched to a reference feature
    pub mass_tolerance_ppm: f64,
    /// Matches further away in NET than this contribute a constant penalty
    pub net_tolerance: f64,
    /// The expected standard deviation of the NET of a correct match
    pub net_stdev: f64,
    /// The penalty per reference section a dataset section deviates from the average stretch
    pub stretch_penalty: f64,
    /// The minimal number of matched anchor features needed to fit a warp
    pub min_matches: usize,
    /// Recalibrate the mass axis as function of m/z
    pub mass_calibration: bool,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            time_sections: 100,
            contraction_factor: 3,
            max_section_distortion: 2,
            mass_tolerance_ppm: 15.0,
            net_tolerance: 0.02,
            net_stdev: 0.01,
            stretch_penalty: 0.01,
            min_matches: 5,
            mass_calibration: true,
        }
    }
}

/// A monotone piecewise linear function from the NET axis of a dataset onto the reference NET axis
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WarpFunction {
    dataset_boundaries: Vec<f64>,
    reference_boundaries: Vec<f64>,
}

impl WarpFunction {
    /// The function that leaves every NET untouched
    pub const fn identity() -> Self {
        Self {
            dataset_boundaries: Vec::new(),
            reference_boundaries: Vec::new(),
        }
    }

    /// Check if this is the identity function
    pub fn is_identity(&self) -> bool {
        self.dataset_boundaries.len() < 2
    }

    /// The section boundaries on the dataset axis
    pub fn dataset_boundaries(&self) -> &[f64] {
        &self.dataset_boundaries
    }

    /// The section boundaries on the reference axis
    pub fn reference_boundaries(&self) -> &[f64] {
        &self.reference_boundaries
    }

    /// Map a dataset NET onto the reference, values outside of the fitted range are extrapolated
    /// with the first or last section.
    pub fn warp(&self, net: f64) -> f64 {
        let len = self.dataset_boundaries.len();
        if len < 2 {
            return net;
        }
        let upper = self
            .dataset_boundaries
            .partition_point(|b| *b <= net)
            .clamp(1, len - 1);
        let (d0, d1) = (
            self.dataset_boundaries[upper - 1],
            self.dataset_boundaries[upper],
        );
        let (r0, r1) = (
            self.reference_boundaries[upper - 1],
            self.reference_boundaries[upper],
        );
        if d1 - d0 <= f64::EPSILON {
            r0
        } else {
            (net - d0) / (d1 - d0) * (r1 - r0) + r0
        }
    }
}

/// The result of warping a single dataset onto a reference
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WarpAlignment {
    /// The fitted time warp
    pub warp: WarpFunction,
    /// The mass error (ppm) as function of m/z, degenerate if no calibration was done
    pub mass_calibration: RegressionResult,
    /// The number of anchor features with at least one reference feature within the mass tolerance
    pub matches: usize,
    /// The standard deviation of the NET difference of the matches after warping
    pub net_residual_stdev: f64,
    /// The standard deviation of the ppm error of the matches after mass calibration
    pub mass_residual_stdev_ppm: f64,
    /// If there was not enough information to warp, in that case the warp is the identity and no mass correction is applied
    pub degenerate: bool,
    /// One residual per input feature, in the same order as the input
    pub residuals: Vec<Residual>,
}

/// A possible partner on the reference for a dataset feature
#[derive(Clone, Copy, Debug)]
struct Candidate {
    net: f64,
    mass: f64,
}

/// Time warping of LC-MS datasets onto a reference.
///
/// The NET axis of the dataset is split into sections, the reference axis into
/// `contraction_factor` times as many sections. Every dataset section is assigned a contiguous
/// run of reference sections so that the whole assignment is monotone, this assignment is
/// chosen with dynamic programming to maximise the likelihood of the NET of all anchor features
/// that have a reference feature with the same charge within the mass tolerance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LcWarp {
    options: WarpOptions,
}

impl LcWarp {
    /// Create a new aligner
    pub const fn new(options: WarpOptions) -> Self {
        Self { options }
    }

    /// The options
    pub const fn options(&self) -> &WarpOptions {
        &self.options
    }

    /// Align the features of a single dataset onto the reference. The residuals are returned in
    /// the same order as `features`.
    ///
    /// # Errors
    /// If any of the features or reference features has a non finite NET, mass, or m/z.
    pub fn align(
        &self,
        reference: &[AlignFeature],
        features: &[AlignFeature],
    ) -> Result<WarpAlignment, BoxedError<'static, AlignError>> {
        for (name, set) in [("reference", reference), ("dataset", features)] {
            if let Some(feature) = set.iter().find(|f| !f.is_finite()) {
                return Err(BoxedError::new(
                    AlignError::NonFiniteInput,
                    "Invalid feature",
                    format!(
                        "The {name} feature with id {} has a non finite NET, mass, or m/z",
                        feature.id
                    ),
                    Context::none(),
                ));
            }
        }

        let matched = self.candidates(reference, features);
        if matched.len() < self.options.min_matches.max(1) {
            log::debug!(
                "Only {} of the required {} anchor features matched the reference, not warping",
                matched.len(),
                self.options.min_matches
            );
            return Ok(Self::degenerate(features, matched.len()));
        }

        let (MinMaxResult::MinMax(t_min, t_max), MinMaxResult::MinMax(n_min, n_max)) = (
            features.iter().map(|f| OrderedFloat(f.net)).minmax(),
            reference.iter().map(|f| OrderedFloat(f.net)).minmax(),
        ) else {
            return Ok(Self::degenerate(features, matched.len()));
        };
        let (t_min, t_max, n_min, n_max) = (t_min.0, t_max.0, n_min.0, n_max.0);
        if t_max - t_min <= f64::EPSILON || n_max - n_min <= f64::EPSILON {
            return Ok(Self::degenerate(features, matched.len()));
        }

        let sections = self.options.time_sections.max(1);
        let contraction = self.options.contraction_factor.max(1);
        let reference_sections = sections * contraction;
        let max_length = (contraction * self.options.max_section_distortion.max(1))
            .min(reference_sections)
            .min(u16::MAX as usize);
        let section_width = (t_max - t_min) / sections as f64;
        let reference_width = (n_max - n_min) / reference_sections as f64;

        let mut by_section: Vec<Vec<(f64, &[Candidate])>> = vec![Vec::new(); sections];
        for (index, candidates) in &matched {
            let net = features[*index].net;
            let section = (((net - t_min) / section_width) as usize).min(sections - 1);
            by_section[section].push((net, candidates.as_slice()));
        }

        // Score of stretching dataset section `s` over the reference sections `start..start + length`,
        // stored at `start * max_length + length - 1`
        let section_scores = |section: usize| -> Vec<f64> {
            let low = (section as f64).mul_add(section_width, t_min);
            let mut scores = vec![f64::NEG_INFINITY; reference_sections * max_length];
            for start in 0..reference_sections {
                let reference_low = (start as f64).mul_add(reference_width, n_min);
                for length in 1..=max_length.min(reference_sections - start) {
                    let stretch = length as f64 * reference_width / section_width;
                    let mut score = -self.options.stretch_penalty
                        * (length as f64 - contraction as f64).abs();
                    for (net, candidates) in &by_section[section] {
                        score += self.match_score((net - low).mul_add(stretch, reference_low), candidates);
                    }
                    scores[start * max_length + length - 1] = score;
                }
            }
            scores
        };
        #[cfg(feature = "rayon")]
        let table: Vec<Vec<f64>> = (0..sections).into_par_iter().map(section_scores).collect();
        #[cfg(not(feature = "rayon"))]
        let table: Vec<Vec<f64>> = (0..sections).map(section_scores).collect();

        let mut matrix = WarpMatrix::new(sections, reference_sections);
        for start in 0..reference_sections {
            for length in 1..=max_length.min(reference_sections - start) {
                matrix.improve(
                    [0, start + length],
                    table[0][start * max_length + length - 1],
                    length,
                );
            }
        }
        for section in 1..sections {
            for end in 1..=reference_sections {
                for length in 1..=max_length.min(end) {
                    let previous = matrix[[section - 1, end - length]].score;
                    if previous.is_finite() {
                        matrix.improve(
                            [section, end],
                            previous + table[section][(end - length) * max_length + length - 1],
                            length,
                        );
                    }
                }
            }
        }

        let Some(end) = matrix.best_end() else {
            return Ok(Self::degenerate(features, matched.len()));
        };
        let warp = WarpFunction {
            dataset_boundaries: (0..=sections)
                .map(|s| (s as f64).mul_add(section_width, t_min))
                .collect(),
            reference_boundaries: matrix
                .trace_path(end)
                .into_iter()
                .map(|r| (r as f64).mul_add(reference_width, n_min))
                .collect(),
        };

        // Pair every matched anchor with its closest reference feature after warping
        let pairs: Vec<(f64, f64, f64)> = matched
            .iter()
            .filter_map(|(index, candidates)| {
                let feature = &features[*index];
                let warped = warp.warp(feature.net);
                candidates
                    .iter()
                    .min_by_key(|c| OrderedFloat((warped - c.net).abs()))
                    .filter(|c| (warped - c.net).abs() <= self.options.net_tolerance)
                    .map(|c| {
                        (
                            warped - c.net,
                            feature.mz,
                            ppm(feature.monoisotopic_mass, c.mass),
                        )
                    })
            })
            .collect();
        let mass_calibration = if self.options.mass_calibration {
            let (mz, errors): (Vec<f64>, Vec<f64>) = pairs.iter().map(|p| (p.1, p.2)).unzip();
            RegressionType::LinearEm.fit(&mz, &errors).unwrap_or_else(|error| {
                log::warn!("Masses are not recalibrated: {error}");
                RegressionResult::identity(RegressionType::LinearEm, pairs.len())
            })
        } else {
            RegressionResult::identity(RegressionType::LinearEm, 0)
        };
        let ppm_correction = |mz: f64| {
            if mass_calibration.degenerate {
                0.0
            } else {
                mass_calibration.transform(mz)
            }
        };

        let net_residual_stdev =
            standard_deviation(&pairs.iter().map(|p| p.0).collect_vec()).unwrap_or_default();
        let mass_residual_stdev_ppm = standard_deviation(
            &pairs
                .iter()
                .map(|p| p.2 - ppm_correction(p.1))
                .collect_vec(),
        )
        .unwrap_or_default();
        log::debug!(
            "Warped {} features with {} matches, NET stdev {net_residual_stdev:.4}, mass stdev {mass_residual_stdev_ppm:.2} ppm",
            features.len(),
            matched.len(),
        );

        let residuals = features
            .iter()
            .map(|f| Residual {
                id: f.id,
                scan: f.scan,
                net: warp.warp(f.net),
                mass_correction: ppm_correction(f.mz) * f.monoisotopic_mass / 1e6,
            })
            .collect();

        Ok(WarpAlignment {
            warp,
            mass_calibration,
            matches: matched.len(),
            net_residual_stdev,
            mass_residual_stdev_ppm,
            degenerate: false,
            residuals,
        })
    }

    /// For every anchor feature find all reference features with the same charge within the mass tolerance.
    /// Only returns anchors with at least one candidate, as `(index in features, candidates)`.
    /// Features without a known (positive) mass never match.
    fn candidates(
        &self,
        reference: &[AlignFeature],
        features: &[AlignFeature],
    ) -> Vec<(usize, Vec<Candidate>)> {
        let by_mass = reference
            .iter()
            .filter(|f| f.monoisotopic_mass > 0.0)
            .sorted_by_key(|f| OrderedFloat(f.monoisotopic_mass))
            .collect_vec();
        let tolerance = self.options.mass_tolerance_ppm / 1e6;
        features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.anchor && f.monoisotopic_mass > 0.0)
            .filter_map(|(index, feature)| {
                let low = feature.monoisotopic_mass * (1.0 - tolerance);
                let high = feature.monoisotopic_mass * (1.0 + tolerance);
                let start = by_mass.partition_point(|r| r.monoisotopic_mass < low);
                let candidates = by_mass[start..]
                    .iter()
                    .take_while(|r| r.monoisotopic_mass <= high)
                    .filter(|r| r.charge == feature.charge)
                    .map(|r| Candidate {
                        net: r.net,
                        mass: r.monoisotopic_mass,
                    })
                    .collect_vec();
                (!candidates.is_empty()).then_some((index, candidates))
            })
            .collect()
    }

    /// The log likelihood of the best candidate for a warped NET, capped at the NET tolerance
    fn match_score(&self, warped: f64, candidates: &[Candidate]) -> f64 {
        let distance = candidates
            .iter()
            .map(|c| (warped - c.net).abs())
            .fold(self.options.net_tolerance, f64::min);
        -(distance * distance) / (2.0 * self.options.net_stdev * self.options.net_stdev)
    }

    fn degenerate(features: &[AlignFeature], matches: usize) -> WarpAlignment {
        WarpAlignment {
            warp: WarpFunction::identity(),
            mass_calibration: RegressionResult::identity(RegressionType::LinearEm, 0),
            matches,
            net_residual_stdev: 0.0,
            mass_residual_stdev_ppm: 0.0,
            degenerate: true,
            residuals: features
                .iter()
                .map(|f| Residual {
                    id: f.id,
                    scan: f.scan,
                    net: f.net,
                    mass_correction: 0.0,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn warp_function() {
        let identity = WarpFunction::identity();
        assert!(identity.is_identity());
        assert_eq!(identity.warp(0.25), 0.25);

        let warp = WarpFunction {
            dataset_boundaries: vec![0.0, 0.5, 1.0],
            reference_boundaries: vec![0.1, 0.3, 0.9],
        };
        assert!(!warp.is_identity());
        assert!((warp.warp(0.25) - 0.2).abs() < 1e-12);
        assert!((warp.warp(0.75) - 0.6).abs() < 1e-12);
        assert!((warp.warp(1.0) - 0.9).abs() < 1e-12);
        // Extrapolated with the outer sections
        assert!((warp.warp(-0.5) - -0.1).abs() < 1e-12);
        assert!((warp.warp(1.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn match_score_is_capped() {
        let warp = LcWarp::default();
        let candidates = [Candidate {
            net: 0.5,
            mass: 1000.0,
        }];
        assert_eq!(warp.match_score(0.5, &candidates), 0.0);
        assert_eq!(
            warp.match_score(0.9, &candidates),
            warp.match_score(0.6, &candidates)
        );
        assert!(warp.match_score(0.51, &candidates) > warp.match_score(0.52, &candidates));
    }
}
