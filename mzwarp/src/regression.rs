use context_error::*;
use serde::{Deserialize, Serialize};

use crate::AlignError;

/// The maximal number of expectation maximisation rounds for [`RegressionType::LinearEm`]
const EM_ITERATIONS: usize = 30;
/// Stop the expectation maximisation when the coefficients change less than this
const EM_CONVERGENCE: f64 = 1e-12;

/// The regression model used to map the observed time axis of a dataset onto the normalised elution time axis
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum RegressionType {
    /// Ordinary least squares
    Linear,
    /// Least squares refined with expectation maximisation on a mixture of normally distributed
    /// inliers and uniformly distributed outliers. Wrong identifications barely influence the fit.
    #[default]
    LinearEm,
}

impl std::fmt::Display for RegressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Linear => "Linear",
                Self::LinearEm => "Linear EM",
            }
        )
    }
}

/// A fitted linear model `y = slope * x + intercept`
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct RegressionResult {
    /// The regression that was used
    pub regression_type: RegressionType,
    /// The slope
    pub slope: f64,
    /// The intercept
    pub intercept: f64,
    /// The coefficient of determination over all points (not weighted)
    pub r_squared: f64,
    /// The number of points the model was fitted on
    pub points: usize,
    /// If there was not enough information to fit a model, in that case this is the identity model
    pub degenerate: bool,
}

impl RegressionResult {
    /// The identity model, used when there are not enough points to fit anything
    pub const fn identity(regression_type: RegressionType, points: usize) -> Self {
        Self {
            regression_type,
            slope: 1.0,
            intercept: 0.0,
            r_squared: 0.0,
            points,
            degenerate: true,
        }
    }

    /// Apply the model
    pub fn transform(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

impl Default for RegressionResult {
    fn default() -> Self {
        Self::identity(RegressionType::default(), 0)
    }
}

impl RegressionType {
    /// Fit this regression on the paired coordinates `x` (observed) and `y` (reference).
    ///
    /// With less than two points, or when all `x` are identical, no model can be fitted and the
    /// [identity](RegressionResult::identity) model is returned with the `degenerate` flag set.
    ///
    /// # Errors
    /// When `x` and `y` do not have the same length, or if any of the values is not finite.
    pub fn fit(self, x: &[f64], y: &[f64]) -> Result<RegressionResult, BoxedError<'static, AlignError>> {
        if x.len() != y.len() {
            return Err(BoxedError::new(
                AlignError::MismatchedLengths,
                "Invalid regression input",
                format!(
                    "The observed ({}) and reference ({}) coordinates should have the same length",
                    x.len(),
                    y.len()
                ),
                Context::none(),
            ));
        }
        if let Some(index) = x.iter().zip(y).position(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(BoxedError::new(
                AlignError::NonFiniteInput,
                "Invalid regression input",
                format!(
                    "The point at index {index} ({}, {}) is not finite",
                    x[index], y[index]
                ),
                Context::none(),
            ));
        }
        if x.len() < 2 {
            return Ok(RegressionResult::identity(self, x.len()));
        }

        let Some(mut line) = weighted_least_squares(x, y, &vec![1.0; x.len()]) else {
            return Ok(RegressionResult::identity(self, x.len()));
        };
        if self == Self::LinearEm {
            line = expectation_maximisation(x, y, line);
        }

        Ok(RegressionResult {
            regression_type: self,
            slope: line.0,
            intercept: line.1,
            r_squared: r_squared(x, y, line),
            points: x.len(),
            degenerate: false,
        })
    }
}

/// Weighted least squares, returns `(slope, intercept)` or `None` if the x values have no spread
fn weighted_least_squares(x: &[f64], y: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
    let total: f64 = weights.iter().sum();
    if total <= f64::EPSILON {
        return None;
    }
    let mean_x = x.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>() / total;
    let mean_y = y.iter().zip(weights).map(|(y, w)| y * w).sum::<f64>() / total;
    let (sxx, sxy) = x
        .iter()
        .zip(y)
        .zip(weights)
        .fold((0.0, 0.0), |(sxx, sxy), ((x, y), w)| {
            (
                w * (x - mean_x).powi(2) + sxx,
                w * (x - mean_x) * (y - mean_y) + sxy,
            )
        });
    if sxx <= f64::EPSILON * total * mean_x.abs().max(1.0) {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, slope.mul_add(-mean_x, mean_y)))
}

fn residual(x: f64, y: f64, (slope, intercept): (f64, f64)) -> f64 {
    y - slope.mul_add(x, intercept)
}

/// Refine a line by treating every point as either drawn from a normal distribution around the
/// line or from a uniform noise distribution over the range of `y`.
fn expectation_maximisation(x: &[f64], y: &[f64], initial: (f64, f64)) -> (f64, f64) {
    let (min_y, max_y) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
    let noise_density = 1.0 / (max_y - min_y).max(f64::EPSILON);
    let mut line = initial;
    let mut inlier_fraction = 0.9;
    let mut variance = x
        .iter()
        .zip(y)
        .map(|(x, y)| residual(*x, *y, line).powi(2))
        .sum::<f64>()
        / x.len() as f64;

    for _ in 0..EM_ITERATIONS {
        if variance <= f64::EPSILON {
            break;
        }
        let normalisation = (2.0 * std::f64::consts::PI * variance).sqrt();
        let weights: Vec<f64> = x
            .iter()
            .zip(y)
            .map(|(x, y)| {
                let r = residual(*x, *y, line);
                let inlier = inlier_fraction * (-r * r / (2.0 * variance)).exp() / normalisation;
                let outlier = (1.0 - inlier_fraction) * noise_density;
                if inlier + outlier > 0.0 {
                    inlier / (inlier + outlier)
                } else {
                    0.0
                }
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= f64::EPSILON {
            break;
        }
        let Some(next) = weighted_least_squares(x, y, &weights) else {
            break;
        };
        inlier_fraction = total / x.len() as f64;
        variance = x
            .iter()
            .zip(y)
            .zip(&weights)
            .map(|((x, y), w)| w * residual(*x, *y, next).powi(2))
            .sum::<f64>()
            / total;
        let converged = (next.0 - line.0).abs() < EM_CONVERGENCE
            && (next.1 - line.1).abs() < EM_CONVERGENCE;
        line = next;
        if converged {
            break;
        }
    }
    line
}

fn r_squared(x: &[f64], y: &[f64], line: (f64, f64)) -> f64 {
    let mean_y = y.iter().sum::<f64>() / y.len() as f64;
    let total: f64 = y.iter().map(|y| (y - mean_y).powi(2)).sum();
    let residuals: f64 = x
        .iter()
        .zip(y)
        .map(|(x, y)| residual(*x, *y, line).powi(2))
        .sum();
    if total <= f64::EPSILON {
        if residuals <= f64::EPSILON { 1.0 } else { 0.0 }
    } else {
        1.0 - residuals / total
    }
}
