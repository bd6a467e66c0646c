use context_error::*;
use serde::{Deserialize, Serialize};

use crate::MtdbError;

/// The available retention time predictors
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum RetentionTimePredictorType {
    /// Sequence specific retention calculator (Krokhin), hydrophobicity based
    #[default]
    Krokhin,
    /// Artificial neural network (Kangas), needs a trained network
    Kangas,
}

impl std::fmt::Display for RetentionTimePredictorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Krokhin => write!(f, "Krokhin"),
            Self::Kangas => write!(f, "Kangas"),
        }
    }
}

/// Predict the normalised elution time of a peptide from its sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionTimePredictor {
    predictor_type: RetentionTimePredictorType,
}

/// Below this length the hydrophobicity is scaled down
const SHORT_PEPTIDE: usize = 10;
/// Above this length the hydrophobicity is scaled down
const LONG_PEPTIDE: usize = 20;
/// Hydrophobicity above this value is compressed
const HIGH_HYDROPHOBICITY: f64 = 38.0;
/// Hydrophobicity to NET conversion
const NET_SLOPE: f64 = 0.0125;
const NET_INTERCEPT: f64 = 0.15;

impl RetentionTimePredictor {
    /// Create a predictor of the given type.
    ///
    /// # Errors
    /// If the predictor is [`RetentionTimePredictorType::Kangas`], which is not available.
    pub fn new(
        predictor_type: RetentionTimePredictorType,
    ) -> Result<Self, BoxedError<'static, MtdbError>> {
        match predictor_type {
            RetentionTimePredictorType::Krokhin => Ok(Self { predictor_type }),
            RetentionTimePredictorType::Kangas => Err(BoxedError::new(
                MtdbError::UnsupportedOption,
                "Unsupported retention time predictor",
                "The Kangas predictor needs a trained neural network, use the Krokhin predictor instead",
                Context::none(),
            )),
        }
    }

    /// The type of this predictor
    pub const fn predictor_type(&self) -> RetentionTimePredictorType {
        self.predictor_type
    }

    /// The hydrophobicity index of a clean peptide sequence, unknown residues do not contribute
    pub fn hydrophobicity(&self, sequence: &str) -> f64 {
        let length = sequence.chars().filter(char::is_ascii_alphabetic).count();
        if length == 0 {
            return 0.0;
        }
        let sum: f64 = sequence.chars().map(retention_coefficient).sum();
        let length_factor = if length < SHORT_PEPTIDE {
            0.027f64.mul_add(-((SHORT_PEPTIDE - length) as f64), 1.0)
        } else if length > LONG_PEPTIDE {
            0.014f64.mul_add(-((length - LONG_PEPTIDE) as f64), 1.0)
        } else {
            1.0
        };
        let hydrophobicity = sum * length_factor;
        if hydrophobicity >= HIGH_HYDROPHOBICITY {
            0.3f64.mul_add(-(hydrophobicity - HIGH_HYDROPHOBICITY), hydrophobicity)
        } else {
            hydrophobicity
        }
    }

    /// The predicted normalised elution time (0..=1) of a clean peptide sequence
    pub fn predict(&self, sequence: &str) -> f64 {
        NET_SLOPE
            .mul_add(self.hydrophobicity(sequence), NET_INTERCEPT)
            .clamp(0.0, 1.0)
    }
}

/// Retention coefficient of a residue
fn retention_coefficient(residue: char) -> f64 {
    match residue.to_ascii_uppercase() {
        'A' => 0.8,
        'C' => -0.8,
        'D' => -0.5,
        'F' => 10.5,
        'G' | 'Q' => -0.9,
        'H' | 'R' => -1.3,
        'I' => 8.4,
        'K' => -1.9,
        'L' => 9.6,
        'M' => 5.8,
        'N' => -1.2,
        'P' => 0.2,
        'S' => -0.8,
        'T' => 0.4,
        'V' => 5.0,
        'W' => 11.0,
        'Y' => 4.0,
        _ => 0.0,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let predictor = RetentionTimePredictor::new(RetentionTimePredictorType::Krokhin).unwrap();
        let hydrophilic = predictor.predict("GSKDEK");
        let hydrophobic = predictor.predict("LLFWIVLK");
        assert!(hydrophilic < hydrophobic);
        assert!((0.0..=1.0).contains(&hydrophilic));
        assert!((0.0..=1.0).contains(&hydrophobic));
        assert_eq!(predictor.predict(""), NET_INTERCEPT);
        assert_eq!(
            predictor.predict("PEPTIDEK"),
            predictor.predict("peptidek")
        );
    }

    #[test]
    fn length_correction() {
        let predictor = RetentionTimePredictor::new(RetentionTimePredictorType::Krokhin).unwrap();
        // 10 alanines are not corrected, 5 are scaled down
        assert!((predictor.hydrophobicity("AAAAAAAAAA") - 8.0).abs() < 1e-9);
        assert!((predictor.hydrophobicity("AAAAA") - 4.0 * 0.865).abs() < 1e-9);
        // Very hydrophobic peptides are compressed
        assert!(predictor.hydrophobicity("WWWWWWWWWW") < 110.0);
    }

    #[test]
    fn kangas_unsupported() {
        let error = RetentionTimePredictor::new(RetentionTimePredictorType::Kangas).unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::UnsupportedOption);
    }
}
