use std::path::Path;

use context_error::*;
use mzwarp::{RegressionType, WarpOptions};
use serde::{Deserialize, Serialize};

use crate::{MtdbError, RetentionTimePredictorType};

/// The kind of experiment the database is built from
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum TargetWorkflowType {
    /// Bottom-up: peptides, aligned with a regression on the predicted elution time
    #[default]
    Standard,
    /// Top-down: proteoforms, aligned by warping onto the consensus of all datasets
    TopDown,
}

/// All settings for building a mass tag database, read only during a run
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Options {
    /// The workflow, determines the aligner and clustering
    pub workflow: TargetWorkflowType,
    /// The regression used in the standard workflow
    pub regression_type: RegressionType,
    /// The retention time predictor used to fill in predicted NETs
    pub predictor_type: RetentionTimePredictorType,
    /// Evidence with more modifications is not used as alignment anchor
    pub max_modifications_for_alignment: usize,
    /// Evidence with more modifications is not admitted at all
    pub max_modifications_for_admission: usize,
    /// The minimal number of tryptic termini (not used for MSAlign)
    pub min_tryptic_ends: usize,

    /// Sequest: minimal XCorr for charge 1, 2, and 3 or higher
    pub min_xcorr: [f64; 3],
    /// Sequest: minimal DelCn2
    pub min_delta_cn2: f64,
    /// Sequest: maximal MSGF spectral probability, only checked if present
    pub max_spec_prob: f64,
    /// Sequest: minimal XCorr to be used as alignment anchor
    pub min_xcorr_for_alignment: f64,

    /// X!Tandem: maximal log10 E-value
    pub max_log_e_value: f64,
    /// X!Tandem: maximal log10 E-value to be used as alignment anchor
    pub max_log_e_value_for_alignment: f64,

    /// MSGF+: maximal spectral E-value
    pub max_spec_e_value: f64,
    /// MSGF+: maximal Q-value
    pub max_q_value: f64,
    /// MSGF+: maximal Q-value to be used as alignment anchor
    pub max_q_value_for_alignment: f64,

    /// MSAlign: maximal E-value
    pub max_e_value: f64,

    /// Top-down clustering: evidence further apart in mass (ppm) form separate targets
    pub cluster_mass_tolerance_ppm: f64,
    /// Top-down clustering: evidence further apart in NET form separate targets
    pub cluster_net_tolerance: f64,
    /// The settings for the top-down aligner
    pub warp: WarpOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workflow: TargetWorkflowType::Standard,
            regression_type: RegressionType::LinearEm,
            predictor_type: RetentionTimePredictorType::Krokhin,
            max_modifications_for_alignment: 0,
            max_modifications_for_admission: 3,
            min_tryptic_ends: 0,
            min_xcorr: [1.6, 2.4, 3.2],
            min_delta_cn2: 0.1,
            max_spec_prob: 1e-10,
            min_xcorr_for_alignment: 3.0,
            max_log_e_value: -2.0,
            max_log_e_value_for_alignment: -3.0,
            max_spec_e_value: 1e-10,
            max_q_value: 0.05,
            max_q_value_for_alignment: 0.01,
            max_e_value: 1e-4,
            cluster_mass_tolerance_ppm: 10.0,
            cluster_net_tolerance: 0.05,
            warp: WarpOptions::default(),
        }
    }
}

impl Options {
    /// Check that all options can be used.
    ///
    /// # Errors
    /// If an unsupported predictor is selected, if any of the tolerances is not a positive finite
    /// number, or if any of the score thresholds is not finite (probabilities and E-values also not negative).
    pub fn validate(&self) -> Result<(), BoxedError<'static, MtdbError>> {
        if self.predictor_type == RetentionTimePredictorType::Kangas {
            return Err(BoxedError::new(
                MtdbError::UnsupportedOption,
                "Unsupported retention time predictor",
                "The Kangas predictor needs a trained neural network, use the Krokhin predictor instead",
                Context::none(),
            ));
        }
        let tolerances = [
            ("cluster_mass_tolerance_ppm", self.cluster_mass_tolerance_ppm),
            ("cluster_net_tolerance", self.cluster_net_tolerance),
            ("warp.mass_tolerance_ppm", self.warp.mass_tolerance_ppm),
            ("warp.net_tolerance", self.warp.net_tolerance),
            ("warp.net_stdev", self.warp.net_stdev),
        ];
        if let Some((name, value)) = tolerances
            .iter()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0)
        {
            return Err(BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid tolerance",
                format!("The option {name} should be a positive number, but is {value}"),
                Context::none(),
            ));
        }
        let probabilities = [
            ("max_spec_prob", self.max_spec_prob),
            ("max_spec_e_value", self.max_spec_e_value),
            ("max_q_value", self.max_q_value),
            ("max_q_value_for_alignment", self.max_q_value_for_alignment),
            ("max_e_value", self.max_e_value),
        ];
        if let Some((name, value)) = probabilities
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid threshold",
                format!("The option {name} should be a non negative number, but is {value}"),
                Context::none(),
            ));
        }
        let thresholds = [
            ("min_xcorr", self.min_xcorr.iter().all(|v| v.is_finite())),
            ("min_delta_cn2", self.min_delta_cn2.is_finite()),
            ("min_xcorr_for_alignment", self.min_xcorr_for_alignment.is_finite()),
            ("max_log_e_value", self.max_log_e_value.is_finite()),
            (
                "max_log_e_value_for_alignment",
                self.max_log_e_value_for_alignment.is_finite(),
            ),
            (
                "warp.stretch_penalty",
                self.warp.stretch_penalty.is_finite() && self.warp.stretch_penalty >= 0.0,
            ),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, valid)| !valid) {
            return Err(BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid threshold",
                format!("The option {name} should be a finite number"),
                Context::none(),
            ));
        }
        if self.warp.time_sections == 0 || self.warp.contraction_factor == 0 {
            return Err(BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid warp options",
                "The number of time sections and the contraction factor should be at least one",
                Context::none(),
            ));
        }
        Ok(())
    }

    /// Parse options from JSON, missing options get their default value.
    ///
    /// # Errors
    /// If the text is not valid JSON or the options do not pass [`Self::validate`].
    pub fn from_json(text: &str) -> Result<Self, BoxedError<'static, MtdbError>> {
        let options: Self = serde_json::from_str(text).map_err(|err| {
            BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid options",
                err.to_string(),
                Context::none(),
            )
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a JSON file, missing options get their default value.
    ///
    /// # Errors
    /// If the file could not be read, is not valid JSON, or the options do not pass [`Self::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, MtdbError>> {
        let path = path.as_ref();
        let context = || Context::default().source(path.to_string_lossy()).to_owned();
        let text = std::fs::read_to_string(path).map_err(|err| {
            BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Could not read options",
                err.to_string(),
                context(),
            )
        })?;
        let options: Self = serde_json::from_str(&text).map_err(|err| {
            BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Invalid options",
                err.to_string(),
                context(),
            )
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Write the options as pretty printed JSON
    ///
    /// # Errors
    /// Never for the options as defined, serialisation of plain numbers and enums cannot fail.
    pub fn to_json(&self) -> Result<String, BoxedError<'static, MtdbError>> {
        serde_json::to_string_pretty(self).map_err(|err| {
            BoxedError::new(
                MtdbError::InvalidConfiguration,
                "Could not write options",
                err.to_string(),
                Context::none(),
            )
        })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn json() {
        let options = Options {
            workflow: TargetWorkflowType::TopDown,
            max_e_value: 0.01,
            ..Options::default()
        };
        let text = options.to_json().unwrap();
        assert_eq!(Options::from_json(&text).unwrap(), options);
    }

    #[test]
    fn partial_json() {
        let options =
            Options::from_json(r#"{"workflow": "TopDown", "warp": {"time_sections": 20}}"#).unwrap();
        assert_eq!(options.workflow, TargetWorkflowType::TopDown);
        assert_eq!(options.warp.time_sections, 20);
        assert_eq!(options.warp.contraction_factor, 3);
        assert_eq!(options.max_modifications_for_admission, 3);
        let error = Options::from_json(r#"{"workflow": "Sideways"}"#).unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::InvalidConfiguration);
        let error = Options::from_json(r#"{"predictor_type": "Kangas"}"#).unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::UnsupportedOption);
        let error = Options::from_json(r#"{"max_q_value": -0.5}"#).unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::InvalidConfiguration);
    }

    #[test]
    fn missing_file() {
        let error = Options::from_json_file("does/not/exist.json").unwrap_err();
        assert_eq!(error.get_kind(), MtdbError::InvalidConfiguration);
    }

    #[test]
    fn validate() {
        assert!(Options::default().validate().is_ok());
        let kangas = Options {
            predictor_type: RetentionTimePredictorType::Kangas,
            ..Options::default()
        };
        assert_eq!(
            kangas.validate().unwrap_err().get_kind(),
            MtdbError::UnsupportedOption
        );
        let mut negative = Options::default();
        negative.warp.net_tolerance = -0.1;
        assert_eq!(
            negative.validate().unwrap_err().get_kind(),
            MtdbError::InvalidConfiguration
        );
        let nan = Options {
            cluster_mass_tolerance_ppm: f64::NAN,
            ..Options::default()
        };
        assert!(nan.validate().is_err());
        for options in [
            Options {
                max_spec_prob: f64::NAN,
                ..Options::default()
            },
            Options {
                max_spec_e_value: f64::NAN,
                ..Options::default()
            },
            Options {
                max_q_value: f64::NAN,
                ..Options::default()
            },
            Options {
                max_q_value_for_alignment: f64::INFINITY,
                ..Options::default()
            },
            Options {
                max_e_value: -1e-4,
                ..Options::default()
            },
        ] {
            assert_eq!(
                options.validate().unwrap_err().get_kind(),
                MtdbError::InvalidConfiguration
            );
        }
    }
}
