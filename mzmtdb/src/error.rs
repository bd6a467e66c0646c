//! The [`MtdbError`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::ErrorKind;

/// The kinds of errors that can occur while building a mass tag database
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MtdbError {
    /// The options ask for a feature that is not available
    UnsupportedOption,
    /// The options contain an invalid value or could not be read
    #[default]
    InvalidConfiguration,
    /// A dataset contains evidence of another identification tool
    InconsistentDataSet,
    /// The residuals of an alignment could not be paired up with the evidence
    MisalignedResiduals,
    /// Two corrected evidence have the same id
    DuplicateEvidence,
    /// A member of a consensus target has no corrected counterpart
    MissingEvidence,
    /// The aligner rejected its input
    Alignment,
    /// The observer cancelled the run
    Cancelled,
    /// The finished database breaks one of its invariants
    InvalidDatabase,
}

impl ErrorKind for MtdbError {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}
