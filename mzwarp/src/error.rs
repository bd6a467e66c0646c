//! The [`AlignError`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::ErrorKind;

/// The kinds of errors that can occur while aligning a time axis
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AlignError {
    /// The two paired coordinate sequences do not have the same length
    #[default]
    MismatchedLengths,
    /// A coordinate, mass, or m/z was NaN or infinite
    NonFiniteInput,
}

impl ErrorKind for AlignError {
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
