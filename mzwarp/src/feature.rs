use serde::{Deserialize, Serialize};

/// A feature on the LC-MS time axis as used by the aligners, either from the dataset that is
/// aligned or from the reference the dataset is aligned onto.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AlignFeature {
    /// The identifier, used to pair the [`Residual`]s back up with the source of the feature
    pub id: usize,
    /// The charge state
    pub charge: isize,
    /// The (apex) scan
    pub scan: usize,
    /// The first scan this feature was observed in
    pub scan_start: usize,
    /// The last scan this feature was observed in
    pub scan_end: usize,
    /// The normalised elution time
    pub net: f64,
    /// The monoisotopic mass in Dalton
    pub monoisotopic_mass: f64,
    /// The mass over charge in Thomson
    pub mz: f64,
    /// If this feature may drive the fit of the alignment, all features get a residual regardless
    pub anchor: bool,
}

impl AlignFeature {
    /// A feature observed in a single scan
    pub fn single_scan(
        id: usize,
        charge: isize,
        scan: usize,
        net: f64,
        monoisotopic_mass: f64,
        mz: f64,
    ) -> Self {
        Self {
            id,
            charge,
            scan,
            scan_start: scan,
            scan_end: scan,
            net,
            monoisotopic_mass,
            mz,
            anchor: true,
        }
    }

    /// The number of scans between the first and last observation
    pub const fn span(&self) -> usize {
        self.scan_end.saturating_sub(self.scan_start)
    }

    /// The key features and residuals are ordered on before being paired up
    pub const fn scan_key(&self) -> (usize, usize) {
        (self.scan, self.id)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.net.is_finite() && self.monoisotopic_mass.is_finite() && self.mz.is_finite()
    }
}

/// The correction for a single feature as determined by an alignment
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Residual {
    /// The identifier of the feature
    pub id: usize,
    /// The scan of the feature
    pub scan: usize,
    /// The corrected normalised elution time
    pub net: f64,
    /// The systematic mass error in Dalton, subtract this from the observed mass to correct it
    pub mass_correction: f64,
}

impl Residual {
    /// The key features and residuals are ordered on before being paired up
    pub const fn scan_key(&self) -> (usize, usize) {
        (self.scan, self.id)
    }
}
