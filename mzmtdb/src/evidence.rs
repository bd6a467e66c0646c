use serde::{Deserialize, Serialize};

use crate::LcmsIdentificationTool;

/// The scores a single identification tool assigned to an identification
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum ToolScores {
    /// Sequest
    Sequest {
        /// The cross correlation score
        xcorr: f64,
        /// The normalised difference in XCorr with the best scoring identification for the same spectrum
        delta_cn: f64,
        /// The normalised difference in XCorr with the next best scoring identification
        delta_cn2: f64,
        /// The preliminary score
        sp: f64,
        /// The rank on preliminary score
        rank_sp: usize,
        /// The rank on XCorr
        rank_xc: usize,
        /// The number of tryptic termini (0, 1, or 2)
        num_tryptic_ends: usize,
        /// The MSGF spectral probability, if the results were rescored with MSGF
        spec_prob: Option<f64>,
    },
    /// X!Tandem
    XTandem {
        /// The hyperscore
        hyperscore: f64,
        /// The log10 of the peptide expectation value
        log_peptide_e_value: f64,
        /// The number of tryptic termini (0, 1, or 2)
        num_tryptic_ends: usize,
    },
    /// MSGF+ synopsis files
    MsgfPlus {
        /// The spectral expectation value
        spec_e_value: f64,
        /// The Q-value
        q_value: f64,
        /// The de novo score
        de_novo_score: f64,
        /// The number of tryptic termini (0, 1, or 2)
        num_tryptic_ends: usize,
    },
    /// mzIdentML files written by MSGF+
    MzIdentMl {
        /// The spectral expectation value
        spec_e_value: f64,
        /// The Q-value
        q_value: f64,
        /// The de novo score
        de_novo_score: f64,
        /// The number of tryptic termini (0, 1, or 2)
        num_tryptic_ends: usize,
    },
    /// MSAlign (top-down)
    MsAlign {
        /// The expectation value
        e_value: f64,
        /// The P-value
        p_value: f64,
        /// The false discovery rate
        fdr: f64,
    },
}

impl ToolScores {
    /// The tool that generated these scores
    pub const fn tool(&self) -> LcmsIdentificationTool {
        match self {
            Self::Sequest { .. } => LcmsIdentificationTool::Sequest,
            Self::XTandem { .. } => LcmsIdentificationTool::XTandem,
            Self::MsgfPlus { .. } => LcmsIdentificationTool::MsgfPlus,
            Self::MzIdentMl { .. } => LcmsIdentificationTool::MzIdentMl,
            Self::MsAlign { .. } => LcmsIdentificationTool::MsAlign,
        }
    }

    /// The number of tryptic termini, not reported by MSAlign
    pub const fn num_tryptic_ends(&self) -> Option<usize> {
        match self {
            Self::Sequest {
                num_tryptic_ends, ..
            }
            | Self::XTandem {
                num_tryptic_ends, ..
            }
            | Self::MsgfPlus {
                num_tryptic_ends, ..
            }
            | Self::MzIdentMl {
                num_tryptic_ends, ..
            } => Some(*num_tryptic_ends),
            Self::MsAlign { .. } => None,
        }
    }
}

/// How specific the enzymatic cleavage at both ends of a peptide is
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum CleavageState {
    /// Not reported
    #[default]
    Unknown,
    /// Neither end is a specific cleavage
    NonSpecific,
    /// One end is a specific cleavage
    Partial,
    /// Both ends are specific cleavages
    Full,
}

/// Whether a peptide lies at the terminus of its protein
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum TerminusState {
    /// Inside the protein
    #[default]
    None,
    /// At the N terminus
    ProteinNTerminus,
    /// At the C terminus
    ProteinCTerminus,
    /// Spans the whole protein
    ProteinNAndCTerminus,
}

/// The location of a peptide in one of the proteins it maps to
#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ProteinInformation {
    /// The protein name (accession) as reported
    pub protein_name: String,
    /// The cleavage state of the peptide in this protein
    pub cleavage_state: CleavageState,
    /// The terminus state of the peptide in this protein
    pub terminus_state: TerminusState,
    /// The first residue of the peptide in the protein (1-based)
    pub residue_start: usize,
    /// The last residue of the peptide in the protein (1-based, inclusive)
    pub residue_end: usize,
}

/// A single identification of a peptide (or proteoform) in a single scan of a single dataset.
///
/// The links to the owning dataset and consensus target are stored as plain indices, the
/// [`TargetDatabase`](crate::TargetDatabase) owns all evidence through its targets.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Evidence {
    /// The database wide id, assigned when the evidence is clustered (dense from 1)
    pub id: Option<usize>,
    /// The id of the consensus target this evidence belongs to
    pub parent: Option<usize>,
    /// The index of the dataset this evidence came from
    pub data_set: Option<usize>,
    /// The id of the result line in the identification file
    pub analysis_id: usize,
    /// The peptide sequence as reported, including flanking residues and modification symbols
    pub sequence: String,
    /// The bare amino acid sequence
    pub clean_peptide: String,
    /// The modifications as a single description, empty if unmodified
    pub modification_description: String,
    /// The number of modifications
    pub modification_count: usize,
    /// The precursor charge
    pub charge: isize,
    /// The scan number
    pub scan: usize,
    /// The observed m/z
    pub mz: f64,
    /// The observed monoisotopic mass (Da), corrected by the alignment in top-down workflows
    pub monoisotopic_mass: f64,
    /// The theoretical monoisotopic mass (Da) of the identification
    pub theoretical_monoisotopic_mass: f64,
    /// The number of proteins this peptide maps to
    pub multi_protein_count: usize,
    /// The proteins this peptide maps to, as far as reported by the tool
    pub proteins: Vec<ProteinInformation>,
    /// The observed normalised elution time, corrected by the alignment
    pub observed_net: f64,
    /// The predicted normalised elution time
    pub predicted_net: f64,
    /// The scores of the identification tool
    pub scores: ToolScores,
}

impl Evidence {
    /// Create a new unlinked evidence, all masses and times are zero and can be set afterwards
    pub fn new(
        clean_peptide: impl Into<String>,
        charge: isize,
        scan: usize,
        scores: ToolScores,
    ) -> Self {
        let clean_peptide = clean_peptide.into();
        Self {
            id: None,
            parent: None,
            data_set: None,
            analysis_id: 0,
            sequence: clean_peptide.clone(),
            clean_peptide,
            modification_description: String::new(),
            modification_count: 0,
            charge,
            scan,
            mz: 0.0,
            monoisotopic_mass: 0.0,
            theoretical_monoisotopic_mass: 0.0,
            multi_protein_count: 1,
            proteins: Vec::new(),
            observed_net: 0.0,
            predicted_net: 0.0,
            scores,
        }
    }

    /// The identity of the identification: clean sequence, charge, and modifications
    pub fn key(&self) -> (&str, isize, &str) {
        (
            &self.clean_peptide,
            self.charge,
            &self.modification_description,
        )
    }

    /// The identity of the peptide regardless of charge: clean sequence and modifications
    pub fn peptide_key(&self) -> (&str, &str) {
        (&self.clean_peptide, &self.modification_description)
    }

    /// The tool that identified this evidence
    pub const fn tool(&self) -> LcmsIdentificationTool {
        self.scores.tool()
    }

    /// The observed minus the theoretical monoisotopic mass in Dalton
    pub fn mass_error(&self) -> f64 {
        self.monoisotopic_mass - self.theoretical_monoisotopic_mass
    }

    /// The mass error in ppm, zero if the theoretical mass is not known
    pub fn mass_error_ppm(&self) -> f64 {
        if self.theoretical_monoisotopic_mass == 0.0 {
            0.0
        } else {
            self.mass_error() / self.theoretical_monoisotopic_mass * 1e6
        }
    }

    /// The key evidence and alignment residuals are sorted on before being paired up
    pub fn scan_key(&self) -> (usize, usize) {
        (self.scan, self.id.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        let scores = ToolScores::MsAlign {
            e_value: 1e-10,
            p_value: 1e-12,
            fdr: 0.0,
        };
        let mut a = Evidence::new("PEPTIDE", 2, 10, scores);
        let mut b = Evidence::new("PEPTIDE", 3, 12, scores);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.peptide_key(), b.peptide_key());
        b.modification_description = "Oxidation@M".to_string();
        assert_ne!(a.peptide_key(), b.peptide_key());
        assert_eq!(a.tool(), LcmsIdentificationTool::MsAlign);
        assert_eq!(a.scores.num_tryptic_ends(), None);
        a.id = Some(4);
        assert_eq!(a.scan_key(), (10, 4));
    }

    #[test]
    fn mass_error() {
        let mut evidence = Evidence::new(
            "PEPTIDE",
            1,
            1,
            ToolScores::XTandem {
                hyperscore: 40.0,
                log_peptide_e_value: -5.0,
                num_tryptic_ends: 2,
            },
        );
        assert_eq!(evidence.mass_error_ppm(), 0.0);
        evidence.theoretical_monoisotopic_mass = 1000.0;
        evidence.monoisotopic_mass = 1000.01;
        assert!((evidence.mass_error() - 0.01).abs() < 1e-9);
        assert!((evidence.mass_error_ppm() - 10.0).abs() < 1e-6);
        assert_eq!(evidence.scores.num_tryptic_ends(), Some(2));
    }
}
