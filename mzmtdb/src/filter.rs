use crate::{Evidence, LcmsIdentificationTool, Options, ToolScores};

/// Decides which evidence is trustworthy enough to be admitted into the database.
///
/// Every tool has its own policy, created with [`TargetFilter::new`]. Evidence with the scores
/// of another tool than the one the filter was created for is always filtered out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetFilter {
    /// Sequest thresholds
    Sequest {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Minimal XCorr for charge 1, 2, and 3 or higher
        min_xcorr: [f64; 3],
        /// Minimal DelCn2
        min_delta_cn2: f64,
        /// Maximal spectral probability
        max_spec_prob: f64,
        /// Minimal number of tryptic termini
        min_tryptic_ends: usize,
    },
    /// X!Tandem thresholds
    XTandem {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Maximal log10 E-value
        max_log_e_value: f64,
        /// Minimal number of tryptic termini
        min_tryptic_ends: usize,
    },
    /// MSGF+ thresholds, for both synopsis and mzIdentML files
    MsgfPlus {
        /// The tool these thresholds are used for
        tool: LcmsIdentificationTool,
        /// Maximal number of modifications
        max_modifications: usize,
        /// Maximal spectral E-value
        max_spec_e_value: f64,
        /// Maximal Q-value
        max_q_value: f64,
        /// Minimal number of tryptic termini
        min_tryptic_ends: usize,
    },
    /// MSAlign thresholds
    MsAlign {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Maximal E-value
        max_e_value: f64,
    },
}

impl TargetFilter {
    /// Create the filter for the given tool
    pub const fn new(tool: LcmsIdentificationTool, options: &Options) -> Self {
        let max_modifications = options.max_modifications_for_admission;
        match tool {
            LcmsIdentificationTool::Sequest => Self::Sequest {
                max_modifications,
                min_xcorr: options.min_xcorr,
                min_delta_cn2: options.min_delta_cn2,
                max_spec_prob: options.max_spec_prob,
                min_tryptic_ends: options.min_tryptic_ends,
            },
            LcmsIdentificationTool::XTandem => Self::XTandem {
                max_modifications,
                max_log_e_value: options.max_log_e_value,
                min_tryptic_ends: options.min_tryptic_ends,
            },
            LcmsIdentificationTool::MsgfPlus | LcmsIdentificationTool::MzIdentMl => {
                Self::MsgfPlus {
                    tool,
                    max_modifications,
                    max_spec_e_value: options.max_spec_e_value,
                    max_q_value: options.max_q_value,
                    min_tryptic_ends: options.min_tryptic_ends,
                }
            }
            LcmsIdentificationTool::MsAlign => Self::MsAlign {
                max_modifications,
                max_e_value: options.max_e_value,
            },
        }
    }

    /// Determine if the evidence should be filtered out, true means the evidence is rejected
    pub fn should_filter(&self, evidence: &Evidence) -> bool {
        match (*self, evidence.scores) {
            (
                Self::Sequest {
                    max_modifications,
                    min_xcorr,
                    min_delta_cn2,
                    max_spec_prob,
                    min_tryptic_ends,
                },
                ToolScores::Sequest {
                    xcorr,
                    delta_cn2,
                    spec_prob,
                    num_tryptic_ends,
                    ..
                },
            ) => {
                let min_xcorr = match evidence.charge {
                    ..=1 => min_xcorr[0],
                    2 => min_xcorr[1],
                    _ => min_xcorr[2],
                };
                evidence.modification_count > max_modifications
                    || xcorr < min_xcorr
                    || delta_cn2 < min_delta_cn2
                    || spec_prob.is_some_and(|p| p > max_spec_prob)
                    || num_tryptic_ends < min_tryptic_ends
            }
            (
                Self::XTandem {
                    max_modifications,
                    max_log_e_value,
                    min_tryptic_ends,
                },
                ToolScores::XTandem {
                    log_peptide_e_value,
                    num_tryptic_ends,
                    ..
                },
            ) => {
                evidence.modification_count > max_modifications
                    || log_peptide_e_value > max_log_e_value
                    || num_tryptic_ends < min_tryptic_ends
            }
            (
                Self::MsgfPlus {
                    tool,
                    max_modifications,
                    max_spec_e_value,
                    max_q_value,
                    min_tryptic_ends,
                },
                ToolScores::MsgfPlus {
                    spec_e_value,
                    q_value,
                    num_tryptic_ends,
                    ..
                }
                | ToolScores::MzIdentMl {
                    spec_e_value,
                    q_value,
                    num_tryptic_ends,
                    ..
                },
            ) => {
                evidence.tool() != tool
                    || evidence.modification_count > max_modifications
                    || spec_e_value > max_spec_e_value
                    || q_value > max_q_value
                    || num_tryptic_ends < min_tryptic_ends
            }
            (
                Self::MsAlign {
                    max_modifications,
                    max_e_value,
                },
                ToolScores::MsAlign { e_value, .. },
            ) => evidence.modification_count > max_modifications || e_value > max_e_value,
            _ => true,
        }
    }
}

/// Decides which admitted evidence is used to fit the alignment of its dataset.
///
/// Evidence that is filtered out here is still corrected with the fitted alignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlignmentFilter {
    /// Sequest: unmodified evidence with a high XCorr
    Sequest {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Minimal XCorr
        min_xcorr: f64,
    },
    /// X!Tandem: unmodified evidence with a low E-value
    XTandem {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Maximal log10 E-value
        max_log_e_value: f64,
    },
    /// MSGF+: unmodified evidence with a low Q-value
    MsgfPlus {
        /// Maximal number of modifications
        max_modifications: usize,
        /// Maximal Q-value
        max_q_value: f64,
    },
    /// MSAlign: only unmodified evidence
    MsAlign {
        /// Maximal number of modifications
        max_modifications: usize,
    },
}

impl AlignmentFilter {
    /// Create the alignment filter for the given tool
    pub const fn new(tool: LcmsIdentificationTool, options: &Options) -> Self {
        let max_modifications = options.max_modifications_for_alignment;
        match tool {
            LcmsIdentificationTool::Sequest => Self::Sequest {
                max_modifications,
                min_xcorr: options.min_xcorr_for_alignment,
            },
            LcmsIdentificationTool::XTandem => Self::XTandem {
                max_modifications,
                max_log_e_value: options.max_log_e_value_for_alignment,
            },
            LcmsIdentificationTool::MsgfPlus | LcmsIdentificationTool::MzIdentMl => {
                Self::MsgfPlus {
                    max_modifications,
                    max_q_value: options.max_q_value_for_alignment,
                }
            }
            LcmsIdentificationTool::MsAlign => Self::MsAlign { max_modifications },
        }
    }

    /// Determine if the evidence should not be used as alignment anchor
    pub fn should_filter(&self, evidence: &Evidence) -> bool {
        let max_modifications = match self {
            Self::Sequest {
                max_modifications, ..
            }
            | Self::XTandem {
                max_modifications, ..
            }
            | Self::MsgfPlus {
                max_modifications, ..
            }
            | Self::MsAlign { max_modifications } => *max_modifications,
        };
        if evidence.modification_count > max_modifications {
            return true;
        }
        match (*self, evidence.scores) {
            (Self::Sequest { min_xcorr, .. }, ToolScores::Sequest { xcorr, .. }) => {
                xcorr < min_xcorr
            }
            (
                Self::XTandem {
                    max_log_e_value, ..
                },
                ToolScores::XTandem {
                    log_peptide_e_value,
                    ..
                },
            ) => log_peptide_e_value > max_log_e_value,
            (
                Self::MsgfPlus { max_q_value, .. },
                ToolScores::MsgfPlus { q_value, .. } | ToolScores::MzIdentMl { q_value, .. },
            ) => q_value > max_q_value,
            (Self::MsAlign { .. }, ToolScores::MsAlign { .. }) => false,
            _ => true,
        }
    }
}
