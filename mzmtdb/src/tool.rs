use std::path::Path;

use serde::{Deserialize, Serialize};

/// The identification tools whose results can be used to build a database
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum LcmsIdentificationTool {
    /// Sequest synopsis files
    #[default]
    Sequest,
    /// X!Tandem
    XTandem,
    /// MSGF+ synopsis files
    MsgfPlus,
    /// mzIdentML files written by MSGF+
    MzIdentMl,
    /// MSAlign, used for top-down data
    MsAlign,
}

impl LcmsIdentificationTool {
    /// All tools, in the order file names are matched against their suffixes
    pub const ALL: [Self; 5] = [
        Self::MsgfPlus,
        Self::MsAlign,
        Self::MzIdentMl,
        Self::XTandem,
        Self::Sequest,
    ];

    /// The end of the file name of the results of this tool, as written by the PHRP post processor
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Sequest => "_syn.txt",
            Self::XTandem => "_xt.txt",
            Self::MsgfPlus => "msgfdb_syn.txt",
            Self::MzIdentMl => "msgfplus.mzid",
            Self::MsAlign => "msalign_syn.txt",
        }
    }

    /// Determine the tool from the file name. The longer suffixes are checked first, so a MSGF+
    /// synopsis file is not mistaken for a Sequest one.
    pub fn from_file_name(path: impl AsRef<Path>) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_string_lossy().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tool| name.ends_with(tool.file_suffix()))
    }

    /// The name of the dataset stored at the given path: the file name without the tool suffix.
    /// If the file name does not end in the suffix the file stem is returned.
    pub fn dataset_name(self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let suffix = self.file_suffix();
        if name.to_lowercase().ends_with(suffix) && name.is_char_boundary(name.len() - suffix.len()) {
            name[..name.len() - suffix.len()]
                .trim_end_matches(['_', '.'])
                .to_string()
        } else {
            path.file_stem()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(name)
        }
    }

    /// If this tool identifies intact proteoforms instead of peptides
    pub const fn is_top_down(self) -> bool {
        matches!(self, Self::MsAlign)
    }
}

impl std::fmt::Display for LcmsIdentificationTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Sequest => "Sequest",
                Self::XTandem => "XTandem",
                Self::MsgfPlus => "MSGFPlus",
                Self::MzIdentMl => "MZIdentML",
                Self::MsAlign => "MSAlign",
            }
        )
    }
}

impl std::str::FromStr for LcmsIdentificationTool {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}
