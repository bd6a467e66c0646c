#![doc = include_str!("../README.md")]

mod alignment;
mod cluster;
mod consensus;
mod data_set;
mod database;
mod error;
mod evidence;
mod filter;
mod observer;
mod options;
mod prediction;
mod processor;
mod tool;

pub use alignment::*;
pub use cluster::*;
pub use consensus::*;
pub use data_set::*;
pub use database::*;
pub use error::*;
pub use evidence::*;
pub use filter::*;
pub use observer::*;
pub use options::*;
pub use prediction::*;
pub use processor::*;
pub use tool::*;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::{
        AlignmentResult, ConsensusTarget, Evidence, LcmsDataSet, LcmsIdentificationTool,
        MtdbError, Options, ProcessObserver, Processor, TargetDatabase, TargetWorkflowType,
        ToolScores,
    };
}
