#![doc = include_str!("../README.md")]

mod error;
mod feature;
mod helper_functions;
mod regression;
mod warp;
mod warp_matrix;

pub use error::*;
pub use feature::*;
pub use helper_functions::{mean, ppm, standard_deviation};
pub use regression::*;
pub use warp::*;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::{
        AlignError, AlignFeature, LcWarp, RegressionResult, RegressionType, Residual,
        WarpAlignment, WarpOptions,
    };
}
