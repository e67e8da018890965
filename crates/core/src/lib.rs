//! # RivWidth Core
//!
//! Core raster types shared by every stage of the river centerline and
//! width pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid (binary masks are `Raster<u8>`)
//! - `GeoTransform`: affine pixel <-> map coordinate conversion
//! - `CRS`: coordinate reference system identity, used for grid checks
//! - `Neighborhood`: offset patterns for window and ring operations
//! - The `Algorithm` trait implemented by single-input stages

pub mod crs;
pub mod error;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Neighborhood, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Common shape of a pipeline stage.
///
/// Stages are pure functions: the input is never mutated and the same
/// input and parameters always produce the same output.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
