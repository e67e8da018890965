//! # RivWidth Algorithms
//!
//! River centerline extraction and width measurement on binary masks.
//!
//! ## Modules
//!
//! - **morphology**: structuring elements, dilation, hit-or-miss templates, thinning
//! - **centerline**: distance field, gradient, candidates, branch pruning, orientation
//! - **width**: cross-section construction and raster sampling
//! - **pipeline**: parameter presets and end-to-end runs
//! - **batch**: many independent runs with a concurrency cap

pub(crate) mod maybe_rayon;

pub mod batch;
pub mod centerline;
pub mod morphology;
pub mod pipeline;
pub mod width;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::batch::{run_batch, ProcessingMode};
    pub use crate::centerline::{
        clean_centerline, distance_gradient, distance_to_bank, orthogonal_angle,
        CenterlineCleaner, CleanParams, DistanceField, DistanceFieldParams, DistanceGradient,
        EndpointPolicy, GradientMethod, OrientationEstimator,
    };
    pub use crate::morphology::{skeletonize, Skeletonize, SkeletonizeParams, ThinningTemplates};
    pub use crate::pipeline::{
        extract_centerline, river_width, CenterlineProducts, RiverInputs, RiverWidth,
        RiverWidthOutput, RiverWidthParams,
    };
    pub use crate::width::{
        measure_cross_sections, CrossSection, CrossSectionParams, CrossSectionSet, WidthInputs,
    };
    pub use rivwidth_core::prelude::*;
}
