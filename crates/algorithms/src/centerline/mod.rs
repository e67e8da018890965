//! Centerline extraction
//!
//! Distance field, gradient, candidate selection, branch pruning and
//! orientation: everything between a river mask and a clean one-pixel
//! centerline with a cross-section bearing at each pixel.

mod branch_cost;
mod candidates;
mod clean;
mod distance;
mod gradient;
mod orientation;

pub use branch_cost::{branch_cost, BranchCost};
pub use candidates::centerline_candidates;
pub use clean::{
    classify_nodes, clean_centerline, clean_pass, node_count, prune_branches, CenterlineCleaner,
    CleanParams, EndpointPolicy, NodeClasses,
};
pub use distance::{bank_outline, distance_to_bank, DistanceField, DistanceFieldParams};
pub use gradient::{distance_gradient, DistanceGradient, GradientMethod, GradientParams};
pub use orientation::{orthogonal_angle, OrientationEstimator, ANGLE_KERNEL, RING_RADIUS};
