//! Binary morphology on masks
//!
//! - **Dilation**: grows a mask by a structuring element
//! - **Hit-or-miss**: matches 3x3 foreground/background templates
//! - **Template passes**: rotated template tables for endpoints, fork tips
//!   and corners
//! - **Thinning**: iterative hit-or-miss erosion to a one-pixel skeleton

mod dilate;
mod element;
mod hit_or_miss;
mod templates;
mod thinning;

pub use dilate::{dilate_mask, Dilate, DilateParams};
pub use element::StructuringElement;
pub use hit_or_miss::{hit_or_miss, subtract, union, HitMissTemplate, Probe};
pub use templates::{
    Sweep, TemplatePass, ThinningTemplates, CORNER, ENDPOINT, FORK_TIP, THIN_CORNER,
    THIN_CORNER_ALT, THIN_EDGE, THIN_EDGE_ALT,
};
pub use thinning::{skeletonize, Skeletonize, SkeletonizeParams};
