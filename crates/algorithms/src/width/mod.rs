//! Width measurement along the centerline

mod cross_section;
mod sampling;

pub use cross_section::{
    measure_cross_sections, CrossSection, CrossSectionParams, CrossSectionSet, SectionEnd,
    WidthInputs,
};
pub use sampling::{pixels_near_point, SampleStats, SegmentSampler};
