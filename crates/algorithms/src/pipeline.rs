//! End-to-end river width runs
//!
//! [`river_width`] chains every stage on one river mask:
//!
//! ```text
//! distance -> gradient -> candidates -> thinning
//!          -> clean (corners kept) -> clean (corners removed)
//!          -> orientation -> cross-sections
//! ```
//!
//! The coarse cleaning pass prunes long branches before corner removal can
//! split them; the fine pass then removes corners on the pruned line.
//! All parameters live in [`RiverWidthParams`], which has two presets.

use std::collections::BTreeMap;

use rivwidth_core::raster::Raster;
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::centerline::{
    centerline_candidates, clean_centerline, distance_gradient, distance_to_bank,
    orthogonal_angle, CleanParams, DistanceFieldParams, EndpointPolicy, GradientMethod,
};
use crate::morphology::{skeletonize, SkeletonizeParams, ThinningTemplates};
use crate::width::{measure_cross_sections, CrossSectionParams, CrossSectionSet, WidthInputs};

/// Every scalar parameter of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverWidthParams {
    /// Largest distance searched, in cells
    pub search_radius: usize,
    pub gradient_method: GradientMethod,
    /// Candidates have a gradient at most this large
    pub gradient_threshold: f64,
    pub thinning_iterations: usize,
    pub thinning_templates: ThinningTemplates,
    /// Longest branch pruned, in map units
    pub max_branch_length: f64,
    pub endpoint_policy: EndpointPolicy,
    /// Section half-length as a multiple of the distance to the bank
    pub width_multiplier: f64,
    /// Radius sampled around each section end, in map units
    pub endpoint_buffer: f64,
    /// Strip half-width for segment sampling; bare line when `None`
    pub segment_buffer: Option<f64>,
    pub with_std_dev: bool,
}

impl Default for RiverWidthParams {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiverWidthParams {
    /// Preset for unobstructed imagery
    pub fn standard() -> Self {
        Self {
            search_radius: 256,
            gradient_method: GradientMethod::WeightedSobel,
            gradient_threshold: 0.9,
            thinning_iterations: 2,
            thinning_templates: ThinningTemplates::Standard,
            max_branch_length: 300.0,
            endpoint_policy: EndpointPolicy::RemoveExposed,
            width_multiplier: 1.5,
            endpoint_buffer: 30.0,
            segment_buffer: None,
            with_std_dev: false,
        }
    }

    /// Preset for imagery with cloud and quality flags: longer pruning,
    /// shorter sections sampled over a strip, spread reported
    pub fn cloud_aware() -> Self {
        Self {
            max_branch_length: 500.0,
            endpoint_policy: EndpointPolicy::KeepForkTips,
            width_multiplier: 1.3,
            segment_buffer: Some(30.0),
            with_std_dev: true,
            ..Self::standard()
        }
    }

    pub fn distance_params(&self) -> DistanceFieldParams {
        DistanceFieldParams {
            search_radius: self.search_radius,
        }
    }

    pub fn skeletonize_params(&self) -> SkeletonizeParams {
        SkeletonizeParams {
            iterations: self.thinning_iterations,
            templates: self.thinning_templates,
        }
    }

    pub fn clean_params(&self, remove_corners: bool) -> CleanParams {
        CleanParams {
            max_branch_length: self.max_branch_length,
            remove_corners,
            endpoint_policy: self.endpoint_policy,
        }
    }

    pub fn cross_section_params(&self) -> CrossSectionParams {
        CrossSectionParams {
            width_multiplier: self.width_multiplier,
            endpoint_buffer: self.endpoint_buffer,
            segment_buffer: self.segment_buffer,
            with_std_dev: self.with_std_dev,
        }
    }

    /// Check every parameter before any stage runs
    pub fn validate(&self) -> Result<()> {
        self.distance_params().validate()?;
        if !(self.gradient_threshold.is_finite() && self.gradient_threshold >= 0.0) {
            return Err(Error::invalid_parameter(
                "gradient_threshold",
                self.gradient_threshold,
                "must be finite and non-negative",
            ));
        }
        self.skeletonize_params().validate()?;
        self.clean_params(true).validate()?;
        self.cross_section_params().validate()
    }
}

/// Rasters for one run, all on the river mask's grid
#[derive(Debug, Clone)]
pub struct RiverInputs {
    pub river_mask: Raster<u8>,
    /// Water counted towards the width; the river mask when absent
    pub channel_mask: Option<Raster<u8>>,
    /// Processed area; the whole grid when absent
    pub region: Option<Raster<u8>>,
    /// Named quality rasters averaged along each section
    pub flags: BTreeMap<String, Raster<f64>>,
}

impl RiverInputs {
    pub fn new(river_mask: Raster<u8>) -> Self {
        Self {
            river_mask,
            channel_mask: None,
            region: None,
            flags: BTreeMap::new(),
        }
    }

    pub fn with_channel_mask(mut self, channel_mask: Raster<u8>) -> Self {
        self.channel_mask = Some(channel_mask);
        self
    }

    pub fn with_region(mut self, region: Raster<u8>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, flag: Raster<f64>) -> Self {
        self.flags.insert(name.into(), flag);
        self
    }

    /// Check that every optional raster shares the river mask's grid
    pub fn validate(&self) -> Result<()> {
        let base = &self.river_mask;
        if let Some(channel) = &self.channel_mask {
            base.ensure_same_grid(channel)?;
        }
        if let Some(region) = &self.region {
            base.ensure_same_grid(region)?;
        }
        for flag in self.flags.values() {
            base.ensure_same_grid(flag)?;
        }
        Ok(())
    }
}

/// Intermediate and final rasters of centerline extraction
#[derive(Debug, Clone)]
pub struct CenterlineProducts {
    pub distance: Raster<f64>,
    pub gradient: Raster<f64>,
    pub candidates: Raster<u8>,
    /// Thinned candidates
    pub raw: Raster<u8>,
    /// After pruning with corners kept
    pub coarse: Raster<u8>,
    /// After pruning with corners removed
    pub centerline: Raster<u8>,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct RiverWidthOutput {
    pub products: CenterlineProducts,
    pub orientation: Raster<f64>,
    pub sections: CrossSectionSet,
}

/// Distance field through fine cleaning
pub fn extract_centerline(
    river_mask: &Raster<u8>,
    params: &RiverWidthParams,
) -> Result<CenterlineProducts> {
    params.validate()?;

    let distance = distance_to_bank(river_mask, params.distance_params())?;
    let gradient = distance_gradient(&distance, params.gradient_method)?;
    let candidates = centerline_candidates(river_mask, &gradient, params.gradient_threshold)?;
    debug!(
        river = river_mask.count_set(),
        candidates = candidates.count_set(),
        "centerline candidates"
    );

    let raw = skeletonize(&candidates, params.skeletonize_params())?;
    let coarse = clean_centerline(&raw, params.clean_params(false))?;
    let centerline = clean_centerline(&coarse, params.clean_params(true))?;

    Ok(CenterlineProducts {
        distance,
        gradient,
        candidates,
        raw,
        coarse,
        centerline,
    })
}

/// Run the whole pipeline on one input
pub fn river_width(inputs: &RiverInputs, params: &RiverWidthParams) -> Result<RiverWidthOutput> {
    let (rows, cols) = inputs.river_mask.shape();
    let span = info_span!("river_width", rows, cols);
    let _guard = span.enter();

    inputs.validate()?;
    let products = extract_centerline(&inputs.river_mask, params)?;
    let orientation = orthogonal_angle(&products.centerline)?;

    let width_inputs = WidthInputs {
        centerline: &products.centerline,
        orientation: &orientation,
        distance: &products.distance,
        river_mask: &inputs.river_mask,
        channel_mask: inputs.channel_mask.as_ref().unwrap_or(&inputs.river_mask),
        region: inputs.region.as_ref(),
        flags: &inputs.flags,
    };
    let sections = measure_cross_sections(&width_inputs, params.cross_section_params())?;

    info!(
        centerline = products.centerline.count_set(),
        sections = sections.len(),
        clean = sections.clean().count(),
        undefined_angle = sections.undefined_angle,
        "river width run finished"
    );

    Ok(RiverWidthOutput {
        products,
        orientation,
        sections,
    })
}

/// Whole-pipeline algorithm
#[derive(Debug, Clone, Default)]
pub struct RiverWidth;

impl Algorithm for RiverWidth {
    type Input = RiverInputs;
    type Output = RiverWidthOutput;
    type Params = RiverWidthParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "RiverWidth"
    }

    fn description(&self) -> &'static str {
        "Centerline extraction and cross-section widths from a river mask"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        river_width(&input, &params)
    }
}
