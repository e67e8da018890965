//! Hit-or-miss thinning
//!
//! Each iteration sweeps the four rotations in order, removing the matches
//! of thinning pair A and then pair B at every rotation. The sweep is
//! strictly sequential: each removal reads the mask left by the previous one.

use rivwidth_core::raster::Raster;
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::templates::{TemplatePass, ThinningTemplates};

/// Parameters for skeletonization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkeletonizeParams {
    /// Number of full thinning iterations
    pub iterations: usize,
    /// Template family
    pub templates: ThinningTemplates,
}

impl Default for SkeletonizeParams {
    fn default() -> Self {
        Self {
            iterations: 2,
            templates: ThinningTemplates::Standard,
        }
    }
}

impl SkeletonizeParams {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_parameter(
                "iterations",
                self.iterations,
                "thinning needs at least one iteration",
            ));
        }
        Ok(())
    }
}

/// Skeletonizer algorithm
#[derive(Debug, Clone, Default)]
pub struct Skeletonize;

impl Algorithm for Skeletonize {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = SkeletonizeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Skeletonize"
    }

    fn description(&self) -> &'static str {
        "Iterative hit-or-miss thinning of a binary mask"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        skeletonize(&input, params)
    }
}

/// Thin `mask` towards its one-pixel skeleton.
///
/// Components smaller than the templates may vanish entirely.
pub fn skeletonize(mask: &Raster<u8>, params: SkeletonizeParams) -> Result<Raster<u8>> {
    params.validate()?;

    let pass = TemplatePass::thinning(params.templates);
    let mut current = mask.clone();
    current.set_nodata(Some(0));

    for iteration in 0..params.iterations {
        let before = current.count_set();
        current = pass.remove(&current)?;
        debug!(
            iteration,
            before,
            after = current.count_set(),
            "thinning iteration"
        );
    }

    Ok(current)
}
