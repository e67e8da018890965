//! Template tables for thinning and centerline cleanup
//!
//! Each pass owns its rotated templates, computed once when the pass is
//! built, and a sweep order that says how the rotations combine.

use rivwidth_core::raster::Raster;
use rivwidth_core::Result;
use serde::{Deserialize, Serialize};

use super::hit_or_miss::{hit_or_miss, subtract, union, HitMissTemplate, Probe};

const X: Probe = Probe::Any;
const H: Probe = Probe::Hit;
const M: Probe = Probe::Miss;

/// Thinning pair A, edge template
pub const THIN_EDGE: [[Probe; 3]; 3] = [[M, M, M], [X, H, X], [H, H, H]];
/// Thinning pair A, alternate family
pub const THIN_EDGE_ALT: [[Probe; 3]; 3] = [[M, M, M], [X, H, X], [X, H, X]];
/// Thinning pair B, corner template
pub const THIN_CORNER: [[Probe; 3]; 3] = [[M, M, X], [M, H, H], [X, H, X]];
/// Thinning pair B, alternate family
pub const THIN_CORNER_ALT: [[Probe; 3]; 3] = [[M, M, X], [M, H, H], [X, H, H]];

/// A path end: every neighbor sits in the top row of the window
pub const ENDPOINT: [[Probe; 3]; 3] = [[X, X, X], [M, H, M], [M, M, M]];
/// Tip sitting between the two prongs of a fork
pub const FORK_TIP: [[Probe; 3]; 3] = [[H, M, H], [M, H, M], [M, M, M]];
/// Elbow pixel of a path that turns through a right angle
pub const CORNER: [[Probe; 3]; 3] = [[M, M, X], [M, H, H], [X, H, X]];

/// Template family used by the skeletonizer
///
/// The two families differ in a single cell of each pair, which changes
/// how aggressively pixels touching the mask boundary are eroded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThinningTemplates {
    #[default]
    Standard,
    Alternate,
}

impl ThinningTemplates {
    fn grids(self) -> ([[Probe; 3]; 3], [[Probe; 3]; 3]) {
        match self {
            ThinningTemplates::Standard => (THIN_EDGE, THIN_CORNER),
            ThinningTemplates::Alternate => (THIN_EDGE_ALT, THIN_CORNER_ALT),
        }
    }
}

/// How the templates of a pass are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Every template reads the same input; matches are merged
    Union,
    /// Each template reads the result of the previous removal
    Sequential,
}

/// An ordered list of templates and the way they are swept
#[derive(Debug, Clone)]
pub struct TemplatePass {
    templates: Vec<HitMissTemplate>,
    sweep: Sweep,
}

impl TemplatePass {
    /// All four rotations of `grid`, swept as given
    pub fn rotated(grid: [[Probe; 3]; 3], sweep: Sweep) -> Self {
        let base = HitMissTemplate::from_grid(grid);
        Self {
            templates: base.rotations().to_vec(),
            sweep,
        }
    }

    /// Endpoint detection, union over rotations
    pub fn endpoints() -> Self {
        Self::rotated(ENDPOINT, Sweep::Union)
    }

    /// Fork tip detection, union over rotations
    pub fn fork_tips() -> Self {
        Self::rotated(FORK_TIP, Sweep::Union)
    }

    /// Corner removal, one rotation after the other
    pub fn corners() -> Self {
        Self::rotated(CORNER, Sweep::Sequential)
    }

    /// One thinning iteration: for each rotation, pair A then pair B
    pub fn thinning(family: ThinningTemplates) -> Self {
        let (a, b) = family.grids();
        let a = HitMissTemplate::from_grid(a).rotations();
        let b = HitMissTemplate::from_grid(b).rotations();
        let templates = a
            .into_iter()
            .zip(b)
            .flat_map(|(ta, tb)| [ta, tb])
            .collect();
        Self {
            templates,
            sweep: Sweep::Sequential,
        }
    }

    /// Templates in application order
    pub fn templates(&self) -> &[HitMissTemplate] {
        &self.templates
    }

    /// Pixels of `mask` this pass would remove
    pub fn detect(&self, mask: &Raster<u8>) -> Result<Raster<u8>> {
        match self.sweep {
            Sweep::Union => {
                let mut found = Raster::<u8>::empty_mask_like(mask);
                for template in &self.templates {
                    found = union(&found, &hit_or_miss(mask, template)?)?;
                }
                Ok(found)
            }
            Sweep::Sequential => subtract(mask, &self.remove(mask)?),
        }
    }

    /// `mask` with this pass's matches removed
    pub fn remove(&self, mask: &Raster<u8>) -> Result<Raster<u8>> {
        match self.sweep {
            Sweep::Union => subtract(mask, &self.detect(mask)?),
            Sweep::Sequential => {
                let mut current = mask.clone();
                for template in &self.templates {
                    let hits = hit_or_miss(&current, template)?;
                    current = subtract(&current, &hits)?;
                }
                Ok(current)
            }
        }
    }
}
