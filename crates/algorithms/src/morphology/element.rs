//! Structuring element definitions for binary morphology
//!
//! Dilation uses a disk: a cell belongs to the element when its center is
//! within the radius. The bank outline uses radius 1.5 cells, which covers
//! the full 3x3 window.

use rivwidth_core::raster::Neighborhood;
use rivwidth_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Disk-shaped structuring element, radius in cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuringElement {
    pub radius: f64,
}

impl Default for StructuringElement {
    fn default() -> Self {
        Self::disk(1.5)
    }
}

impl StructuringElement {
    pub fn disk(radius: f64) -> Self {
        Self { radius }
    }

    /// Validate the structuring element, returning an error for invalid configurations
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 1.0 {
            return Err(Error::invalid_parameter(
                "radius",
                self.radius,
                "disk radius must be finite and at least 1",
            ));
        }
        Ok(())
    }

    /// Radius of the bounding window in cells
    pub fn window_radius(&self) -> usize {
        self.radius.floor().max(0.0) as usize
    }

    /// (dr, dc) offsets relative to the center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let limit = self.radius * self.radius;
        Neighborhood::Square(self.window_radius())
            .offsets()
            .into_iter()
            .filter(|&(dr, dc)| ((dr * dr + dc * dc) as f64) <= limit)
            .collect()
    }
}
