//! Hit-or-miss transform on binary masks
//!
//! A template fixes some cells of the 3x3 window to foreground (`Hit`), some
//! to background (`Miss`) and leaves the rest free (`Any`). A pixel matches
//! when every hit offset is set and every miss offset is unset. Offsets that
//! fall beyond the raster edge read as background.

use ndarray::{Array2, Zip};
use crate::maybe_rayon::*;
use rivwidth_core::raster::Raster;
use rivwidth_core::Result;

/// Requirement a template places on one cell of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Don't care
    Any,
    /// Must be set
    Hit,
    /// Must be unset
    Miss,
}

/// A 3x3 hit-or-miss template reduced to its hit and miss offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMissTemplate {
    hits: Vec<(isize, isize)>,
    misses: Vec<(isize, isize)>,
}

impl HitMissTemplate {
    /// Build a template from a row-major 3x3 grid centered on the pixel
    pub fn from_grid(grid: [[Probe; 3]; 3]) -> Self {
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for (r, row) in grid.iter().enumerate() {
            for (c, probe) in row.iter().enumerate() {
                let offset = (r as isize - 1, c as isize - 1);
                match probe {
                    Probe::Hit => hits.push(offset),
                    Probe::Miss => misses.push(offset),
                    Probe::Any => {}
                }
            }
        }
        Self { hits, misses }
    }

    /// The template turned 90 degrees clockwise
    pub fn rotated_cw(&self) -> Self {
        let turn = |&(dr, dc): &(isize, isize)| (dc, -dr);
        Self {
            hits: self.hits.iter().map(turn).collect(),
            misses: self.misses.iter().map(turn).collect(),
        }
    }

    /// The template at 0, 90, 180 and 270 degrees clockwise
    pub fn rotations(&self) -> [HitMissTemplate; 4] {
        let r90 = self.rotated_cw();
        let r180 = r90.rotated_cw();
        let r270 = r180.rotated_cw();
        [self.clone(), r90, r180, r270]
    }

    /// Offsets that must be set
    pub fn hits(&self) -> &[(isize, isize)] {
        &self.hits
    }

    /// Offsets that must be unset
    pub fn misses(&self) -> &[(isize, isize)] {
        &self.misses
    }

    /// Whether the template matches at (row, col)
    pub fn matches(&self, mask: &Raster<u8>, row: usize, col: usize) -> bool {
        self.hits
            .iter()
            .all(|&(dr, dc)| mask.is_set_offset(row, col, dr, dc))
            && self
                .misses
                .iter()
                .all(|&(dr, dc)| !mask.is_set_offset(row, col, dr, dc))
    }
}

/// Mask of every pixel where `template` matches
pub fn hit_or_miss(mask: &Raster<u8>, template: &HitMissTemplate) -> Result<Raster<u8>> {
    let (rows, cols) = mask.shape();

    let output_data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| u8::from(template.matches(mask, row, col)))
                .collect::<Vec<u8>>()
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)?;
    mask.derive(data, Some(0))
}

/// Cells set in `mask` and not in `remove`
pub fn subtract(mask: &Raster<u8>, remove: &Raster<u8>) -> Result<Raster<u8>> {
    mask.ensure_same_grid(remove)?;
    let data = Zip::from(mask.data())
        .and(remove.data())
        .map_collect(|&m, &x| u8::from(m != 0 && x == 0));
    mask.derive(data, Some(0))
}

/// Cells set in either mask
pub fn union(a: &Raster<u8>, b: &Raster<u8>) -> Result<Raster<u8>> {
    a.ensure_same_grid(b)?;
    let data = Zip::from(a.data())
        .and(b.data())
        .map_collect(|&x, &y| u8::from(x != 0 || y != 0));
    a.derive(data, Some(0))
}
