//! Binary mask helpers
//!
//! Masks are `Raster<u8>` with 1 for present and 0 for absent. Any non-zero
//! value counts as present when reading. Cells off the grid are absent.

use ndarray::Array2;

use super::Raster;

impl Raster<u8> {
    /// Empty mask on the same grid as `other`
    pub fn empty_mask_like<U: super::RasterElement>(other: &Raster<U>) -> Raster<u8> {
        let (rows, cols) = other.shape();
        let mut mask: Raster<u8> = other.with_same_meta(rows, cols);
        mask.set_nodata(Some(0));
        mask
    }

    /// Mask on this grid from a boolean predicate per cell
    pub fn mask_from_fn<F>(&self, f: F) -> Raster<u8>
    where
        F: Fn(usize, usize) -> bool,
    {
        let (rows, cols) = self.shape();
        let data = Array2::from_shape_fn((rows, cols), |(r, c)| u8::from(f(r, c)));
        let mut mask: Raster<u8> = self.with_same_meta(rows, cols);
        *mask.data_mut() = data;
        mask.set_nodata(Some(0));
        mask
    }

    /// Whether (row, col) is set; off-grid cells are not
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.data().get((row, col)).is_some_and(|&v| v != 0)
    }

    /// Whether the cell at (row + dr, col + dc) is set; off-grid cells are not
    pub fn is_set_offset(&self, row: usize, col: usize, dr: isize, dc: isize) -> bool {
        self.get_offset(row, col, dr, dc).is_some_and(|v| v != 0)
    }

    /// Number of set cells
    pub fn count_set(&self) -> usize {
        self.data().iter().filter(|&&v| v != 0).count()
    }

    /// Set cells as (row, col), row-major
    pub fn set_pixels(&self) -> Vec<(usize, usize)> {
        self.data()
            .indexed_iter()
            .filter(|(_, v)| **v != 0)
            .map(|(idx, _)| idx)
            .collect()
    }
}
