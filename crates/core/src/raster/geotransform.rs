//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// River masks are expected north-up in a projected CRS with meter units,
/// so `pixel_height` is negative and the rotation terms are 0. Bearings
/// computed on the grid (counter-clockwise from east) then map directly to
/// map-space directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// North-up transform with square cells of `scale` map units
    pub fn north_up(origin_x: f64, origin_y: f64, scale: f64) -> Self {
        Self::new(origin_x, origin_y, scale, -scale)
    }

    /// Map coordinates of the center of pixel (col, row)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.fractional_to_geo(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map coordinates of a fractional pixel position.
    ///
    /// Integer positions are pixel corners; `+0.5` addresses the center.
    pub fn fractional_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Convert map coordinates to fractional pixel coordinates (col, row)
    ///
    /// Use `.floor()` to get the index of the containing pixel.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Get the cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Whether two transforms describe the same grid, up to rounding noise
    pub fn same_grid(&self, other: &GeoTransform) -> bool {
        let tol = 1e-9 * self.cell_size().max(1.0);
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }

    fn to_array(self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_center_roundtrip() {
        let gt = GeoTransform::north_up(500_000.0, 4_200_000.0, 30.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        assert_relative_eq!(x, 500_165.0, epsilon = 1e-9);
        assert_relative_eq!(y, 4_199_685.0, epsilon = 1e-9);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 5.5, epsilon = 1e-9);
        assert_relative_eq!(row, 10.5, epsilon = 1e-9);
    }

    #[test]
    fn test_north_is_up() {
        // Moving north in map space decreases the row
        let gt = GeoTransform::north_up(0.0, 300.0, 30.0);
        let (x, y) = gt.pixel_to_geo(3, 3);
        let (_, row) = gt.geo_to_pixel(x, y + 30.0);
        assert_relative_eq!(row, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_same_grid() {
        let a = GeoTransform::north_up(10.0, 20.0, 30.0);
        let b = GeoTransform::north_up(10.0 + 1e-12, 20.0, 30.0);
        let c = GeoTransform::north_up(40.0, 20.0, 30.0);
        assert!(a.same_grid(&b));
        assert!(!a.same_grid(&c));
    }
}
