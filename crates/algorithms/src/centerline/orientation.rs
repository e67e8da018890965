//! Orthogonal-to-flow angle along the centerline
//!
//! Each centerline pixel looks at the border of the 9x9 window around it,
//! four cells out. Every centerline pixel found there contributes its
//! tabulated bearing from the center (degrees counter-clockwise from east,
//! north up):
//!
//! - two contributors: the mean bearing, which for a path running through
//!   the pixel points across it
//! - one contributor (near a path end): the bearing plus 90 degrees
//! - none or more than two: undefined (NaN)

use ndarray::Array2;
use crate::maybe_rayon::*;
use rivwidth_core::raster::{Neighborhood, Raster};
use rivwidth_core::{Algorithm, Error, Result};
use tracing::debug;

/// Radius of the bearing ring, in cells
pub const RING_RADIUS: usize = 4;

/// Bearing of each 9x9 window cell from the center, in degrees.
///
/// Only the outer ring is used; inner cells are 0.
#[rustfmt::skip]
pub const ANGLE_KERNEL: [[f64; 9]; 9] = [
    [135.0, 126.9, 116.6, 104.0,  90.0,  76.0,  63.4,  53.1,  45.0],
    [143.1,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,  36.9],
    [153.4,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,  26.6],
    [166.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,  14.0],
    [180.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0],
    [194.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0, 346.0],
    [206.6,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0, 333.4],
    [216.9,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0,   0.0, 323.1],
    [225.0, 233.1, 243.4, 256.0, 270.0, 284.0, 296.6, 306.9, 315.0],
];

/// Orientation algorithm
#[derive(Debug, Clone, Default)]
pub struct OrientationEstimator;

impl Algorithm for OrientationEstimator {
    type Input = Raster<u8>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "OrientationEstimator"
    }

    fn description(&self) -> &'static str {
        "Cross-section bearing at every centerline pixel"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        orthogonal_angle(&input)
    }
}

/// Angle in [0, 360) at each centerline pixel, NaN elsewhere
pub fn orthogonal_angle(centerline: &Raster<u8>) -> Result<Raster<f64>> {
    let (rows, cols) = centerline.shape();
    let ring = Neighborhood::Ring(RING_RADIUS).offsets();
    let half = RING_RADIUS as isize;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if !centerline.is_set(row, col) {
                    continue;
                }

                let mut sum = 0.0;
                let mut count = 0usize;
                for &(dr, dc) in &ring {
                    if centerline.is_set_offset(row, col, dr, dc) {
                        sum += ANGLE_KERNEL[(dr + half) as usize][(dc + half) as usize];
                        count += 1;
                    }
                }

                *out = match count {
                    1 => (sum + 90.0).rem_euclid(360.0),
                    2 => (sum / 2.0).rem_euclid(360.0),
                    _ => f64::NAN,
                };
            }
            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)?;
    let output = centerline.derive(data, Some(f64::NAN))?;
    debug!(
        centerline = centerline.count_set(),
        defined = output.valid_count(),
        "orientation"
    );
    Ok(output)
}
