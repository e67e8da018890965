//! Gradient magnitude of the distance field
//!
//! The distance field rises towards the channel middle and flattens on the
//! medial axis, so a low gradient marks centerline candidates. Three
//! difference schemes are available; their thresholds are not
//! interchangeable because [`GradientMethod::ForwardBackward`] reports the
//! squared magnitude.

use ndarray::Array2;
use crate::maybe_rayon::*;
use rivwidth_core::raster::Raster;
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};

/// Finite-difference scheme for the gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMethod {
    /// `(f[c+1] - f[c-1]) / 2`, root of the sum of squares
    CentralDifference,
    /// Sobel-style 3x3 kernels weighted `[1, 2, 1] / 8`, root of the sum of squares
    #[default]
    WeightedSobel,
    /// Mean of forward and backward differences, squared magnitude
    ForwardBackward,
}

impl GradientMethod {
    /// Whether this method reports `dx² + dy²` rather than its root
    pub fn is_squared(&self) -> bool {
        matches!(self, GradientMethod::ForwardBackward)
    }

    /// Window offsets the kernel reads
    fn footprint(&self) -> &'static [(isize, isize)] {
        const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const WINDOW: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            GradientMethod::CentralDifference | GradientMethod::ForwardBackward => &CROSS,
            GradientMethod::WeightedSobel => &WINDOW,
        }
    }

    /// (dx, dy) from a 3x3 window `w[row][col]`, in field units per cell
    fn partials(&self, w: &[[f64; 3]; 3]) -> (f64, f64) {
        match self {
            GradientMethod::CentralDifference | GradientMethod::ForwardBackward => {
                ((w[1][2] - w[1][0]) / 2.0, (w[2][1] - w[0][1]) / 2.0)
            }
            GradientMethod::WeightedSobel => {
                let dx = ((w[0][2] + 2.0 * w[1][2] + w[2][2]) - (w[0][0] + 2.0 * w[1][0] + w[2][0]))
                    / 8.0;
                let dy = ((w[2][0] + 2.0 * w[2][1] + w[2][2]) - (w[0][0] + 2.0 * w[0][1] + w[0][2]))
                    / 8.0;
                (dx, dy)
            }
        }
    }

    fn magnitude(&self, dx: f64, dy: f64, scale: f64) -> f64 {
        let squared = (dx * dx + dy * dy) / (scale * scale);
        if self.is_squared() {
            squared
        } else {
            squared.sqrt()
        }
    }
}

/// Parameters for the gradient field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradientParams {
    pub method: GradientMethod,
}

/// Gradient field algorithm
#[derive(Debug, Clone, Default)]
pub struct DistanceGradient;

impl Algorithm for DistanceGradient {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = GradientParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DistanceGradient"
    }

    fn description(&self) -> &'static str {
        "Gradient magnitude of a distance field"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        distance_gradient(&input, params.method)
    }
}

/// Gradient magnitude of `distance`, unitless (map units per map unit).
///
/// A pixel is NaN when any cell its kernel reads is NaN or off the grid.
pub fn distance_gradient(distance: &Raster<f64>, method: GradientMethod) -> Result<Raster<f64>> {
    let scale = distance.cell_size();
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::invalid_parameter(
            "cell_size",
            scale,
            "raster cell size must be positive",
        ));
    }

    let (rows, cols) = distance.shape();
    let footprint = method.footprint();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            if row == 0 || row + 1 >= rows {
                return row_data;
            }

            for (col, out) in row_data.iter_mut().enumerate().take(cols.saturating_sub(1)).skip(1) {
                let center = unsafe { distance.get_unchecked(row, col) };
                if center.is_nan() {
                    continue;
                }

                let mut w = [[0.0f64; 3]; 3];
                let mut complete = true;
                for &(dr, dc) in footprint {
                    let r = (row as isize + dr) as usize;
                    let c = (col as isize + dc) as usize;
                    let v = unsafe { distance.get_unchecked(r, c) };
                    if v.is_nan() {
                        complete = false;
                        break;
                    }
                    w[(dr + 1) as usize][(dc + 1) as usize] = v;
                }

                if complete {
                    let (dx, dy) = method.partials(&w);
                    *out = method.magnitude(dx, dy, scale);
                }
            }

            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)?;
    distance.derive(data, Some(f64::NAN))
}
