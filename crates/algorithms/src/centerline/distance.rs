//! Distance-to-bank field
//!
//! The bank is traced as a thin outline just outside the river: the ring
//! between the mask dilated twice and the mask dilated once. Every pixel of
//! the twice-dilated mask then gets its Euclidean distance to the nearest
//! outline pixel, in map units.
//!
//! Distances are exact (separable lower-envelope transform, Felzenszwalb &
//! Huttenlocher 2012). Pixels farther than `search_radius` cells from any
//! outline pixel are masked, as are pixels outside the dilated mask.

use ndarray::Array2;
use crate::maybe_rayon::*;
use rivwidth_core::raster::Raster;
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::morphology::{dilate_mask, subtract, StructuringElement};

/// Stand-in for infinity that keeps envelope intersections finite
const FAR: f64 = 1e20;

/// Parameters for the distance field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceFieldParams {
    /// Largest distance searched, in cells
    pub search_radius: usize,
}

impl Default for DistanceFieldParams {
    fn default() -> Self {
        Self { search_radius: 256 }
    }
}

impl DistanceFieldParams {
    pub fn validate(&self) -> Result<()> {
        if self.search_radius == 0 {
            return Err(Error::invalid_parameter(
                "search_radius",
                self.search_radius,
                "must be at least one cell",
            ));
        }
        Ok(())
    }
}

/// Distance field algorithm
#[derive(Debug, Clone, Default)]
pub struct DistanceField;

impl Algorithm for DistanceField {
    type Input = Raster<u8>;
    type Output = Raster<f64>;
    type Params = DistanceFieldParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DistanceField"
    }

    fn description(&self) -> &'static str {
        "Distance from river pixels to the nearest bank outline, in map units"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        distance_to_bank(&input, params)
    }
}

/// Outline ring around the river: dilated twice minus dilated once
pub fn bank_outline(river_mask: &Raster<u8>) -> Result<Raster<u8>> {
    let (once, twice) = dilations(river_mask)?;
    subtract(&twice, &once)
}

fn dilations(river_mask: &Raster<u8>) -> Result<(Raster<u8>, Raster<u8>)> {
    let disk = StructuringElement::default();
    let once = dilate_mask(river_mask, &disk, 1)?;
    let twice = dilate_mask(&once, &disk, 1)?;
    Ok((once, twice))
}

/// Distance from each pixel to the bank outline, in map units.
///
/// An empty mask gives an all-NaN raster.
pub fn distance_to_bank(river_mask: &Raster<u8>, params: DistanceFieldParams) -> Result<Raster<f64>> {
    params.validate()?;
    let scale = river_mask.cell_size();
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::invalid_parameter(
            "cell_size",
            scale,
            "raster cell size must be positive",
        ));
    }

    let (rows, cols) = river_mask.shape();
    let (once, twice) = dilations(river_mask)?;
    let outline = subtract(&twice, &once)?;

    let squared = squared_distance_transform(&outline)?;
    let radius = params.search_radius as f64;

    let data = Array2::from_shape_fn((rows, cols), |(r, c)| {
        let d = squared[(r, c)].sqrt();
        if twice.is_set(r, c) && d <= radius {
            d * scale
        } else {
            f64::NAN
        }
    });

    let output = river_mask.derive(data, Some(f64::NAN))?;
    debug!(
        river = river_mask.count_set(),
        outline = outline.count_set(),
        defined = output.valid_count(),
        "distance field"
    );
    Ok(output)
}

/// Squared distance in cells to the nearest set pixel of `features`.
///
/// Cells with no feature on the grid hold a value of at least `FAR`.
fn squared_distance_transform(features: &Raster<u8>) -> Result<Array2<f64>> {
    let (rows, cols) = features.shape();

    let by_column: Vec<Vec<f64>> = (0..cols)
        .into_par_iter()
        .map(|c| {
            let f: Vec<f64> = (0..rows)
                .map(|r| if features.is_set(r, c) { 0.0 } else { FAR })
                .collect();
            lower_envelope(&f)
        })
        .collect();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|r| {
            let f: Vec<f64> = (0..cols).map(|c| by_column[c][r]).collect();
            lower_envelope(&f)
        })
        .collect();

    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

/// One-dimensional squared distance transform of a sampled function
fn lower_envelope(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut d = vec![0.0; n];
    if n == 0 {
        return d;
    }

    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *out = dq * dq + f[v[k]];
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rivwidth_core::GeoTransform;

    fn channel(rows: usize, cols: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> Raster<u8> {
        let mut m: Raster<u8> = Raster::new(rows, cols);
        m.set_transform(GeoTransform::north_up(0.0, rows as f64 * 30.0, 30.0));
        for r in r0..=r1 {
            for c in c0..=c1 {
                m.set(r, c, 1).unwrap();
            }
        }
        m
    }

    #[test]
    fn test_outline_is_two_cells_out() {
        let mask = channel(9, 9, 4, 4, 4, 4);
        let outline = bank_outline(&mask).unwrap();
        // 5x5 ring minus inner 3x3
        assert_eq!(outline.count_set(), 16);
        assert!(outline.is_set(2, 2));
        assert!(!outline.is_set(3, 3));
        assert!(!outline.is_set(4, 4));
    }

    #[test]
    fn test_straight_channel_distances() {
        let mask = channel(17, 70, 7, 9, 10, 59);
        let dist = distance_to_bank(&mask, DistanceFieldParams::default()).unwrap();

        assert_relative_eq!(dist.get(8, 30).unwrap(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(dist.get(7, 30).unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(dist.get(9, 30).unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(dist.get(6, 30).unwrap(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(dist.get(5, 30).unwrap(), 0.0, epsilon = 1e-9);
        assert!(dist.get(4, 30).unwrap().is_nan(), "outside D2 must be masked");
        assert!(dist.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_diagonal_distance_is_euclidean() {
        let mask = channel(15, 15, 4, 10, 4, 10);
        let dist = distance_to_bank(&mask, DistanceFieldParams::default()).unwrap();
        // Center (7,7) is 5 cells from the outline rows/cols at 2 and 12
        assert_relative_eq!(dist.get(7, 7).unwrap(), 150.0, epsilon = 1e-9);
        // (4,4) is 2 cells from the outline row 2 and column 2
        assert_relative_eq!(dist.get(4, 4).unwrap(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_search_radius_masks_far_pixels() {
        let mask = channel(17, 70, 7, 9, 10, 59);
        let dist = distance_to_bank(&mask, DistanceFieldParams { search_radius: 2 }).unwrap();
        assert!(dist.get(8, 30).unwrap().is_nan());
        assert_relative_eq!(dist.get(7, 30).unwrap(), 60.0, epsilon = 1e-9);

        let bound = 2.0 * 30.0;
        for v in dist.data().iter().filter(|v| !v.is_nan()) {
            assert!(*v >= 0.0 && *v <= bound, "distance {} out of [0, {}]", v, bound);
        }
    }

    #[test]
    fn test_empty_mask_is_all_masked() {
        let empty: Raster<u8> = Raster::new(10, 10);
        let dist = DistanceField.execute_default(empty).unwrap();
        assert_eq!(dist.valid_count(), 0);
    }

    #[test]
    fn test_lower_envelope_matches_brute_force() {
        let f = [FAR, 0.0, FAR, FAR, FAR, 0.0, FAR];
        let d = lower_envelope(&f);
        assert_eq!(d, vec![1.0, 0.0, 1.0, 4.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_invalid_params() {
        let mask = channel(5, 5, 2, 2, 2, 2);
        assert!(distance_to_bank(&mask, DistanceFieldParams { search_radius: 0 }).is_err());

        let mut flat = mask.clone();
        flat.set_transform(GeoTransform::new(0.0, 0.0, 0.0, 0.0));
        assert!(distance_to_bank(&flat, DistanceFieldParams::default()).is_err());
    }
}
