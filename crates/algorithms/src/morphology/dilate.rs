//! Binary dilation
//!
//! Sets every cell whose structuring element neighborhood touches a set
//! cell. Cells beyond the raster edge are treated as unset, so dilation
//! never grows in from outside the grid.

use ndarray::Array2;
use crate::maybe_rayon::*;
use rivwidth_core::raster::Raster;
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};

use super::element::StructuringElement;

/// Parameters for binary dilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilateParams {
    /// Structuring element shape
    pub element: StructuringElement,
    /// Number of successive dilations
    pub iterations: usize,
}

impl Default for DilateParams {
    fn default() -> Self {
        Self {
            element: StructuringElement::default(),
            iterations: 1,
        }
    }
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Binary dilation of a mask by a structuring element"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dilate_mask(&input, &params.element, params.iterations)
    }
}

/// Dilate a binary mask `iterations` times.
///
/// Zero iterations returns a copy of the input.
pub fn dilate_mask(
    mask: &Raster<u8>,
    element: &StructuringElement,
    iterations: usize,
) -> Result<Raster<u8>> {
    element.validate()?;

    let offsets = element.offsets();
    let mut current = mask.clone();
    current.set_nodata(Some(0));

    for _ in 0..iterations {
        current = dilate_once(&current, &offsets)?;
    }

    Ok(current)
}

fn dilate_once(mask: &Raster<u8>, offsets: &[(isize, isize)]) -> Result<Raster<u8>> {
    let (rows, cols) = mask.shape();

    let output_data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let hit = offsets
                        .iter()
                        .any(|&(dr, dc)| mask.is_set_offset(row, col, dr, dc));
                    u8::from(hit)
                })
                .collect::<Vec<u8>>()
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)?;
    mask.derive(data, Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivwidth_core::GeoTransform;

    fn make_mask(rows: usize, cols: usize, set: &[(usize, usize)]) -> Raster<u8> {
        let mut r: Raster<u8> = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for &(row, col) in set {
            r.set(row, col, 1).unwrap();
        }
        r
    }

    #[test]
    fn test_single_pixel_grows_to_window() {
        let mask = make_mask(7, 7, &[(3, 3)]);
        let result = dilate_mask(&mask, &StructuringElement::default(), 1).unwrap();
        assert_eq!(result.count_set(), 9);
        assert!(result.is_set(2, 2));
        assert!(!result.is_set(1, 3));

        let twice = dilate_mask(&mask, &StructuringElement::default(), 2).unwrap();
        assert_eq!(twice.count_set(), 25);
    }

    #[test]
    fn test_edge_does_not_wrap() {
        let mask = make_mask(5, 5, &[(0, 0)]);
        let result = dilate_mask(&mask, &StructuringElement::default(), 1).unwrap();
        assert_eq!(result.count_set(), 4);
        assert!(!result.is_set(4, 4));
    }

    #[test]
    fn test_unit_disk_skips_diagonals() {
        let mask = make_mask(5, 5, &[(2, 2)]);
        let result = dilate_mask(&mask, &StructuringElement::disk(1.0), 1).unwrap();
        assert_eq!(result.count_set(), 5);
        assert!(!result.is_set(1, 1));
    }

    #[test]
    fn test_algorithm_trait() {
        let mask = make_mask(5, 5, &[(2, 2)]);
        let result = Dilate.execute_default(mask).unwrap();
        assert_eq!(result.count_set(), 9);
        assert_eq!(result.nodata(), Some(0));
    }
}
