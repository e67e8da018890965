//! Centerline candidates: river pixels where the distance field is flat

use ndarray::Array2;
use rivwidth_core::raster::Raster;
use rivwidth_core::{Error, Result};

/// River pixels whose gradient is defined and at most `threshold`.
///
/// The threshold must match the convention of the gradient method that
/// produced `gradient` (see `GradientMethod::is_squared`).
pub fn centerline_candidates(
    river_mask: &Raster<u8>,
    gradient: &Raster<f64>,
    threshold: f64,
) -> Result<Raster<u8>> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(Error::invalid_parameter(
            "gradient_threshold",
            threshold,
            "must be finite and non-negative",
        ));
    }
    river_mask.ensure_same_grid(gradient)?;

    let data = Array2::from_shape_fn(river_mask.shape(), |(r, c)| {
        let g = gradient.data()[(r, c)];
        u8::from(river_mask.is_set(r, c) && !g.is_nan() && g <= threshold)
    });
    river_mask.derive(data, Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_and_mask() {
        let river = Raster::from_vec(vec![1u8, 1, 1, 0], 2, 2).unwrap();
        let gradient = Raster::from_vec(vec![0.2, 1.5, f64::NAN, 0.0], 2, 2).unwrap();
        let cand = centerline_candidates(&river, &gradient, 0.9).unwrap();
        assert_eq!(cand.set_pixels(), vec![(0, 0)]);
    }

    #[test]
    fn test_rejects_bad_threshold_and_grid() {
        let river: Raster<u8> = Raster::new(3, 3);
        let gradient: Raster<f64> = Raster::new(3, 3);
        assert!(centerline_candidates(&river, &gradient, -0.1).is_err());
        assert!(centerline_candidates(&river, &gradient, f64::NAN).is_err());

        let other: Raster<f64> = Raster::new(3, 4);
        assert!(matches!(
            centerline_candidates(&river, &other, 0.9),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
