//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Pipeline rasters use three cell types: `u8` for binary masks
/// (1 = present, 0 = absent), `i32` for labels such as branch seeds
/// (negative = unassigned), and `f64` for distances, gradients and angles
/// (NaN = masked).
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty, $nodata:expr) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                $nodata
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.is_some_and(|nd| *self == nd)
            }

            fn is_float() -> bool {
                false
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) if !nd.is_nan() => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    _ => false,
                }
            }

            fn is_float() -> bool {
                true
            }
        }
    };
}

// Masks: absent cells are 0.
impl_raster_element_int!(u8, 0);
impl_raster_element_int!(u16, 0);
impl_raster_element_int!(u32, 0);
// Labels: unassigned cells are -1.
impl_raster_element_int!(i32, -1);
impl_raster_element_int!(i64, -1);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(f64::NAN)));
        assert!(!1.0f64.is_nodata(Some(f64::NAN)));
    }

    #[test]
    fn test_mask_zero_is_nodata() {
        assert!(0u8.is_nodata(Some(u8::default_nodata())));
        assert!(!1u8.is_nodata(Some(u8::default_nodata())));
        assert_eq!(i32::default_nodata(), -1);
    }
}
