//! Cross-section width measurement
//!
//! Every centerline pixel with a defined angle and distance gets a segment
//! centered on it, oriented along the angle and `2 * distance * multiplier`
//! long. The channel mask is sampled along the segment; the covered fraction
//! times the segment length is the width. Both ends are checked against the
//! river mask and the processing region so callers can drop sections that
//! end in water or run off the image.

use std::collections::BTreeMap;

use geo::{Coord, Line};
use crate::maybe_rayon::*;
use rivwidth_core::raster::Raster;
use rivwidth_core::{Error, Result, CRS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sampling::{pixels_near_point, SampleStats, SegmentSampler};

/// Parameters for cross-section measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionParams {
    /// Half-length of a section as a multiple of the distance to the bank
    pub width_multiplier: f64,
    /// Radius sampled around each section end, in map units
    pub endpoint_buffer: f64,
    /// Sample a strip this wide on each side instead of the bare line
    pub segment_buffer: Option<f64>,
    /// Report the standard deviation of sampled values
    pub with_std_dev: bool,
}

impl Default for CrossSectionParams {
    fn default() -> Self {
        Self {
            width_multiplier: 1.5,
            endpoint_buffer: 30.0,
            segment_buffer: None,
            with_std_dev: false,
        }
    }
}

impl CrossSectionParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.width_multiplier.is_finite() && self.width_multiplier > 0.0) {
            return Err(Error::invalid_parameter(
                "width_multiplier",
                self.width_multiplier,
                "must be finite and positive",
            ));
        }
        if !(self.endpoint_buffer.is_finite() && self.endpoint_buffer >= 0.0) {
            return Err(Error::invalid_parameter(
                "endpoint_buffer",
                self.endpoint_buffer,
                "must be finite and non-negative",
            ));
        }
        if let Some(b) = self.segment_buffer {
            if !(b.is_finite() && b > 0.0) {
                return Err(Error::invalid_parameter(
                    "segment_buffer",
                    b,
                    "must be finite and positive",
                ));
            }
        }
        Ok(())
    }
}

/// Rasters a measurement reads; all must share one grid
#[derive(Debug, Clone, Copy)]
pub struct WidthInputs<'a> {
    pub centerline: &'a Raster<u8>,
    pub orientation: &'a Raster<f64>,
    pub distance: &'a Raster<f64>,
    /// Water used for the end checks
    pub river_mask: &'a Raster<u8>,
    /// Water counted towards the width
    pub channel_mask: &'a Raster<u8>,
    /// Processed area; the whole grid when absent
    pub region: Option<&'a Raster<u8>>,
    /// Named quality rasters averaged along each section
    pub flags: &'a BTreeMap<String, Raster<f64>>,
}

impl WidthInputs<'_> {
    fn check_grids(&self) -> Result<()> {
        let base = self.centerline;
        let cell = base.cell_size();
        if !(cell.is_finite() && cell > 0.0) {
            return Err(Error::invalid_parameter(
                "cell_size",
                cell,
                "raster cell size must be positive",
            ));
        }
        base.ensure_same_grid(self.orientation)?;
        base.ensure_same_grid(self.distance)?;
        base.ensure_same_grid(self.river_mask)?;
        base.ensure_same_grid(self.channel_mask)?;
        if let Some(region) = self.region {
            base.ensure_same_grid(region)?;
        }
        for flag in self.flags.values() {
            base.ensure_same_grid(flag)?;
        }
        Ok(())
    }

    fn in_region(&self, row: usize, col: usize) -> bool {
        self.region.map_or(true, |region| region.is_set(row, col))
    }
}

/// One end of a cross-section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionEnd {
    pub x: f64,
    pub y: f64,
    /// A river pixel lies within the end buffer
    pub in_water: bool,
    /// A sampled pixel lies on the grid inside the processing region
    pub in_region: bool,
}

/// Width measurement at one centerline pixel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub row: usize,
    pub col: usize,
    /// Map coordinates of the pixel center
    pub x: f64,
    pub y: f64,
    /// Section bearing, degrees counter-clockwise from east
    pub angle: f64,
    /// Distance to the bank at the pixel, map units
    pub half_width: f64,
    /// Section length, map units
    pub length: f64,
    pub ends: [SectionEnd; 2],
    pub endpoints_in_region: u8,
    pub ends_in_water: bool,
    pub ends_over_edge: bool,
    /// Channel coverage along the section; `None` when nothing was on the grid
    pub channel_fraction: Option<SampleStats>,
    /// `length * channel_fraction.mean`
    pub width: Option<f64>,
    pub quality: BTreeMap<String, SampleStats>,
}

impl CrossSection {
    /// The section as a map-space segment from the first end to the second
    pub fn segment(&self) -> Line<f64> {
        Line::new(
            Coord { x: self.ends[0].x, y: self.ends[0].y },
            Coord { x: self.ends[1].x, y: self.ends[1].y },
        )
    }

    /// Both ends land on land inside the processed region
    pub fn is_clean(&self) -> bool {
        !self.ends_in_water && !self.ends_over_edge
    }
}

/// All cross-sections of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionSet {
    pub crs: Option<CRS>,
    /// Sections in row-major pixel order
    pub sections: Vec<CrossSection>,
    /// Centerline pixels skipped because the angle was undefined
    pub undefined_angle: usize,
    /// Centerline pixels skipped because the distance was undefined
    pub undefined_distance: usize,
}

impl CrossSectionSet {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections with both ends on land inside the region
    pub fn clean(&self) -> impl Iterator<Item = &CrossSection> {
        self.sections.iter().filter(|s| s.is_clean())
    }
}

/// Measure a cross-section at every centerline pixel
pub fn measure_cross_sections(
    inputs: &WidthInputs<'_>,
    params: CrossSectionParams,
) -> Result<CrossSectionSet> {
    params.validate()?;
    inputs.check_grids()?;

    let mut undefined_angle = 0usize;
    let mut undefined_distance = 0usize;
    let mut pixels = Vec::new();

    for (row, col) in inputs.centerline.set_pixels() {
        let angle = inputs.orientation.data()[(row, col)];
        let distance = inputs.distance.data()[(row, col)];
        if !angle.is_finite() {
            undefined_angle += 1;
        } else if !distance.is_finite() {
            undefined_distance += 1;
        } else {
            pixels.push((row, col, angle, distance));
        }
    }

    let sampler = SegmentSampler::from_buffer(params.segment_buffer);
    let sections: Vec<CrossSection> = pixels
        .into_par_iter()
        .map(|(row, col, angle, distance)| {
            measure_one(inputs, &params, sampler, row, col, angle, distance)
        })
        .collect();

    debug!(
        sections = sections.len(),
        undefined_angle,
        undefined_distance,
        "cross-sections measured"
    );

    Ok(CrossSectionSet {
        crs: inputs.centerline.crs().cloned(),
        sections,
        undefined_angle,
        undefined_distance,
    })
}

fn measure_one(
    inputs: &WidthInputs<'_>,
    params: &CrossSectionParams,
    sampler: SegmentSampler,
    row: usize,
    col: usize,
    angle: f64,
    distance: f64,
) -> CrossSection {
    let (x, y) = inputs.centerline.pixel_to_geo(col, row);
    let half = distance * params.width_multiplier;
    let (sin, cos) = angle.to_radians().sin_cos();
    let (ox, oy) = (half * cos, half * sin);

    let ends = [
        section_end(inputs, x + ox, y + oy, params.endpoint_buffer),
        section_end(inputs, x - ox, y - oy, params.endpoint_buffer),
    ];
    let endpoints_in_region = ends.iter().filter(|e| e.in_region).count() as u8;

    let line = Line::new(Coord { x: ends[0].x, y: ends[0].y }, Coord { x: ends[1].x, y: ends[1].y });
    let length = 2.0 * half;
    let samples = sampler.pixels(inputs.channel_mask, &line);

    let channel_fraction = SampleStats::from_values(
        samples
            .iter()
            .map(|&(r, c)| if inputs.channel_mask.is_set(r, c) { 1.0 } else { 0.0 }),
        params.with_std_dev,
    );

    let quality = inputs
        .flags
        .iter()
        .filter_map(|(name, flag)| {
            let stats = SampleStats::from_values(
                samples.iter().map(|&(r, c)| flag.data()[(r, c)]),
                params.with_std_dev,
            )?;
            Some((name.clone(), stats))
        })
        .collect();

    CrossSection {
        row,
        col,
        x,
        y,
        angle,
        half_width: distance,
        length,
        ends,
        endpoints_in_region,
        ends_in_water: ends.iter().any(|e| e.in_water),
        ends_over_edge: endpoints_in_region < 2,
        width: channel_fraction.map(|s| length * s.mean),
        channel_fraction,
        quality,
    }
}

fn section_end(inputs: &WidthInputs<'_>, x: f64, y: f64, buffer: f64) -> SectionEnd {
    let near = pixels_near_point(inputs.river_mask, x, y, buffer);
    SectionEnd {
        x,
        y,
        in_water: near.iter().any(|&(r, c)| inputs.river_mask.is_set(r, c)),
        in_region: near.iter().any(|&(r, c)| inputs.in_region(r, c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rivwidth_core::GeoTransform;

    struct Fixture {
        centerline: Raster<u8>,
        orientation: Raster<f64>,
        distance: Raster<f64>,
        river: Raster<u8>,
        flags: BTreeMap<String, Raster<f64>>,
    }

    /// East-west channel on rows 7..=9 with the centerline on row 8
    fn fixture(rows: usize, cols: usize) -> Fixture {
        let gt = GeoTransform::north_up(0.0, rows as f64 * 30.0, 30.0);
        let mut river: Raster<u8> = Raster::new(rows, cols);
        river.set_transform(gt);
        let mut centerline = river.clone();
        let mut orientation: Raster<f64> = river.with_same_meta(rows, cols);
        orientation.data_mut().fill(f64::NAN);
        let mut distance = orientation.clone();

        for c in 2..cols - 2 {
            for r in 7..=9 {
                river.set(r, c, 1).unwrap();
            }
            centerline.set(8, c, 1).unwrap();
            orientation.set(8, c, 90.0).unwrap();
            distance.set(8, c, 90.0).unwrap();
        }

        Fixture {
            centerline,
            orientation,
            distance,
            river,
            flags: BTreeMap::new(),
        }
    }

    impl Fixture {
        fn inputs(&self) -> WidthInputs<'_> {
            WidthInputs {
                centerline: &self.centerline,
                orientation: &self.orientation,
                distance: &self.distance,
                river_mask: &self.river,
                channel_mask: &self.river,
                region: None,
                flags: &self.flags,
            }
        }
    }

    #[test]
    fn test_straight_channel_width() {
        let f = fixture(17, 30);
        let set = measure_cross_sections(&f.inputs(), CrossSectionParams::default()).unwrap();

        assert_eq!(set.len(), 26);
        for s in &set.sections {
            assert_relative_eq!(s.length, 270.0, epsilon = 1e-9);
            assert_relative_eq!(s.width.unwrap(), 90.0, epsilon = 1e-9);
            assert!(!s.ends_in_water, "ends at ({}, {}) should be on land", s.row, s.col);
            assert_eq!(s.endpoints_in_region, 2);
            assert!(s.is_clean());
        }

        // Angle 90 points north: first end above the pixel
        let s = &set.sections[0];
        assert_relative_eq!(s.ends[0].x, s.x, epsilon = 1e-9);
        assert_relative_eq!(s.ends[0].y - s.y, 135.0, epsilon = 1e-9);
        let seg = s.segment();
        assert_relative_eq!(seg.dy(), -270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ends_in_water_and_over_edge() {
        let mut f = fixture(17, 30);
        // Wide half-width estimate at one pixel pushes the ends off the grid
        f.distance.set(8, 10, 400.0).unwrap();
        // Short estimate keeps both ends inside the channel
        f.distance.set(8, 20, 10.0).unwrap();

        let set = measure_cross_sections(&f.inputs(), CrossSectionParams::default()).unwrap();
        let far = set.sections.iter().find(|s| s.col == 10).unwrap();
        assert_eq!(far.endpoints_in_region, 0);
        assert!(far.ends_over_edge);
        assert!(!far.is_clean());

        let near = set.sections.iter().find(|s| s.col == 20).unwrap();
        assert!(near.ends_in_water);
        assert!(!near.ends_over_edge);
        assert_relative_eq!(near.width.unwrap(), near.length, epsilon = 1e-9);
    }

    #[test]
    fn test_region_limits_in_region() {
        let f = fixture(17, 30);
        let mut region = Raster::<u8>::empty_mask_like(&f.river);
        for r in 0..9 {
            for c in 0..30 {
                region.set(r, c, 1).unwrap();
            }
        }
        let mut inputs = f.inputs();
        inputs.region = Some(&region);
        let set = measure_cross_sections(&inputs, CrossSectionParams::default()).unwrap();
        // Northern ends are inside the region, southern ones are not
        assert!(set.sections.iter().all(|s| s.endpoints_in_region == 1));
        assert!(set.sections.iter().all(|s| s.ends[0].in_region && !s.ends[1].in_region));
    }

    #[test]
    fn test_undefined_pixels_are_counted() {
        let mut f = fixture(17, 30);
        f.orientation.set(8, 5, f64::NAN).unwrap();
        f.distance.set(8, 6, f64::NAN).unwrap();
        let set = measure_cross_sections(&f.inputs(), CrossSectionParams::default()).unwrap();
        assert_eq!(set.len(), 24);
        assert_eq!(set.undefined_angle, 1);
        assert_eq!(set.undefined_distance, 1);
    }

    #[test]
    fn test_buffered_sampling_and_flags() {
        let mut f = fixture(17, 30);
        let mut cloud: Raster<f64> = f.river.with_same_meta(17, 30);
        cloud.data_mut().fill(0.0);
        for c in 0..30 {
            cloud.set(6, c, 1.0).unwrap();
        }
        f.flags.insert("cloud".to_string(), cloud);

        let params = CrossSectionParams {
            width_multiplier: 1.3,
            segment_buffer: Some(30.0),
            with_std_dev: true,
            ..Default::default()
        };
        let set = measure_cross_sections(&f.inputs(), params).unwrap();
        let s = set.sections.iter().find(|s| s.col == 15).unwrap();

        let fraction = s.channel_fraction.unwrap();
        assert!(fraction.std_dev.is_some());
        assert!(fraction.mean > 0.0 && fraction.mean < 1.0);
        assert!(s.width.unwrap() <= s.length);

        let cloud = s.quality["cloud"];
        assert!(cloud.mean > 0.0 && cloud.mean < 1.0);
    }

    #[test]
    fn test_grid_mismatch_rejected() {
        let f = fixture(17, 30);
        let other: Raster<f64> = Raster::new(17, 31);
        let mut inputs = f.inputs();
        inputs.distance = &other;
        assert!(measure_cross_sections(&inputs, CrossSectionParams::default()).is_err());

        let bad = CrossSectionParams {
            width_multiplier: 0.0,
            ..Default::default()
        };
        assert!(measure_cross_sections(&f.inputs(), bad).is_err());
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let mut f = fixture(17, 30);
        let flat = GeoTransform::new(0.0, 0.0, 0.0, -30.0);
        f.centerline.set_transform(flat);
        f.orientation.set_transform(flat);
        f.distance.set_transform(flat);
        f.river.set_transform(flat);

        let result = measure_cross_sections(&f.inputs(), CrossSectionParams::default());
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "cell_size", .. })
        ));
    }
}
