//! Raster sampling around points and along segments

use geo::{Closest, ClosestPoint, Coord, Line, Point};
use rivwidth_core::raster::{Raster, RasterElement};
use serde::{Deserialize, Serialize};

/// Mean, optional standard deviation and count of sampled values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub mean: f64,
    /// Population standard deviation, when requested
    pub std_dev: Option<f64>,
    pub count: usize,
}

impl SampleStats {
    /// Statistics of the finite values, or `None` if there are none
    pub fn from_values<I>(values: I, with_std_dev: bool) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = with_std_dev.then(|| {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            var.sqrt()
        });
        Some(Self {
            mean,
            std_dev,
            count: values.len(),
        })
    }
}

/// How a cross-section segment picks its pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentSampler {
    /// Points spaced half a cell along the segment, at interval midpoints
    Line,
    /// Every pixel whose center lies within this distance of the segment
    Buffered(f64),
}

impl SegmentSampler {
    pub fn from_buffer(buffer: Option<f64>) -> Self {
        buffer.map_or(SegmentSampler::Line, SegmentSampler::Buffered)
    }

    /// Grid pixels sampled along `line`; off-grid samples are dropped.
    ///
    /// In line mode a pixel crossed by several samples appears once per
    /// sample, so the statistics are length-weighted.
    pub fn pixels<T: RasterElement>(&self, grid: &Raster<T>, line: &Line<f64>) -> Vec<(usize, usize)> {
        match *self {
            SegmentSampler::Line => line_pixels(grid, line),
            SegmentSampler::Buffered(buffer) => pixels_near_segment(grid, line, buffer),
        }
    }
}

fn line_pixels<T: RasterElement>(grid: &Raster<T>, line: &Line<f64>) -> Vec<(usize, usize)> {
    let length = line.dx().hypot(line.dy());
    let cell = grid.cell_size();
    if length == 0.0 {
        return grid.pixel_at(line.start.x, line.start.y).into_iter().collect();
    }

    let n = (2.0 * length / cell).ceil().max(1.0) as usize;
    (0..n)
        .filter_map(|i| {
            let t = (i as f64 + 0.5) / n as f64;
            grid.pixel_at(line.start.x + t * line.dx(), line.start.y + t * line.dy())
        })
        .collect()
}

/// Candidate pixel window around a map box, clamped to the grid
fn window<T: RasterElement>(
    grid: &Raster<T>,
    min: Coord<f64>,
    max: Coord<f64>,
) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
    let (c0, r0) = grid.geo_to_pixel(min.x, max.y);
    let (c1, r1) = grid.geo_to_pixel(max.x, min.y);
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 || !(c0.is_finite() && c1.is_finite() && r0.is_finite() && r1.is_finite()) {
        return None;
    }

    let clamp = |v: f64, hi: usize| v.floor().clamp(0.0, hi as f64 - 1.0) as usize;
    let (rlo, rhi) = (clamp(r0.min(r1) - 1.0, rows), clamp(r0.max(r1) + 1.0, rows));
    let (clo, chi) = (clamp(c0.min(c1) - 1.0, cols), clamp(c0.max(c1) + 1.0, cols));
    Some((rlo..=rhi, clo..=chi))
}

/// Pixels whose centers lie within `buffer` of `line`
fn pixels_near_segment<T: RasterElement>(
    grid: &Raster<T>,
    line: &Line<f64>,
    buffer: f64,
) -> Vec<(usize, usize)> {
    let min = Coord {
        x: line.start.x.min(line.end.x) - buffer,
        y: line.start.y.min(line.end.y) - buffer,
    };
    let max = Coord {
        x: line.start.x.max(line.end.x) + buffer,
        y: line.start.y.max(line.end.y) + buffer,
    };
    let Some((rows, cols)) = window(grid, min, max) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for r in rows {
        for c in cols.clone() {
            let (x, y) = grid.pixel_to_geo(c, r);
            if distance_to_segment(line, Point::new(x, y)) <= buffer {
                out.push((r, c));
            }
        }
    }
    out
}

/// Pixels whose centers lie within `buffer` of `(x, y)`, plus the pixel
/// containing it. Only on-grid pixels are returned.
pub fn pixels_near_point<T: RasterElement>(
    grid: &Raster<T>,
    x: f64,
    y: f64,
    buffer: f64,
) -> Vec<(usize, usize)> {
    let reach = Coord { x: buffer, y: buffer };
    let center = Coord { x, y };
    let Some((rows, cols)) = window(grid, center - reach, center + reach) else {
        return Vec::new();
    };

    let containing = grid.pixel_at(x, y);
    let mut out = Vec::new();
    for r in rows {
        for c in cols.clone() {
            let (px, py) = grid.pixel_to_geo(c, r);
            if (px - x).hypot(py - y) <= buffer || containing == Some((r, c)) {
                out.push((r, c));
            }
        }
    }
    out
}

fn distance_to_segment(line: &Line<f64>, p: Point<f64>) -> f64 {
    match line.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => (q.x() - p.x()).hypot(q.y() - p.y()),
        Closest::Indeterminate => (line.start.x - p.x()).hypot(line.start.y - p.y()),
    }
}
