//! Centerline cleaning
//!
//! One cleaning pass:
//!
//! 1. Count each centerline pixel's 3x3 window (center included). A count
//!    of at most 2 makes an endpoint, at least 4 a junction.
//! 2. Spread a geodesic cost from every endpoint over the non-junction
//!    pixels, capped at `max_branch_length`.
//! 3. Split the non-junction pixels into 8-connected segments. A segment
//!    that holds an endpoint, is reached everywhere within the cap and whose
//!    geodesic extent fits under the cap is a short branch and is removed.
//! 4. Remove endpoint-template matches that were not endpoints before the
//!    pruning, i.e. stubs the pruning exposed.
//! 5. Optionally remove corner pixels.
//!
//! [`clean_centerline`] repeats the pass until it removes nothing, so
//! cleaning an already clean centerline is a no-op.

use ndarray::Array2;
use rivwidth_core::raster::{eight, Raster};
use rivwidth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::branch_cost::branch_cost;
use crate::morphology::{subtract, TemplatePass};

/// What happens to endpoint-template matches exposed by pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndpointPolicy {
    /// Remove every newly exposed endpoint
    #[default]
    RemoveExposed,
    /// Remove newly exposed endpoints except tips sitting in a fork
    KeepForkTips,
}

/// Parameters for centerline cleaning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanParams {
    /// Longest branch removed, in map units along the centerline
    pub max_branch_length: f64,
    /// Remove one-pixel corners after pruning
    pub remove_corners: bool,
    pub endpoint_policy: EndpointPolicy,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            max_branch_length: 300.0,
            remove_corners: true,
            endpoint_policy: EndpointPolicy::RemoveExposed,
        }
    }
}

impl CleanParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_branch_length.is_finite() && self.max_branch_length >= 0.0) {
            return Err(Error::invalid_parameter(
                "max_branch_length",
                self.max_branch_length,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Centerline cleaner algorithm
#[derive(Debug, Clone, Default)]
pub struct CenterlineCleaner;

impl Algorithm for CenterlineCleaner {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = CleanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CenterlineCleaner"
    }

    fn description(&self) -> &'static str {
        "Prune short branches, exposed endpoints and corners from a centerline"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        clean_centerline(&input, params)
    }
}

/// Endpoint and junction pixels of a centerline
#[derive(Debug, Clone)]
pub struct NodeClasses {
    pub endpoints: Raster<u8>,
    pub junctions: Raster<u8>,
}

/// Set pixels in each centerline pixel's 3x3 window, center included.
///
/// 0 off the centerline; the neighbor degree is the count minus one.
pub fn node_count(centerline: &Raster<u8>) -> Result<Raster<u8>> {
    let data = Array2::from_shape_fn(centerline.shape(), |(r, c)| {
        if !centerline.is_set(r, c) {
            return 0u8;
        }
        let neighbors = eight::OFFSETS
            .iter()
            .filter(|&&(dr, dc)| centerline.is_set_offset(r, c, dr, dc))
            .count() as u8;
        neighbors + 1
    });
    centerline.derive(data, Some(0))
}

/// Split a centerline into endpoints (count <= 2) and junctions (count >= 4)
pub fn classify_nodes(centerline: &Raster<u8>) -> Result<NodeClasses> {
    let counts = node_count(centerline)?;
    let endpoints = counts.mask_from_fn(|r, c| {
        let n = counts.data()[(r, c)];
        n > 0 && n <= 2
    });
    let junctions = counts.mask_from_fn(|r, c| counts.data()[(r, c)] >= 4);
    Ok(NodeClasses {
        endpoints,
        junctions,
    })
}

/// Remove branches no longer than `max_branch_length` map units.
///
/// Long paths, junctions and branches that are not fully reached within
/// the length are kept untouched.
pub fn prune_branches(centerline: &Raster<u8>, max_branch_length: f64) -> Result<Raster<u8>> {
    let nodes = classify_nodes(centerline)?;
    prune_with(centerline, &nodes, max_branch_length)
}

fn prune_with(
    centerline: &Raster<u8>,
    nodes: &NodeClasses,
    max_branch_length: f64,
) -> Result<Raster<u8>> {
    let passable = subtract(centerline, &nodes.junctions)?;
    let seeds = nodes.endpoints.set_pixels();
    let reach = branch_cost(&passable, &seeds, max_branch_length)?;

    let segments = label_segments(&passable);
    let mut stats = vec![SegmentStats::default(); segments.count];
    let step = passable.cell_size();

    for (r, c) in passable.set_pixels() {
        let Some(id) = segments.label_at(r, c) else {
            continue;
        };
        let seg = &mut stats[id];
        if nodes.endpoints.is_set(r, c) {
            seg.has_endpoint = true;
        }
        let cost = reach.cost.data()[(r, c)];
        if cost.is_nan() {
            seg.complete = false;
            continue;
        }
        seg.extent = seg.extent.max(cost);

        // Two fronts from different seeds meeting here span both costs
        let seed = reach.seed.data()[(r, c)];
        for ((dr, dc), mult) in eight::steps() {
            let Some(other) = reach.cost.get_offset(r, c, dr, dc) else {
                continue;
            };
            if other.is_nan() {
                continue;
            }
            let other_seed = reach.seed.get_offset(r, c, dr, dc).unwrap_or(-1);
            if other_seed != seed && segments.same(r, c, dr, dc) {
                seg.extent = seg.extent.max(cost + other + step * mult);
            }
        }
    }

    let pruned = centerline.mask_from_fn(|r, c| {
        if !centerline.is_set(r, c) {
            return false;
        }
        match segments.label_at(r, c) {
            Some(id) => {
                let seg = &stats[id];
                !(seg.has_endpoint && seg.complete && seg.extent <= max_branch_length)
            }
            None => true,
        }
    });
    Ok(pruned)
}

#[derive(Debug, Clone, Copy)]
struct SegmentStats {
    has_endpoint: bool,
    complete: bool,
    extent: f64,
}

impl Default for SegmentStats {
    fn default() -> Self {
        Self {
            has_endpoint: false,
            complete: true,
            extent: 0.0,
        }
    }
}

/// 8-connected component labels of a mask
struct Segments {
    labels: Array2<i32>,
    count: usize,
}

impl Segments {
    fn label_at(&self, r: usize, c: usize) -> Option<usize> {
        let l = self.labels[(r, c)];
        (l >= 0).then_some(l as usize)
    }

    fn same(&self, r: usize, c: usize, dr: isize, dc: isize) -> bool {
        let (nr, nc) = (r as isize + dr, c as isize + dc);
        if nr < 0 || nc < 0 {
            return false;
        }
        self.labels
            .get((nr as usize, nc as usize))
            .is_some_and(|&l| l >= 0 && l == self.labels[(r, c)])
    }
}

fn label_segments(mask: &Raster<u8>) -> Segments {
    let mut labels = Array2::from_elem(mask.shape(), -1i32);
    let mut count = 0usize;
    let mut stack = Vec::new();

    for (r, c) in mask.set_pixels() {
        if labels[(r, c)] >= 0 {
            continue;
        }
        let id = count as i32;
        count += 1;
        labels[(r, c)] = id;
        stack.push((r, c));

        while let Some((pr, pc)) = stack.pop() {
            for &(dr, dc) in &eight::OFFSETS {
                if !mask.is_set_offset(pr, pc, dr, dc) {
                    continue;
                }
                let (nr, nc) = ((pr as isize + dr) as usize, (pc as isize + dc) as usize);
                if labels[(nr, nc)] < 0 {
                    labels[(nr, nc)] = id;
                    stack.push((nr, nc));
                }
            }
        }
    }

    Segments { labels, count }
}

/// One cleaning pass; see the module docs for the steps
pub fn clean_pass(centerline: &Raster<u8>, params: CleanParams) -> Result<Raster<u8>> {
    params.validate()?;

    let nodes = classify_nodes(centerline)?;
    let pruned = prune_with(centerline, &nodes, params.max_branch_length)?;

    let exposed = subtract(&TemplatePass::endpoints().detect(&pruned)?, &nodes.endpoints)?;
    let exposed = match params.endpoint_policy {
        EndpointPolicy::RemoveExposed => exposed,
        EndpointPolicy::KeepForkTips => {
            subtract(&exposed, &TemplatePass::fork_tips().detect(&pruned)?)?
        }
    };
    let trimmed = subtract(&pruned, &exposed)?;

    if params.remove_corners {
        TemplatePass::corners().remove(&trimmed)
    } else {
        Ok(trimmed)
    }
}

/// Clean a centerline, repeating passes until nothing changes
pub fn clean_centerline(centerline: &Raster<u8>, params: CleanParams) -> Result<Raster<u8>> {
    params.validate()?;

    let mut current = centerline.clone();
    current.set_nodata(Some(0));
    let start = current.count_set();
    let mut passes = 0usize;

    loop {
        let next = clean_pass(&current, params)?;
        passes += 1;
        if next.count_set() == current.count_set() {
            break;
        }
        current = next;
    }

    debug!(
        before = start,
        after = current.count_set(),
        passes,
        corners = params.remove_corners,
        "centerline cleaned"
    );
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivwidth_core::GeoTransform;

    fn mask(rows: usize, cols: usize, pixels: &[(usize, usize)]) -> Raster<u8> {
        let mut m: Raster<u8> = Raster::new(rows, cols);
        m.set_transform(GeoTransform::north_up(0.0, rows as f64 * 30.0, 30.0));
        for &(r, c) in pixels {
            m.set(r, c, 1).unwrap();
        }
        m
    }

    fn main_line() -> Vec<(usize, usize)> {
        (0..=40).map(|c| (10, c)).collect()
    }

    #[test]
    fn test_node_count_includes_center() {
        let m = mask(5, 5, &[(2, 1), (2, 2), (2, 3), (1, 2)]);
        let counts = node_count(&m).unwrap();
        assert_eq!(counts.get(2, 2).unwrap(), 4);
        assert_eq!(counts.get(2, 1).unwrap(), 3);
        assert_eq!(counts.get(0, 0).unwrap(), 0);

        let nodes = classify_nodes(&m).unwrap();
        assert_eq!(nodes.junctions.set_pixels(), vec![(1, 2), (2, 2)]);
        assert_eq!(nodes.endpoints.count_set(), 0);
    }

    #[test]
    fn test_spur_is_removed() {
        let mut pixels = main_line();
        pixels.extend([(9, 20), (8, 20)]);
        let m = mask(21, 41, &pixels);

        for cells in [2.0, 3.0] {
            let params = CleanParams {
                max_branch_length: cells * 30.0,
                ..Default::default()
            };
            let cleaned = clean_centerline(&m, params).unwrap();
            assert_eq!(cleaned.set_pixels(), main_line(), "threshold {} cells", cells);
        }
    }

    #[test]
    fn test_diagonal_spur_is_removed() {
        let mut pixels = main_line();
        pixels.extend([(9, 21), (8, 22)]);
        let m = mask(21, 41, &pixels);
        let params = CleanParams {
            max_branch_length: 90.0,
            ..Default::default()
        };
        let cleaned = clean_centerline(&m, params).unwrap();
        assert_eq!(cleaned.set_pixels(), main_line());
    }

    #[test]
    fn test_long_spur_is_kept() {
        let mut pixels = main_line();
        pixels.extend((3..10).map(|r| (r, 20)));
        let m = mask(21, 41, &pixels);
        let params = CleanParams {
            max_branch_length: 90.0,
            remove_corners: false,
            ..Default::default()
        };
        let cleaned = prune_branches(&m, params.max_branch_length).unwrap();
        assert!(cleaned.is_set(3, 20), "a 7-pixel spur exceeds 3 cells");
        assert!(cleaned.is_set(10, 0) && cleaned.is_set(10, 40));
    }

    #[test]
    fn test_long_path_is_never_trimmed() {
        let m = mask(21, 41, &main_line());
        // The path spans 40 cells end to end
        for cells in [10.0, 39.0] {
            let cleaned = clean_centerline(
                &m,
                CleanParams {
                    max_branch_length: cells * 30.0,
                    ..Default::default()
                },
            )
            .unwrap();
            assert_eq!(cleaned.count_set(), 41, "threshold {} cells", cells);
        }
    }

    #[test]
    fn test_short_fragment_and_island_vanish() {
        let m = mask(10, 10, &[(2, 2), (5, 5), (5, 6), (5, 7)]);
        let cleaned = clean_centerline(&m, CleanParams::default()).unwrap();
        assert_eq!(cleaned.count_set(), 0);
    }

    #[test]
    fn test_idempotent() {
        let mut pixels = main_line();
        pixels.extend([(9, 20), (8, 20), (11, 30), (12, 31)]);
        let m = mask(21, 41, &pixels);
        let once = clean_centerline(&m, CleanParams::default()).unwrap();
        let twice = clean_centerline(&once, CleanParams::default()).unwrap();
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_fork_tip_policy() {
        // (3,3) has two neighbors, both above it: an endpoint by template
        // but not by count, and the tip of a fork
        let m = mask(7, 7, &[(3, 3), (2, 2), (2, 4)]);
        let nodes = classify_nodes(&m).unwrap();
        assert!(!nodes.endpoints.is_set(3, 3));

        let params = CleanParams {
            max_branch_length: 0.0,
            remove_corners: false,
            endpoint_policy: EndpointPolicy::KeepForkTips,
        };
        let kept = clean_pass(&m, params).unwrap();
        assert_eq!(kept.count_set(), 3);

        let removed = clean_pass(
            &m,
            CleanParams {
                endpoint_policy: EndpointPolicy::RemoveExposed,
                ..params
            },
        )
        .unwrap();
        assert_eq!(removed.set_pixels(), vec![(2, 2), (2, 4)]);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let m = mask(3, 3, &[(1, 1)]);
        let params = CleanParams {
            max_branch_length: -1.0,
            ..Default::default()
        };
        assert!(CenterlineCleaner.execute(m, params).is_err());
    }
}
