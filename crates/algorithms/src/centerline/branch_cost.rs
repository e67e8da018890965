//! Geodesic cost along a centerline
//!
//! Multi-source Dijkstra over the set pixels of a mask with 8-connectivity.
//! Each step costs the cell size times 1 (cardinal) or sqrt(2) (diagonal).
//! Expansion stops at `max_cost`, and every reached pixel records which seed
//! reached it first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;
use rivwidth_core::raster::{eight, Raster};
use rivwidth_core::{Error, Result};

/// Cost field and seed labels
#[derive(Debug, Clone)]
pub struct BranchCost {
    /// Accumulated cost from the nearest seed; NaN where not reached
    pub cost: Raster<f64>,
    /// Index into the seed list of the reaching seed; -1 where not reached
    pub seed: Raster<i32>,
}

/// State in the priority queue (min-heap via Reverse ordering).
#[derive(Debug, Clone, PartialEq)]
struct State {
    cost: f64,
    row: usize,
    col: usize,
    seed: i32,
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; ties broken by seed for determinism
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seed.cmp(&self.seed))
    }
}

/// Accumulated cost over `passable` from `seeds`, capped at `max_cost`.
///
/// Seeds off the grid or on unset pixels are ignored. No seeds is not an
/// error: the result is simply unreached everywhere.
pub fn branch_cost(
    passable: &Raster<u8>,
    seeds: &[(usize, usize)],
    max_cost: f64,
) -> Result<BranchCost> {
    if !(max_cost.is_finite() && max_cost >= 0.0) {
        return Err(Error::invalid_parameter(
            "max_cost",
            max_cost,
            "must be finite and non-negative",
        ));
    }

    let (rows, cols) = passable.shape();
    let step = passable.cell_size();

    let mut dist = vec![f64::INFINITY; rows * cols];
    let mut label = vec![-1i32; rows * cols];
    let mut heap = BinaryHeap::new();

    for (i, &(r, c)) in seeds.iter().enumerate() {
        if !passable.is_set(r, c) {
            continue;
        }
        let seed = i32::try_from(i).map_err(|e| Error::Other(e.to_string()))?;
        if dist[r * cols + c] > 0.0 {
            dist[r * cols + c] = 0.0;
            label[r * cols + c] = seed;
            heap.push(State { cost: 0.0, row: r, col: c, seed });
        }
    }

    while let Some(State { cost, row, col, seed }) = heap.pop() {
        let idx = row * cols + col;
        // Skip if we already found a better path
        if cost > dist[idx] || label[idx] != seed {
            continue;
        }

        for ((dr, dc), mult) in eight::steps() {
            if !passable.is_set_offset(row, col, dr, dc) {
                continue;
            }
            let nr = (row as isize + dr) as usize;
            let nc = (col as isize + dc) as usize;

            let new_cost = cost + step * mult;
            if new_cost > max_cost {
                continue;
            }

            let nidx = nr * cols + nc;
            if new_cost < dist[nidx] {
                dist[nidx] = new_cost;
                label[nidx] = seed;
                heap.push(State { cost: new_cost, row: nr, col: nc, seed });
            }
        }
    }

    let cost_data: Vec<f64> = dist
        .into_iter()
        .map(|d| if d.is_infinite() { f64::NAN } else { d })
        .collect();

    let cost = Array2::from_shape_vec((rows, cols), cost_data)?;
    let seed = Array2::from_shape_vec((rows, cols), label)?;

    Ok(BranchCost {
        cost: passable.derive(cost, Some(f64::NAN))?,
        seed: passable.derive(seed, Some(-1))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rivwidth_core::GeoTransform;

    fn line(rows: usize, cols: usize, pixels: &[(usize, usize)], scale: f64) -> Raster<u8> {
        let mut r: Raster<u8> = Raster::new(rows, cols);
        r.set_transform(GeoTransform::north_up(0.0, rows as f64 * scale, scale));
        for &(row, col) in pixels {
            r.set(row, col, 1).unwrap();
        }
        r
    }

    #[test]
    fn test_cost_follows_path_in_map_units() {
        let pixels: Vec<_> = (0..6).map(|c| (1, c)).chain([(2, 6)]).collect();
        let mask = line(4, 8, &pixels, 30.0);
        let bc = branch_cost(&mask, &[(1, 0)], 1000.0).unwrap();

        assert_relative_eq!(bc.cost.get(1, 0).unwrap(), 0.0);
        assert_relative_eq!(bc.cost.get(1, 5).unwrap(), 150.0, epsilon = 1e-9);
        assert_relative_eq!(
            bc.cost.get(2, 6).unwrap(),
            150.0 + 30.0 * std::f64::consts::SQRT_2,
            epsilon = 1e-9
        );
        // Off-path cells are never reached
        assert!(bc.cost.get(0, 0).unwrap().is_nan());
        assert_eq!(bc.seed.get(0, 0).unwrap(), -1);
    }

    #[test]
    fn test_cap_stops_expansion() {
        let pixels: Vec<_> = (0..10).map(|c| (0, c)).collect();
        let mask = line(1, 10, &pixels, 1.0);
        let bc = branch_cost(&mask, &[(0, 0)], 3.0).unwrap();
        assert_relative_eq!(bc.cost.get(0, 3).unwrap(), 3.0);
        assert!(bc.cost.get(0, 4).unwrap().is_nan());
    }

    #[test]
    fn test_two_seeds_meet_in_middle() {
        let pixels: Vec<_> = (0..9).map(|c| (0, c)).collect();
        let mask = line(1, 9, &pixels, 1.0);
        let bc = branch_cost(&mask, &[(0, 0), (0, 8)], 100.0).unwrap();
        assert_eq!(bc.seed.get(0, 2).unwrap(), 0);
        assert_eq!(bc.seed.get(0, 6).unwrap(), 1);
        // Equal-cost middle goes to the lower seed index
        assert_eq!(bc.seed.get(0, 4).unwrap(), 0);
        assert_relative_eq!(bc.cost.get(0, 4).unwrap(), 4.0);
    }

    #[test]
    fn test_no_seeds_is_not_an_error() {
        let mask = line(3, 3, &[(1, 1)], 1.0);
        let bc = branch_cost(&mask, &[], 10.0).unwrap();
        assert_eq!(bc.cost.valid_count(), 0);
        assert!(branch_cost(&mask, &[], -1.0).is_err());
    }
}
