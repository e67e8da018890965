//! Neighborhood patterns used by window and ring operations

/// A pattern of offsets around a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Square window of given radius
    Square(usize),
    /// Outer ring of a square window: cells at exactly this Chebyshev distance
    Ring(usize),
}

impl Neighborhood {
    /// Get the radius of the neighborhood
    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Square(r) | Neighborhood::Ring(r) => *r,
        }
    }

    /// Width and height of the bounding window
    pub fn size(&self) -> usize {
        self.radius() * 2 + 1
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match self {
            Neighborhood::Square(r) => {
                let r = *r as isize;
                dr.abs() <= r && dc.abs() <= r
            }
            Neighborhood::Ring(r) => dr.abs().max(dc.abs()) == *r as isize,
        }
    }

    /// Relative positions in this neighborhood, row-major
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        (-r..=r)
            .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| self.contains(dr, dc))
            .collect()
    }
}

/// The eight neighbors of a cell and their step lengths
pub mod eight {
    use std::f64::consts::SQRT_2;

    /// (row_offset, col_offset), clockwise from north-west
    pub const OFFSETS: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
        (1, 0),
        (1, -1),
        (0, -1),
    ];

    /// Step length in cells for each entry of [`OFFSETS`]
    pub const DISTANCES: [f64; 8] = [SQRT_2, 1.0, SQRT_2, 1.0, SQRT_2, 1.0, SQRT_2, 1.0];

    /// Offsets paired with their step lengths
    pub fn steps() -> impl Iterator<Item = ((isize, isize), f64)> {
        OFFSETS.into_iter().zip(DISTANCES)
    }
}
