#![deny(unsafe_code)]
//! Broad-phase neighbor search for constellation lines.
//!
//! Every frame the flow particles are bucketed into a uniform grid whose
//! cell size equals the connection radius, using a counting sort: one pass
//! counts occupancy per cell, an exclusive prefix sum turns counts into
//! offsets, and a second pass places particle indices. All buffers live in
//! [`NeighborGrid`] and are reused, so a rebuild does not allocate once the
//! particle count and viewport are stable.
//!
//! Because a cell is as wide as the radius, any pair closer than the radius
//! sits in the same or an adjacent cell, so scanning the 3×3 block around
//! each particle finds every pair. Emitting only `j > i` removes reciprocal
//! duplicates.

use ambient_core::EngineError;
use glam::DVec2;

/// Counters from one pair enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairStats {
    /// Distance checks performed.
    pub candidates: usize,
    /// Pairs closer than the radius.
    pub pairs: usize,
}

/// Uniform grid index rebuilt each frame.
#[derive(Debug, Clone)]
pub struct NeighborGrid {
    radius: f64,
    radius_sq: f64,
    cols: usize,
    rows: usize,
    /// `cell_start[c]..cell_start[c + 1]` indexes `sorted` for cell `c`.
    cell_start: Vec<usize>,
    cursor: Vec<usize>,
    sorted: Vec<usize>,
    cell_of: Vec<usize>,
}

impl NeighborGrid {
    /// Creates an empty index for the given connection radius.
    ///
    /// Returns `EngineError::InvalidConfig` if the radius is not a positive
    /// finite number.
    pub fn new(radius: f64) -> Result<Self, EngineError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "connection radius must be positive and finite, got {radius}"
            )));
        }
        Ok(Self {
            radius,
            radius_sq: radius * radius,
            cols: 0,
            rows: 0,
            cell_start: Vec::new(),
            cursor: Vec::new(),
            sorted: Vec::new(),
            cell_of: Vec::new(),
        })
    }

    /// Connection radius (and cell size).
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Grid dimensions from the last rebuild.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Buckets `positions` over a `width` × `height` area.
    ///
    /// Points outside the area are clamped into the border cells; clamping
    /// never separates two points closer than the radius by more than one
    /// cell, so no pair is lost.
    pub fn rebuild(&mut self, positions: &[DVec2], width: f64, height: f64) {
        self.cols = cells_along(width, self.radius);
        self.rows = cells_along(height, self.radius);
        let cell_count = self.cols * self.rows;

        self.cell_start.clear();
        self.cell_start.resize(cell_count + 1, 0);
        self.cell_of.clear();
        self.cell_of.reserve(positions.len());

        for p in positions {
            let cell = self.cell_index(*p);
            self.cell_of.push(cell);
            self.cell_start[cell + 1] += 1;
        }

        for c in 0..cell_count {
            self.cell_start[c + 1] += self.cell_start[c];
        }

        self.cursor.clear();
        self.cursor.extend_from_slice(&self.cell_start[..cell_count]);
        self.sorted.clear();
        self.sorted.resize(positions.len(), 0);
        for (i, &cell) in self.cell_of.iter().enumerate() {
            self.sorted[self.cursor[cell]] = i;
            self.cursor[cell] += 1;
        }
    }

    /// Calls `visit(i, j, distance_sq)` once for every pair with `i < j`
    /// closer than the radius.
    ///
    /// `positions` must be the slice passed to the last [`rebuild`](Self::rebuild).
    pub fn for_each_pair<F>(&self, positions: &[DVec2], mut visit: F) -> PairStats
    where
        F: FnMut(usize, usize, f64),
    {
        let mut stats = PairStats::default();
        if positions.len() != self.cell_of.len() {
            return stats;
        }

        for (i, &cell) in self.cell_of.iter().enumerate() {
            let cx = cell % self.cols;
            let cy = cell / self.cols;
            let pi = positions[i];

            for ny in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                    let n = ny * self.cols + nx;
                    for &j in &self.sorted[self.cell_start[n]..self.cell_start[n + 1]] {
                        if j <= i {
                            continue;
                        }
                        stats.candidates += 1;
                        let d2 = pi.distance_squared(positions[j]);
                        if d2 < self.radius_sq {
                            stats.pairs += 1;
                            visit(i, j, d2);
                        }
                    }
                }
            }
        }
        stats
    }

    /// Collects every pair found by [`for_each_pair`](Self::for_each_pair).
    pub fn pairs(&self, positions: &[DVec2]) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.for_each_pair(positions, |i, j, _| out.push((i, j)));
        out
    }

    fn cell_index(&self, p: DVec2) -> usize {
        let cx = axis_cell(p.x, self.radius, self.cols);
        let cy = axis_cell(p.y, self.radius, self.rows);
        cy * self.cols + cx
    }
}

fn cells_along(extent: f64, cell: f64) -> usize {
    if extent.is_finite() && extent > 0.0 {
        ((extent / cell).ceil() as usize).max(1)
    } else {
        1
    }
}

fn axis_cell(coord: f64, cell: f64, count: usize) -> usize {
    // NaN and negatives saturate to 0 in the float-to-int cast.
    ((coord / cell).floor() as usize).min(count - 1)
}

/// Reference O(n²) enumeration of pairs closer than `radius`, `i < j`.
pub fn brute_force_pairs(positions: &[DVec2], radius: f64) -> Vec<(usize, usize)> {
    let r2 = radius * radius;
    let mut out = Vec::new();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if positions[i].distance_squared(positions[j]) < r2 {
                out.push((i, j));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambient_core::Xorshift64;

    fn sorted(mut pairs: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        pairs.sort_unstable();
        pairs
    }

    fn scatter(n: usize, w: f64, h: f64, seed: u64) -> Vec<DVec2> {
        let mut rng = Xorshift64::new(seed);
        (0..n)
            .map(|_| DVec2::new(rng.next_range(0.0, w), rng.next_range(0.0, h)))
            .collect()
    }

    #[test]
    fn rejects_bad_radius() {
        assert!(matches!(NeighborGrid::new(0.0), Err(EngineError::InvalidConfig(_))));
        assert!(NeighborGrid::new(-5.0).is_err());
        assert!(NeighborGrid::new(f64::NAN).is_err());
        assert!(NeighborGrid::new(f64::INFINITY).is_err());
    }

    #[test]
    fn small_known_layout() {
        let positions = vec![
            DVec2::new(10.0, 10.0),
            DVec2::new(15.0, 10.0),  // 5 from #0
            DVec2::new(10.0, 19.9),  // 9.9 from #0
            DVec2::new(50.0, 50.0),  // isolated
            DVec2::new(20.0, 10.0),  // exactly 10 from #0, 5 from #1
        ];
        let mut grid = NeighborGrid::new(10.0).unwrap();
        grid.rebuild(&positions, 64.0, 64.0);
        let got = sorted(grid.pairs(&positions));
        assert_eq!(got, vec![(0, 1), (0, 2), (1, 4)]);
        assert_eq!(got, sorted(brute_force_pairs(&positions, 10.0)));
    }

    #[test]
    fn pairs_across_cell_borders_are_found() {
        // Straddles the x = 100 cell boundary.
        let positions = vec![DVec2::new(99.0, 50.0), DVec2::new(101.0, 50.0)];
        let mut grid = NeighborGrid::new(100.0).unwrap();
        grid.rebuild(&positions, 300.0, 300.0);
        assert_eq!(grid.pairs(&positions), vec![(0, 1)]);
    }

    #[test]
    fn out_of_bounds_points_are_clamped_not_lost() {
        let positions = vec![DVec2::new(-3.0, -3.0), DVec2::new(2.0, 2.0), DVec2::new(205.0, 95.0)];
        let mut grid = NeighborGrid::new(10.0).unwrap();
        grid.rebuild(&positions, 200.0, 100.0);
        assert_eq!(sorted(grid.pairs(&positions)), vec![(0, 1)]);
    }

    #[test]
    fn no_duplicates_and_ordered_indices() {
        let positions = scatter(400, 300.0, 200.0, 3);
        let mut grid = NeighborGrid::new(25.0).unwrap();
        grid.rebuild(&positions, 300.0, 200.0);
        let pairs = grid.pairs(&positions);
        assert!(pairs.iter().all(|&(i, j)| i < j));
        let mut dedup = sorted(pairs.clone());
        dedup.dedup();
        assert_eq!(dedup.len(), pairs.len());
    }

    #[test]
    fn non_finite_positions_never_pair() {
        let positions = vec![DVec2::new(f64::NAN, 1.0), DVec2::new(1.0, 1.0)];
        let mut grid = NeighborGrid::new(10.0).unwrap();
        grid.rebuild(&positions, 100.0, 100.0);
        assert!(grid.pairs(&positions).is_empty());
    }

    #[test]
    fn stale_positions_are_ignored() {
        let mut grid = NeighborGrid::new(10.0).unwrap();
        grid.rebuild(&[DVec2::ZERO, DVec2::ONE], 100.0, 100.0);
        let stats = grid.for_each_pair(&[DVec2::ZERO], |_, _, _| {});
        assert_eq!(stats, PairStats::default());
    }

    #[test]
    fn rebuild_reuses_buffers_between_frames() {
        let mut grid = NeighborGrid::new(50.0).unwrap();
        let a = scatter(300, 500.0, 500.0, 1);
        grid.rebuild(&a, 500.0, 500.0);
        let b = scatter(300, 500.0, 500.0, 2);
        grid.rebuild(&b, 500.0, 500.0);
        assert_eq!(sorted(grid.pairs(&b)), sorted(brute_force_pairs(&b, 50.0)));
    }

    #[test]
    fn five_thousand_particles_match_brute_force_with_far_fewer_checks() {
        let (w, h, r) = (1920.0, 1080.0, 100.0);
        let positions = scatter(5000, w, h, 42);
        let mut grid = NeighborGrid::new(r).unwrap();
        grid.rebuild(&positions, w, h);

        let mut found = Vec::new();
        let stats = grid.for_each_pair(&positions, |i, j, _| found.push((i, j)));
        let expected = sorted(brute_force_pairs(&positions, r));

        assert_eq!(sorted(found), expected);
        assert_eq!(stats.pairs, expected.len());
        let all_pairs = 5000 * 4999 / 2;
        assert!(
            stats.candidates * 10 < all_pairs,
            "{} candidate checks vs {all_pairs} for brute force",
            stats.candidates
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn matches_brute_force(
                points in prop::collection::vec((0.0_f64..400.0, 0.0_f64..300.0), 0..120),
                radius in 1.0_f64..120.0,
            ) {
                let positions: Vec<DVec2> = points.iter().map(|&(x, y)| DVec2::new(x, y)).collect();
                let mut grid = NeighborGrid::new(radius).unwrap();
                grid.rebuild(&positions, 400.0, 300.0);
                prop_assert_eq!(
                    sorted(grid.pairs(&positions)),
                    sorted(brute_force_pairs(&positions, radius))
                );
            }
        }
    }
}
