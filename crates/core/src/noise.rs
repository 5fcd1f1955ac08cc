//! 2D simplex noise over a shuffled permutation table.
//!
//! The flow field samples this once per grid cell per frame, so the hot
//! path is allocation-free: the 512-entry permutation table and the 12
//! gradient vectors are built once in the constructor.

use crate::prng::{entropy_seed, Xorshift64};

/// Skew factor for 2D: (sqrt(3) - 1) / 2.
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor for 2D: (3 - sqrt(3)) / 6.
const G2: f64 = 0.211_324_865_405_187_1;
/// Rescales the summed corner contributions into [-1, 1].
const OUTPUT_SCALE: f64 = 70.0;

/// The 12 edge-midpoint gradients of a cube; only x and y are used in 2D.
const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Seeded 2D simplex noise generator.
///
/// Immutable after construction. Two generators built from the same seed
/// return bit-identical values for the same inputs.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    perm: [u8; 512],
}

impl SimplexNoise {
    /// Builds the permutation table by Fisher–Yates shuffling `0..256`
    /// with a generator seeded from `seed`, then doubling it to 512 entries
    /// so lattice hashing never needs a bounds wrap.
    pub fn new(seed: u64) -> Self {
        Self::from_rng(&mut Xorshift64::new(seed))
    }

    /// Builds a generator from a nondeterministic seed.
    pub fn from_entropy() -> Self {
        Self::new(entropy_seed())
    }

    fn from_rng(rng: &mut Xorshift64) -> Self {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }
        rng.shuffle(&mut p);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }
        Self { perm }
    }

    /// Samples the noise at `(x, y)`. Output is continuous and lies in [-1, 1].
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();

        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Which of the two triangles of the skewed cell contains the point.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let perm = &self.perm;
        let gi0 = perm[ii + perm[jj] as usize] as usize % 12;
        let gi1 = perm[ii + i1 + perm[jj + j1] as usize] as usize % 12;
        let gi2 = perm[ii + 1 + perm[jj + 1] as usize] as usize % 12;

        let n0 = corner(gi0, x0, y0);
        let n1 = corner(gi1, x1, y1);
        let n2 = corner(gi2, x2, y2);

        // The scaled sum peaks just below 1.0; the clamp absorbs rounding.
        (OUTPUT_SCALE * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }
}

/// Radial falloff kernel times the gradient dot product for one corner.
#[inline]
fn corner(gi: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    let g = GRAD3[gi];
    t2 * t2 * (g[0] * x + g[1] * y)
}
