//! Minimum-cost seam search.
//!
//! A vertical seam is one x-coordinate per row, with neighbouring rows at most
//! one column apart. The cheapest seam is found with the classic dynamic program
//! over cumulative energy:
//!
//! `M(0, x) = e(0, x)`
//! `M(y, x) = e(y, x) + min(M(y-1, x-1), M(y-1, x), M(y-1, x+1))`
//!
//! Horizontal seams are found by running the same search on a transposed
//! energy map, so only the vertical case lives here.

use crate::energy::EnergyMap;
use crate::error::{Error, Result};

/// A connected, one-pixel-wide vertical path through an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seam {
    xs: Vec<u32>,
}

impl Seam {
    /// Build a seam from one x-coordinate per row.
    #[must_use]
    pub fn new(xs: Vec<u32>) -> Self {
        Self { xs }
    }

    /// Number of rows the seam spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether the seam spans no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Column of the seam in `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is outside the seam.
    #[must_use]
    pub fn x(&self, row: u32) -> u32 {
        self.xs[row as usize]
    }

    /// The per-row columns.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.xs
    }

    /// Whether every pair of neighbouring rows is at most one column apart.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.xs.windows(2).all(|w| w[0].abs_diff(w[1]) <= 1)
    }

    /// Check that the seam has one column per row and every column lies
    /// inside a `width`-wide image of `height` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] describing the first mismatch.
    pub fn check_fits(&self, width: u32, height: u32) -> Result<()> {
        if self.xs.len() != height as usize {
            return Err(Error::InvalidRequest(format!(
                "seam spans {} rows, image has {height}",
                self.xs.len()
            )));
        }
        if let Some(y) = self.xs.iter().position(|&x| x >= width) {
            return Err(Error::InvalidRequest(format!(
                "seam column {} at row {y} outside width {width}",
                self.xs[y]
            )));
        }
        Ok(())
    }
}

/// Pick the cheapest of the up-to-three parents of column `x`.
///
/// Ties go to the straight-down parent, then to the left one.
fn cheapest_parent(prev: &[f64], x: usize) -> (usize, f64) {
    let mut best_x = x;
    let mut best = prev[x];
    if x > 0 && prev[x - 1] < best {
        best_x = x - 1;
        best = prev[x - 1];
    }
    if x + 1 < prev.len() && prev[x + 1] < best {
        best_x = x + 1;
        best = prev[x + 1];
    }
    (best_x, best)
}

/// Find the minimum-cumulative-energy vertical seam.
///
/// Runs in `O(W*H)` time. Only the previous row of cumulative costs is kept;
/// a `W*H` parent table drives the backtrack. Among equal-cost end points the
/// leftmost wins, so the result is fully deterministic.
#[must_use]
pub fn find_vertical_seam(energy: &EnergyMap) -> Seam {
    let w = energy.width() as usize;
    let h = energy.height() as usize;
    if w == 0 || h == 0 {
        return Seam::new(Vec::new());
    }

    let values = energy.values();
    let mut cost = values[..w].to_vec();
    let mut next = vec![0.0_f64; w];
    let mut parent = vec![0_u32; w * h];

    for y in 1..h {
        let row = &values[y * w..(y + 1) * w];
        let parents = &mut parent[y * w..(y + 1) * w];
        for (x, ((slot, up), &e)) in next
            .iter_mut()
            .zip(parents.iter_mut())
            .zip(row)
            .enumerate()
        {
            let (px, best) = cheapest_parent(&cost, x);
            *slot = e + best;
            #[allow(clippy::cast_possible_truncation)]
            {
                *up = px as u32;
            }
        }
        std::mem::swap(&mut cost, &mut next);
    }

    let mut x = 0;
    for (i, &c) in cost.iter().enumerate().skip(1) {
        if c < cost[x] {
            x = i;
        }
    }

    let mut xs = vec![0_u32; h];
    for y in (0..h).rev() {
        #[allow(clippy::cast_possible_truncation)]
        {
            xs[y] = x as u32;
        }
        if y > 0 {
            x = parent[y * w + x] as usize;
        }
    }

    Seam::new(xs)
}
