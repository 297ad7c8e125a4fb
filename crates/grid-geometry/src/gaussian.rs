//! Octahedral reduced Gaussian grids.
//!
//! The global spectral model lays its points on Gaussian-quadrature
//! latitudes with a per-row point count that shrinks towards the poles:
//! 20 points on the polar rows, growing by 4 per row to 5136 at the
//! equator. Row latitudes are the arcsines of the Legendre roots, so
//! the table is computed once by Newton iteration and shared.

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::Grid;

/// Number of rows of the O1280 grid.
const O1280_ROWS: usize = 2560;

/// An octahedral reduced Gaussian grid.
///
/// Only the O1280 resolution is registered today; the row arithmetic is
/// generic over the row count should a coarser member ever be added.
#[derive(Debug, Clone, Copy)]
pub struct GaussianGrid {
    nrows: usize,
}

struct RowTable {
    /// Row latitudes in degrees, north to south.
    latitudes: Vec<f64>,
    /// Flat index of the first point of each row, plus the total count.
    offsets: Vec<usize>,
}

static O1280_TABLE: OnceLock<RowTable> = OnceLock::new();

impl GaussianGrid {
    /// The O1280 octahedral grid (6 599 680 points).
    pub fn o1280() -> Self {
        Self { nrows: O1280_ROWS }
    }

    /// Points in row `y` (row 0 is the northernmost).
    pub fn nx_of(&self, y: usize) -> usize {
        20 + 4 * y.min(self.nrows - 1 - y)
    }

    fn table(&self) -> &'static RowTable {
        debug_assert_eq!(self.nrows, O1280_ROWS);
        O1280_TABLE.get_or_init(|| {
            let latitudes = gauss_latitudes(O1280_ROWS);
            let grid = GaussianGrid { nrows: O1280_ROWS };
            let mut offsets = Vec::with_capacity(O1280_ROWS + 1);
            let mut acc = 0usize;
            for y in 0..O1280_ROWS {
                offsets.push(acc);
                acc += grid.nx_of(y);
            }
            offsets.push(acc);
            RowTable { latitudes, offsets }
        })
    }

    /// Row whose Gaussian latitude is nearest to `lat`.
    fn nearest_row(&self, lat: f64) -> usize {
        let lats = &self.table().latitudes;
        // Latitudes descend; find the first row at or below the query.
        let below = lats.partition_point(|&l| l > lat);
        if below == 0 {
            return 0;
        }
        if below >= lats.len() {
            return lats.len() - 1;
        }
        if (lats[below - 1] - lat).abs() <= (lats[below] - lat).abs() {
            below - 1
        } else {
            below
        }
    }

    fn row_of_index(&self, index: usize) -> usize {
        let offsets = &self.table().offsets;
        offsets.partition_point(|&o| o <= index) - 1
    }

    fn index_of(&self, y: usize, j: usize) -> usize {
        self.table().offsets[y] + j
    }

    /// Nearest point of row `y` to a longitude, with wrap.
    fn nearest_in_row(&self, y: usize, lon: f64) -> usize {
        let nx = self.nx_of(y);
        (lon.rem_euclid(360.0) / 360.0 * nx as f64).round() as usize % nx
    }
}

impl Grid for GaussianGrid {
    fn count(&self) -> usize {
        *self.table().offsets.last().unwrap()
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let y = self.nearest_row(lat);
        Some(self.index_of(y, self.nearest_in_row(y, lon)))
    }

    fn coordinates(&self, index: usize) -> (f64, f64) {
        let y = self.row_of_index(index);
        let j = index - self.table().offsets[y];
        let lat = self.table().latitudes[y];
        let mut lon = 360.0 * j as f64 / self.nx_of(y) as f64;
        if lon > 180.0 {
            lon -= 360.0;
        }
        (lat, lon)
    }

    fn neighborhood(&self, index: usize) -> Vec<usize> {
        let y = self.row_of_index(index);
        let j = index - self.table().offsets[y];
        let nx = self.nx_of(y);
        let lon_center = 360.0 * (j as f64 + 0.5) / nx as f64;

        let mut out = Vec::with_capacity(9);
        for row in [y.wrapping_sub(1), y, y + 1] {
            if row >= self.nrows {
                continue;
            }
            let rnx = self.nx_of(row);
            // Align on longitude; the neighbor rows have different
            // point counts.
            let center = (lon_center / 360.0 * rnx as f64 - 0.5).round() as i64;
            for dx in -1i64..=1 {
                let jj = (center + dx).rem_euclid(rnx as i64) as usize;
                out.push(self.index_of(row, jj));
            }
        }
        out
    }

    fn cell_size_deg(&self, index: usize) -> (f64, f64) {
        let y = self.row_of_index(index);
        (180.0 / self.nrows as f64, 360.0 / self.nx_of(y) as f64)
    }
}

/// Latitudes of the Gaussian quadrature rows in degrees, north first.
///
/// Roots of the Legendre polynomial Pₙ by Newton iteration from the
/// Abramowitz & Stegun initial guess; the roots are symmetric, so only
/// the northern half is iterated.
fn gauss_latitudes(n: usize) -> Vec<f64> {
    let mut lats = vec![0.0f64; n];
    let half = (n + 1) / 2;
    for k in 0..half {
        let mut x = (PI * (k as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            let step = p / dp;
            x -= step;
            if step.abs() < 1e-15 {
                break;
            }
        }
        let lat = x.asin().to_degrees();
        lats[k] = lat;
        lats[n - 1 - k] = -lat;
    }
    lats
}

/// Pₙ(x) and Pₙ′(x) via the three-term recurrence.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0f64;
    let mut p = x;
    for k in 2..=n {
        let k = k as f64;
        let p_next = ((2.0 * k - 1.0) * x * p - (k - 1.0) * p_prev) / k;
        p_prev = p;
        p = p_next;
    }
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}
