//! Projected grids: a map projection plus regular spacing in metres.

use crate::Grid;

/// A map projection between geographic and planar coordinates.
///
/// `forward` maps degrees to projection metres, `inverse` maps back.
/// Implementations are spherical closed forms; each grid declares its
/// own earth radius because producers do not agree on one.
pub trait Projection: Send + Sync {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64);
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);
}

/// A grid defined by a projection, an origin cell, and fixed spacing.
///
/// The origin is given geographically (the first grid point); spacing
/// is in projection metres. Index layout matches the regular grid:
/// `index = y * nx + x` with x fastest.
pub struct ProjectionGrid<P: Projection> {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    projection: P,
    /// Projected coordinates of grid point (0, 0).
    origin: (f64, f64),
}

impl<P: Projection> ProjectionGrid<P> {
    /// Build a grid whose first point (index 0) sits at `(lat1, lon1)`.
    pub fn new(projection: P, lat1: f64, lon1: f64, dx: f64, dy: f64, nx: usize, ny: usize) -> Self {
        let origin = projection.forward(lat1, lon1);
        Self {
            nx,
            ny,
            dx,
            dy,
            projection,
            origin,
        }
    }

    /// Fractional grid position of a coordinate.
    pub fn position(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (x, y) = self.projection.forward(lat, lon);
        ((x - self.origin.0) / self.dx, (y - self.origin.1) / self.dy)
    }

    fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }
}

impl<P: Projection> Grid for ProjectionGrid<P> {
    fn count(&self) -> usize {
        self.nx * self.ny
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        let (x, y) = self.position(lat, lon);
        let xi = x.round() as i64;
        let yi = y.round() as i64;
        if xi < 0 || xi >= self.nx as i64 || yi < 0 || yi >= self.ny as i64 {
            return None;
        }
        Some(self.index_of(xi as usize, yi as usize))
    }

    fn coordinates(&self, index: usize) -> (f64, f64) {
        let x = (index % self.nx) as f64;
        let y = (index / self.nx) as f64;
        self.projection.inverse(
            self.origin.0 + x * self.dx,
            self.origin.1 + y * self.dy,
        )
    }

    fn neighborhood(&self, index: usize) -> Vec<usize> {
        let x = (index % self.nx) as i64;
        let y = (index / self.nx) as i64;
        let mut out = Vec::with_capacity(9);
        for dy in -1i64..=1 {
            let yy = y + dy;
            if yy < 0 || yy >= self.ny as i64 {
                continue;
            }
            for dx in -1i64..=1 {
                let xx = x + dx;
                if xx < 0 || xx >= self.nx as i64 {
                    continue;
                }
                out.push(self.index_of(xx as usize, yy as usize));
            }
        }
        out
    }

    fn cell_size_deg(&self, index: usize) -> (f64, f64) {
        // Derive the local angular cell size from the next point along
        // each axis (or the previous one on the far edges).
        let x = index % self.nx;
        let y = index / self.nx;
        let (lat0, lon0) = self.coordinates(index);
        let xn = if x + 1 < self.nx { index + 1 } else { index - 1 };
        let yn = if y + 1 < self.ny {
            index + self.nx
        } else {
            index - self.nx
        };
        let (lat_x, lon_x) = self.coordinates(xn);
        let (lat_y, lon_y) = self.coordinates(yn);
        let dlon = (lon_x - lon0).abs().max((lon_y - lon0).abs()).max(1e-9);
        let dlat = (lat_y - lat0).abs().max((lat_x - lat0).abs()).max(1e-9);
        (dlat, dlon)
    }
}
