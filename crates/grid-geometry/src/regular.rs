//! Regular latitude/longitude grids.

use crate::Grid;

/// An equiangular lat/lon grid.
///
/// Point `0` sits at `(lat_min, lon_min)`; indices run west→east, then
/// south→north (`index = y * nx + x`). Longitude wraps for global
/// grids; out-of-range latitudes have no point.
#[derive(Debug, Clone)]
pub struct RegularGrid {
    pub ny: usize,
    pub nx: usize,
    pub lat_min: f64,
    pub lon_min: f64,
    pub dy: f64,
    pub dx: f64,
}

impl RegularGrid {
    pub fn new(ny: usize, nx: usize, lat_min: f64, lon_min: f64, dy: f64, dx: f64) -> Self {
        Self {
            ny,
            nx,
            lat_min,
            lon_min,
            dy,
            dx,
        }
    }

    /// A global grid covers the full longitude circle and wraps.
    fn is_global(&self) -> bool {
        self.nx as f64 * self.dx >= 360.0 - self.dx * 0.5
    }

    pub(crate) fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    pub(crate) fn decompose(&self, index: usize) -> (usize, usize) {
        (index % self.nx, index / self.nx)
    }

    /// Fractional grid position of a coordinate, x wrapped for global
    /// grids, or `None` outside the latitude span.
    pub(crate) fn position(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let y = (lat - self.lat_min) / self.dy;
        if y < -0.5 || y > self.ny as f64 - 0.5 {
            return None;
        }
        let mut x = (lon - self.lon_min) / self.dx;
        if self.is_global() {
            x = x.rem_euclid(360.0 / self.dx);
        } else if x < -0.5 || x > self.nx as f64 - 0.5 {
            return None;
        }
        Some((x, y))
    }
}

impl Grid for RegularGrid {
    fn count(&self) -> usize {
        self.nx * self.ny
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        let (x, y) = self.position(lat, lon)?;
        let mut xi = x.round() as i64;
        let yi = y.round() as i64;
        if self.is_global() {
            xi = xi.rem_euclid(self.nx as i64);
        }
        if xi < 0 || xi >= self.nx as i64 || yi < 0 || yi >= self.ny as i64 {
            return None;
        }
        Some(self.index_of(xi as usize, yi as usize))
    }

    fn coordinates(&self, index: usize) -> (f64, f64) {
        let (x, y) = self.decompose(index);
        let lat = self.lat_min + y as f64 * self.dy;
        let mut lon = self.lon_min + x as f64 * self.dx;
        if lon > 180.0 {
            lon -= 360.0;
        }
        (lat, lon)
    }

    fn neighborhood(&self, index: usize) -> Vec<usize> {
        let (x, y) = self.decompose(index);
        let global = self.is_global();
        let mut out = Vec::with_capacity(9);
        for dy in -1i64..=1 {
            let yy = y as i64 + dy;
            if yy < 0 || yy >= self.ny as i64 {
                continue;
            }
            for dx in -1i64..=1 {
                let mut xx = x as i64 + dx;
                if global {
                    xx = xx.rem_euclid(self.nx as i64);
                } else if xx < 0 || xx >= self.nx as i64 {
                    continue;
                }
                out.push(self.index_of(xx as usize, yy as usize));
            }
        }
        out
    }

    fn cell_size_deg(&self, _index: usize) -> (f64, f64) {
        (self.dy, self.dx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn global_quarter_degree() -> RegularGrid {
        RegularGrid::new(721, 1440, -90.0, -180.0, 0.25, 0.25)
    }

    #[test]
    fn test_find_point_alpine() {
        // An eighth-degree grid resolves the requested coordinate to a
        // cell within half a step.
        let grid = RegularGrid::new(1441, 2880, -90.0, -180.0, 0.125, 0.125);
        let idx = grid.find_point(46.88, 8.67).unwrap();
        let (lat, lon) = grid.coordinates(idx);
        assert!((lat - 46.88).abs() <= 0.125);
        assert!((lon - 8.67).abs() <= 0.125);
    }

    #[test]
    fn test_longitude_wrap() {
        let grid = global_quarter_degree();
        let west = grid.find_point(0.0, -180.0).unwrap();
        let east = grid.find_point(0.0, 180.0).unwrap();
        assert_eq!(west, east);
        let idx = grid.find_point(10.0, 359.9).unwrap();
        let (_, lon) = grid.coordinates(idx);
        assert!(lon.abs() < 0.26);
    }

    #[test]
    fn test_out_of_range_latitude() {
        let grid = RegularGrid::new(100, 100, 40.0, 0.0, 0.1, 0.1);
        assert!(grid.find_point(60.0, 5.0).is_none());
        assert!(grid.find_point(39.0, 5.0).is_none());
        assert!(grid.find_point(45.0, 20.0).is_none());
    }

    #[test]
    fn test_neighborhood_interior_has_nine() {
        let grid = RegularGrid::new(10, 10, 0.0, 0.0, 1.0, 1.0);
        let idx = grid.find_point(5.0, 5.0).unwrap();
        assert_eq!(grid.neighborhood(idx).len(), 9);
        // Corner point loses the out-of-grid neighbors.
        assert_eq!(grid.neighborhood(0).len(), 4);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_within_resolution(
            lat in -89.0f64..89.0,
            lon in -179.9f64..179.9,
        ) {
            let grid = global_quarter_degree();
            let idx = grid.find_point(lat, lon).unwrap();
            let (glat, glon) = grid.coordinates(idx);
            prop_assert!((glat - lat).abs() <= 0.1251);
            let mut dlon = (glon - lon).abs();
            if dlon > 180.0 { dlon = 360.0 - dlon; }
            prop_assert!(dlon <= 0.1251);
        }
    }
}
