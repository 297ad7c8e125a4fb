//! Rotated latitude/longitude grids.
//!
//! Regional models tilt the pole so their domain straddles the rotated
//! equator, where cells are most uniform. The transform is two
//! rotations: about the z-axis by the pole longitude, then about the
//! y-axis to lift the pole into place.

use std::f64::consts::PI;

use crate::regular::RegularGrid;
use crate::Grid;

/// A regular grid expressed in rotated coordinates.
///
/// `pole_lat`/`pole_lon` give the geographic position of the rotated
/// north pole; the inner grid spans rotated coordinates.
#[derive(Debug, Clone)]
pub struct RotatedGrid {
    inner: RegularGrid,
    pole_lat: f64,
    pole_lon: f64,
}

impl RotatedGrid {
    pub fn new(pole_lat: f64, pole_lon: f64, inner: RegularGrid) -> Self {
        Self {
            inner,
            pole_lat,
            pole_lon,
        }
    }

    /// Geographic → rotated coordinates, in degrees.
    pub fn rotate(&self, lat: f64, lon: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let (x, y, z) = unit_vector(lat * to_rad, lon * to_rad);
        // Rz(-pole_lon), Ry(pole_lat - 90°), then a half turn so the
        // rotated meridian 0 faces the domain, not the pole meridian.
        let (x, y) = rotate_z(x, y, -self.pole_lon * to_rad);
        let (x, z) = rotate_y(x, z, (self.pole_lat - 90.0) * to_rad);
        to_latlon(-x, -y, z)
    }

    /// Rotated → geographic coordinates, in degrees.
    pub fn derotate(&self, lat: f64, lon: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let (x, y, z) = unit_vector(lat * to_rad, lon * to_rad);
        let (x, y) = (-x, -y);
        let (x, z) = rotate_y(x, z, (90.0 - self.pole_lat) * to_rad);
        let (x, y) = rotate_z(x, y, self.pole_lon * to_rad);
        to_latlon(x, y, z)
    }
}

fn unit_vector(lat: f64, lon: f64) -> (f64, f64, f64) {
    (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

fn rotate_z(x: f64, y: f64, angle: f64) -> (f64, f64) {
    (
        x * angle.cos() - y * angle.sin(),
        x * angle.sin() + y * angle.cos(),
    )
}

fn rotate_y(x: f64, z: f64, angle: f64) -> (f64, f64) {
    (
        x * angle.cos() + z * angle.sin(),
        -x * angle.sin() + z * angle.cos(),
    )
}

fn to_latlon(x: f64, y: f64, z: f64) -> (f64, f64) {
    let to_deg = 180.0 / PI;
    (z.clamp(-1.0, 1.0).asin() * to_deg, y.atan2(x) * to_deg)
}

impl Grid for RotatedGrid {
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        let (rlat, rlon) = self.rotate(lat, lon);
        self.inner.find_point(rlat, rlon)
    }

    fn coordinates(&self, index: usize) -> (f64, f64) {
        let (rlat, rlon) = self.inner.coordinates(index);
        self.derotate(rlat, rlon)
    }

    fn neighborhood(&self, index: usize) -> Vec<usize> {
        self.inner.neighborhood(index)
    }

    fn cell_size_deg(&self, index: usize) -> (f64, f64) {
        // Cell extents hold in rotated space; close enough geographically
        // away from the rotated pole, which domains never reach.
        self.inner.cell_size_deg(index)
    }
}
