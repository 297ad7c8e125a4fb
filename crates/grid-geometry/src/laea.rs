//! Lambert azimuthal equal-area projection.
//!
//! Used by the Nordic high-resolution domains. Spherical form after
//! Snyder, centred on a reference latitude/longitude.

use std::f64::consts::PI;

use crate::projection::Projection;

#[derive(Debug, Clone)]
pub struct LambertAzimuthalProjection {
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    radius: f64,
}

impl LambertAzimuthalProjection {
    pub fn new(lat0_deg: f64, lon0_deg: f64, radius: f64) -> Self {
        let lat0 = lat0_deg * PI / 180.0;
        Self {
            lon0: lon0_deg * PI / 180.0,
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
            radius,
        }
    }
}

impl Projection for LambertAzimuthalProjection {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat * to_rad;
        let dlon = lon * to_rad - self.lon0;

        let k = (2.0
            / (1.0 + self.sin_lat0 * lat.sin() + self.cos_lat0 * lat.cos() * dlon.cos()))
        .sqrt();
        let x = self.radius * k * lat.cos() * dlon.sin();
        let y = self.radius * k
            * (self.cos_lat0 * lat.sin() - self.sin_lat0 * lat.cos() * dlon.cos());
        (x, y)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let rho = (x * x + y * y).sqrt();
        if rho < 1e-9 {
            return (self.sin_lat0.asin() * to_deg, self.lon0 * to_deg);
        }
        let c = 2.0 * (rho / (2.0 * self.radius)).asin();

        let lat = (c.cos() * self.sin_lat0 + y * c.sin() * self.cos_lat0 / rho).asin();
        let lon = self.lon0
            + (x * c.sin()).atan2(rho * self.cos_lat0 * c.cos() - y * self.sin_lat0 * c.sin());

        (lat * to_deg, lon * to_deg)
    }
}
