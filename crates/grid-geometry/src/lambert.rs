//! Lambert Conformal Conic projection.
//!
//! Used by regional models over mid-latitudes (HRRR among them). A cone
//! tangent or secant to the sphere is unrolled onto the plane; the cone
//! constant n comes from the standard parallels.

use std::f64::consts::PI;

use crate::projection::Projection;

/// Lambert conformal conic on a sphere.
///
/// Parameters are the central meridian λ0, the reference latitude ϕ0,
/// the standard parallels ϕ1/ϕ2, and the earth radius. Producers
/// declare their own radius; there is no shared default.
#[derive(Debug, Clone)]
pub struct LambertConformalProjection {
    lon0: f64,
    radius: f64,
    /// Cone constant.
    n: f64,
    f: f64,
    /// Radial distance of the reference latitude.
    rho0: f64,
}

impl LambertConformalProjection {
    pub fn new(lon0_deg: f64, lat0_deg: f64, lat1_deg: f64, lat2_deg: f64, radius: f64) -> Self {
        let to_rad = PI / 180.0;
        let lat0 = lat0_deg * to_rad;
        let latin1 = lat1_deg * to_rad;
        let latin2 = lat2_deg * to_rad;

        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone.
            latin1.sin()
        } else {
            // Secant cone.
            (latin1.cos() / latin2.cos()).ln()
                / ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln()
        };

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0: lon0_deg * to_rad,
            radius,
            n,
            f,
            rho0,
        }
    }

    fn normalize_dlon(&self, lon: f64) -> f64 {
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }
        dlon
    }
}

impl Projection for LambertConformalProjection {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat * to_rad;
        let dlon = self.normalize_dlon(lon * to_rad);

        let rho = self.radius * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;

        let rho = (x * x + (self.rho0 - y) * (self.rho0 - y)).sqrt();
        let rho = if self.n < 0.0 { -rho } else { rho };
        let theta = (x / (self.rho0 - y)).atan();

        let lat = 2.0 * ((self.radius * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0;
        let lon = self.lon0 + theta / self.n;

        (lat * to_deg, lon * to_deg)
    }
}
