//! Polar stereographic projection.
//!
//! Spherical form with a true-scale parallel, as used by polar regional
//! domains. The south-polar aspect mirrors the sign of latitude.

use std::f64::consts::PI;

use crate::projection::Projection;

#[derive(Debug, Clone)]
pub struct StereographicProjection {
    lon0: f64,
    /// Scale factor from the true-scale latitude.
    k0: f64,
    radius: f64,
    south: bool,
}

impl StereographicProjection {
    /// `lat_ts` is the latitude of true scale (commonly ±60°); its sign
    /// selects the polar aspect.
    pub fn new(lon0_deg: f64, lat_ts_deg: f64, radius: f64) -> Self {
        let south = lat_ts_deg < 0.0;
        let lat_ts = lat_ts_deg.abs() * PI / 180.0;
        Self {
            lon0: lon0_deg * PI / 180.0,
            k0: (1.0 + lat_ts.sin()) / 2.0,
            radius,
            south,
        }
    }
}

impl Projection for StereographicProjection {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat_signed = if self.south { -lat } else { lat };
        let lat = lat_signed * to_rad;
        let dlon = lon * to_rad - self.lon0;

        let rho = 2.0 * self.radius * self.k0 * (PI / 4.0 - lat / 2.0).tan();
        let x = rho * dlon.sin();
        let y = -rho * dlon.cos();
        if self.south {
            (x, -y)
        } else {
            (x, y)
        }
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let y = if self.south { -y } else { y };
        let rho = (x * x + y * y).sqrt();
        let lat = PI / 2.0 - 2.0 * (rho / (2.0 * self.radius * self.k0)).atan();
        let lon = self.lon0 + x.atan2(-y);

        let lat_signed = if self.south { -lat } else { lat };
        (lat_signed * to_deg, lon * to_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pole_maps_to_origin() {
        let proj = StereographicProjection::new(-35.0, 60.0, 6_371_229.0);
        let (x, y) = proj.forward(90.0, 0.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_north(lat in 40.0f64..89.0, lon in -180.0f64..180.0) {
            let proj = StereographicProjection::new(-35.0, 60.0, 6_371_229.0);
            let (x, y) = proj.forward(lat, lon);
            let (lat2, lon2) = proj.inverse(x, y);
            prop_assert!((lat2 - lat).abs() < 1e-4);
            let mut dlon = (lon2 - lon).abs();
            if dlon > 180.0 { dlon = 360.0 - dlon; }
            prop_assert!(dlon < 1e-4);
        }

        #[test]
        fn prop_roundtrip_south(lat in -89.0f64..-40.0, lon in -180.0f64..180.0) {
            let proj = StereographicProjection::new(10.0, -60.0, 6_371_229.0);
            let (x, y) = proj.forward(lat, lon);
            let (lat2, lon2) = proj.inverse(x, y);
            prop_assert!((lat2 - lat).abs() < 1e-4);
            let mut dlon = (lon2 - lon).abs();
            if dlon > 180.0 { dlon = 360.0 - dlon; }
            prop_assert!(dlon < 1e-4);
        }
    }
}
