//! Solar geometry for radiation variables.
//!
//! Shortwave archive samples are backward averages over the native
//! step. Splitting them to finer steps, or deriving direct-normal and
//! tilted irradiance, needs the solar zenith track at the grid point.
//! Declination and equation of time use the Spencer (1971) series; the
//! rest is standard hour-angle geometry.

use std::f64::consts::PI;

use crate::time::TimeRange;

/// Solar constant in W/m².
pub const SOLAR_CONSTANT: f64 = 1361.0;

const DEG: f64 = PI / 180.0;

/// Instantaneous solar position at a coordinate.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Cosine of the zenith angle, clamped to 0 below the horizon.
    pub zenith_cos: f64,
    /// Azimuth in degrees from north, clockwise.
    pub azimuth_deg: f64,
}

/// Fractional-year angle in radians for a unix timestamp.
fn year_angle(t: i64) -> f64 {
    // Day-of-year with fractional hours; the 365-day year of the
    // Spencer fit is accurate to well under the archive's resolution.
    let days = (t as f64) / 86_400.0;
    let doy = days.rem_euclid(365.25);
    2.0 * PI * doy / 365.0
}

/// Solar declination in radians (Spencer 1971).
pub fn declination(t: i64) -> f64 {
    let b = year_angle(t);
    0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin() - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin()
}

/// Equation of time in minutes (Spencer 1971).
pub fn equation_of_time(t: i64) -> f64 {
    let b = year_angle(t);
    229.18
        * (0.000075 + 0.001868 * b.cos() - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin())
}

/// Eccentricity-corrected extraterrestrial normal irradiance in W/m².
pub fn extraterrestrial_normal(t: i64) -> f64 {
    let b = year_angle(t);
    SOLAR_CONSTANT
        * (1.00011 + 0.034221 * b.cos() + 0.00128 * b.sin() + 0.000719 * (2.0 * b).cos()
            + 0.000077 * (2.0 * b).sin())
}

/// Hour angle in radians at a timestamp and longitude.
fn hour_angle(t: i64, lon: f64) -> f64 {
    let ut_h = ((t.rem_euclid(86_400)) as f64) / 3600.0;
    let solar_h = ut_h + lon / 15.0 + equation_of_time(t) / 60.0;
    (15.0 * (solar_h - 12.0)) * DEG
}

/// Cosine of the solar zenith at an instant, clamped to 0 at night.
pub fn zenith_cos(t: i64, lat: f64, lon: f64) -> f64 {
    let decl = declination(t);
    let phi = lat * DEG;
    let omega = hour_angle(t, lon);
    (phi.sin() * decl.sin() + phi.cos() * decl.cos() * omega.cos()).max(0.0)
}

/// Solar position (zenith cosine and azimuth) at an instant.
pub fn position(t: i64, lat: f64, lon: f64) -> SolarPosition {
    let decl = declination(t);
    let phi = lat * DEG;
    let omega = hour_angle(t, lon);
    let cos_z = (phi.sin() * decl.sin() + phi.cos() * decl.cos() * omega.cos()).max(0.0);

    let sin_elev = cos_z;
    let cos_elev = (1.0 - sin_elev * sin_elev).sqrt();
    let azimuth_deg = if cos_elev.abs() < 1e-9 || phi.cos().abs() < 1e-9 {
        180.0
    } else {
        let cos_az = ((decl.sin() - sin_elev * phi.sin()) / (cos_elev * phi.cos()))
            .clamp(-1.0, 1.0);
        let az = cos_az.acos() / DEG;
        if omega > 0.0 {
            360.0 - az
        } else {
            az
        }
    };

    SolarPosition {
        zenith_cos: cos_z,
        azimuth_deg,
    }
}

/// Backward-averaged zenith cosine for every step of `range`.
///
/// Sample `i` is the mean of `max(0, cos θ)` over the interval
/// `(t_i - dt, t_i]`, the same convention the radiation archive uses.
/// Integration is by midpoint sub-sampling at ≤ 600 s.
pub fn zenith_cos_backwards_averaged(range: &TimeRange, lat: f64, lon: f64) -> Vec<f32> {
    let substeps = ((range.dt + 599) / 600).max(4);
    let sub = range.dt as f64 / substeps as f64;
    range
        .iter()
        .map(|ts| {
            let t0 = ts - range.dt;
            let mut acc = 0.0;
            for i in 0..substeps {
                let t = t0 as f64 + (i as f64 + 0.5) * sub;
                acc += zenith_cos(t as i64, lat, lon);
            }
            (acc / substeps as f64) as f32
        })
        .collect()
}

/// Backward-averaged extraterrestrial horizontal irradiance in W/m² for
/// every step of `range`. The theoretical ceiling for shortwave
/// radiation at the coordinate.
pub fn extraterrestrial_backwards_averaged(range: &TimeRange, lat: f64, lon: f64) -> Vec<f32> {
    zenith_cos_backwards_averaged(range, lat, lon)
        .iter()
        .zip(range.iter())
        .map(|(cos_avg, ts)| {
            let e0 = extraterrestrial_normal(ts - range.dt / 2);
            (*cos_avg as f64 * e0) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-20T12:00:00Z, close to the March equinox.
    const EQUINOX_NOON: i64 = 1_710_936_000;
    // 2024-06-20T12:00:00Z, close to the June solstice.
    const SOLSTICE_NOON: i64 = 1_718_884_800;

    #[test]
    fn test_declination_bounds() {
        assert!(declination(EQUINOX_NOON).abs() < 2.0 * DEG);
        let d = declination(SOLSTICE_NOON);
        assert!(d > 22.0 * DEG && d < 24.0 * DEG);
    }

    #[test]
    fn test_zenith_overhead_at_equator_equinox() {
        let cos_z = zenith_cos(EQUINOX_NOON, 0.0, 0.0);
        assert!(cos_z > 0.98, "sun nearly overhead, got {}", cos_z);
    }

    #[test]
    fn test_night_is_zero() {
        // Local midnight at lon 0.
        let midnight = EQUINOX_NOON + 12 * 3600;
        assert_eq!(zenith_cos(midnight, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_backwards_average_length_and_range() {
        let range = TimeRange::new(EQUINOX_NOON, EQUINOX_NOON + 24 * 3600, 3600);
        let avg = zenith_cos_backwards_averaged(&range, 47.0, 8.0);
        assert_eq!(avg.len(), range.count());
        assert!(avg.iter().all(|c| (0.0..=1.0).contains(c)));
        // A full day must contain both lit and dark steps.
        assert!(avg.iter().any(|&c| c > 0.1));
        assert!(avg.iter().any(|&c| c == 0.0));
    }

    #[test]
    fn test_extraterrestrial_ceiling() {
        let range = TimeRange::new(EQUINOX_NOON - 3600, EQUINOX_NOON + 3600, 3600);
        let e = extraterrestrial_backwards_averaged(&range, 0.0, 0.0);
        // Near-overhead sun: close to the solar constant, never above it.
        assert!(e.iter().all(|&v| v <= SOLAR_CONSTANT as f32 * 1.05));
        assert!(e[1] > 1200.0);
    }

    #[test]
    fn test_azimuth_morning_east() {
        // 08:00 UTC at lon 0, equator: sun in the east (~90°).
        let morning = EQUINOX_NOON - 4 * 3600;
        let pos = position(morning, 0.0, 0.0);
        assert!(
            pos.azimuth_deg > 60.0 && pos.azimuth_deg < 120.0,
            "azimuth {}",
            pos.azimuth_deg
        );
    }
}
