//! Shortwave radiation decomposition and transposition.
//!
//! The archive carries global (and sometimes diffuse) horizontal
//! irradiance as backward averages. Splitting global into its direct
//! and diffuse parts uses the Erbs clearness-index correlation; tilted
//! irradiance composes the parts with the Hay–Davies sky model.

use pointcast_common::solar;
use pointcast_common::TimeRange;

/// Ground albedo assumed for the reflected component.
const ALBEDO: f32 = 0.2;
/// Zenith cosine below which beam geometry is numerically meaningless.
const MIN_COS_ZENITH: f32 = 0.01;

/// Diffuse fraction of global radiation from the clearness index
/// (Erbs 1982).
#[inline]
pub fn diffuse_fraction(clearness_index: f32) -> f32 {
    let kt = clearness_index.clamp(0.0, 1.0);
    if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.8 {
        0.9511 - 0.1604 * kt + 4.388 * kt * kt - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    }
}

/// Diffuse horizontal irradiance estimated from global shortwave.
///
/// Used when a domain does not archive diffuse radiation itself.
pub fn diffuse_from_shortwave(shortwave: &[f32], range: &TimeRange, lat: f64, lon: f64) -> Vec<f32> {
    let extraterrestrial = solar::extraterrestrial_backwards_averaged(range, lat, lon);
    shortwave
        .iter()
        .zip(extraterrestrial)
        .map(|(&ghi, e0)| {
            if ghi.is_nan() {
                f32::NAN
            } else if e0 <= 0.0 || ghi <= 0.0 {
                0.0
            } else {
                ghi * diffuse_fraction(ghi / e0)
            }
        })
        .collect()
}

/// Direct horizontal = global − diffuse, floored at zero.
pub fn direct_radiation(shortwave: &[f32], diffuse: &[f32]) -> Vec<f32> {
    shortwave
        .iter()
        .zip(diffuse)
        .map(|(&ghi, &dhi)| (ghi - dhi).max(0.0))
        .collect()
}

/// Direct normal irradiance from direct horizontal via the
/// backward-averaged zenith cosine. Zero below the horizon cutoff.
pub fn direct_normal_irradiance(
    direct: &[f32],
    range: &TimeRange,
    lat: f64,
    lon: f64,
) -> Vec<f32> {
    let cos_zenith = solar::zenith_cos_backwards_averaged(range, lat, lon);
    direct
        .iter()
        .zip(cos_zenith)
        .map(|(&dh, cz)| {
            if dh.is_nan() {
                f32::NAN
            } else if cz <= MIN_COS_ZENITH {
                0.0
            } else {
                dh / cz
            }
        })
        .collect()
}

/// Global irradiance on a tilted plane (Hay–Davies).
///
/// `tilt` in degrees from horizontal; `azimuth` in degrees, 0 = south,
/// positive towards west. The sky-diffuse term mixes a circumsolar
/// part, weighted by the anisotropy index, with an isotropic dome.
pub fn global_tilted_irradiance(
    direct: &[f32],
    diffuse: &[f32],
    range: &TimeRange,
    lat: f64,
    lon: f64,
    tilt: f32,
    azimuth: f32,
) -> Vec<f32> {
    let beta = (tilt as f64).to_radians();
    // Panel azimuth measured like the solar azimuth: from north.
    let panel_az = (azimuth as f64 + 180.0).to_radians();
    let cos_beta = beta.cos();
    let sin_beta = beta.sin();

    range
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            let dh = direct[i];
            let dhi = diffuse[i];
            if dh.is_nan() || dhi.is_nan() {
                return f32::NAN;
            }
            let ghi = dh + dhi;
            // Geometry at the midpoint of the backward interval.
            let pos = solar::position(ts - range.dt / 2, lat, lon);
            let cos_z = pos.zenith_cos;
            if cos_z <= MIN_COS_ZENITH as f64 {
                // Only the isotropic dome and ground reflection see a
                // set sun.
                let iso = dhi * ((1.0 + cos_beta) / 2.0) as f32;
                let ground = ghi * ALBEDO * ((1.0 - cos_beta) / 2.0) as f32;
                return iso + ground;
            }
            let sin_z = (1.0 - cos_z * cos_z).sqrt();
            let sun_az = pos.azimuth_deg.to_radians();
            let cos_incidence =
                (cos_beta * cos_z + sin_beta * sin_z * (sun_az - panel_az).cos()).max(0.0);

            let rb = (cos_incidence / cos_z) as f32;
            let dni = dh / cos_z as f32;
            // Anisotropy index: beam transmittance of the atmosphere.
            let ai = (dni / solar::extraterrestrial_normal(ts) as f32).clamp(0.0, 1.0);

            let beam = dh * rb;
            let sky = dhi * (ai * rb + (1.0 - ai) * ((1.0 + cos_beta) / 2.0) as f32);
            let ground = ghi * ALBEDO * ((1.0 - cos_beta) / 2.0) as f32;
            (beam + sky + ground).max(0.0)
        })
        .collect()
}
