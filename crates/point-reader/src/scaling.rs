//! Output scaling and elevation correction.

use pointcast_common::Variable;

/// Standard-atmosphere lapse rate in K/m.
const LAPSE_RATE: f32 = 0.0065;

/// Convert decoded storage values to the variable's output unit
/// (Pa → hPa, geopotential → metres). In place, multiply-add.
pub fn apply_storage_transform(data: &mut [f32], variable: &Variable) {
    let (mul, add) = variable.storage_transform();
    if mul == 1.0 && add == 0.0 {
        return;
    }
    for v in data.iter_mut() {
        *v = *v * mul + add;
    }
}

/// Lapse-rate correction from model elevation to target elevation.
///
/// Applies only when both elevations are finite and differ; the caller
/// gates on `Variable::is_elevation_correctable`.
pub fn apply_elevation_correction(data: &mut [f32], model_elevation: f32, target_elevation: f32) {
    if !model_elevation.is_finite() || !target_elevation.is_finite() {
        return;
    }
    let delta = (model_elevation - target_elevation) * LAPSE_RATE;
    if delta == 0.0 {
        return;
    }
    for v in data.iter_mut() {
        *v += delta;
    }
}
