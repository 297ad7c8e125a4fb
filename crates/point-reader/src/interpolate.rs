//! Time-axis resampling between native and requested spacing.
//!
//! The archive delivers samples at the model's native step; requests
//! come at their own step. Each interpolation kind defines both
//! directions: disaggregation to a finer step and aggregation to a
//! coarser one. The per-sample loops are allocation-free; one output
//! vector is the only allocation.

use pointcast_common::solar;
use pointcast_common::variable::Interpolation;
use pointcast_common::TimeRange;

/// Resample `data` (the samples of `native`) onto `requested`.
///
/// `coords` is the `(lat, lon)` of the grid point, used only by the
/// solar kinds. Requested samples not derivable from the native window
/// are NaN; the output length is always `requested.count()`.
pub fn resample(
    data: &[f32],
    native: &TimeRange,
    requested: &TimeRange,
    kind: Interpolation,
    coords: (f64, f64),
) -> Vec<f32> {
    debug_assert_eq!(data.len(), native.count());

    if requested.dt == native.dt {
        return align(data, native, requested);
    }
    if requested.dt < native.dt {
        disaggregate(data, native, requested, kind, coords)
    } else {
        aggregate(data, native, requested, kind, coords)
    }
}

/// Same spacing: shift the window, NaN outside.
fn align(data: &[f32], native: &TimeRange, requested: &TimeRange) -> Vec<f32> {
    requested
        .iter()
        .map(|ts| match native.index_of(ts) {
            Some(i) => data[i],
            None => f32::NAN,
        })
        .collect()
}

fn disaggregate(
    data: &[f32],
    native: &TimeRange,
    requested: &TimeRange,
    kind: Interpolation,
    coords: (f64, f64),
) -> Vec<f32> {
    match kind {
        Interpolation::Linear => point_interpolate(data, native, requested, |taps, frac| {
            lerp(taps[1], taps[2], frac)
        }),
        Interpolation::LinearDegrees => point_interpolate(data, native, requested, |taps, frac| {
            lerp_degrees(taps[1], taps[2], frac)
        }),
        Interpolation::Hermite { bounds } => {
            point_interpolate(data, native, requested, move |taps, frac| {
                let v = hermite(taps, frac);
                match bounds {
                    Some((lo, hi)) => v.clamp(lo, hi),
                    None => v,
                }
            })
        }
        Interpolation::Backwards => covering_step(data, native, requested, |v, _, _| v),
        Interpolation::BackwardsSum => {
            let share = requested.dt as f32 / native.dt as f32;
            covering_step(data, native, requested, move |v, _, _| v * share)
        }
        Interpolation::SolarBackwardsAveraged => {
            let nat_cos = solar::zenith_cos_backwards_averaged(native, coords.0, coords.1);
            let req_cos = solar::zenith_cos_backwards_averaged(requested, coords.0, coords.1);
            covering_step(data, native, requested, move |v, i, j| {
                scale_by_zenith(v, nat_cos[i], req_cos[j])
            })
        }
        Interpolation::SolarBackwardsMissingNotAveraged => {
            // Samples are instantaneous at the step end; keep the
            // zenith shape but reference the instant, not the average.
            let req_cos = solar::zenith_cos_backwards_averaged(requested, coords.0, coords.1);
            let nat_instant: Vec<f32> = native
                .iter()
                .map(|ts| solar::zenith_cos(ts, coords.0, coords.1) as f32)
                .collect();
            covering_step(data, native, requested, move |v, i, j| {
                scale_by_zenith(v, nat_instant[i], req_cos[j])
            })
        }
    }
}

fn aggregate(
    data: &[f32],
    native: &TimeRange,
    requested: &TimeRange,
    kind: Interpolation,
    _coords: (f64, f64),
) -> Vec<f32> {
    match kind {
        // Point-sampling kinds read the native sample at the coarser
        // marks directly.
        Interpolation::Linear | Interpolation::LinearDegrees | Interpolation::Hermite { .. } => {
            align(data, native, requested)
        }
        Interpolation::BackwardsSum => member_steps(data, native, requested, |acc, v| acc + v),
        // Backward point/average kinds coarsen to the mean of their
        // member steps.
        Interpolation::Backwards
        | Interpolation::SolarBackwardsAveraged
        | Interpolation::SolarBackwardsMissingNotAveraged => {
            let steps = (requested.dt / native.dt) as f32;
            let mut out = member_steps(data, native, requested, |acc, v| acc + v);
            for v in &mut out {
                *v /= steps;
            }
            out
        }
    }
}

/// Four-tap pointwise interpolation at fractional native positions.
fn point_interpolate<F>(
    data: &[f32],
    native: &TimeRange,
    requested: &TimeRange,
    f: F,
) -> Vec<f32>
where
    F: Fn([f32; 4], f32) -> f32,
{
    requested
        .iter()
        .map(|ts| {
            let pos = (ts - native.start) as f32 / native.dt as f32;
            let i = pos.floor() as i64;
            let frac = pos - i as f32;
            let tap = |k: i64| {
                let idx = i + k - 1;
                if idx < 0 || idx as usize >= data.len() {
                    f32::NAN
                } else {
                    data[idx as usize]
                }
            };
            let taps = [tap(0), tap(1), tap(2), tap(3)];
            if taps[1].is_nan() || taps[2].is_nan() {
                // No bracketing pair, no value.
                return f32::NAN;
            }
            if frac == 0.0 {
                return taps[1];
            }
            f(taps, frac)
        })
        .collect()
}

/// Map each requested sub-step to the native step covering it.
///
/// Backward samples describe `(T - dt, T]`; the covering step of a
/// requested timestamp is the first native sample at or after it. The
/// closure receives `(native value, native index, requested index)`.
fn covering_step<F>(data: &[f32], native: &TimeRange, requested: &TimeRange, f: F) -> Vec<f32>
where
    F: Fn(f32, usize, usize) -> f32,
{
    requested
        .iter()
        .enumerate()
        .map(|(j, ts)| {
            let cover = pointcast_common::time::ceil_to(ts - native.start, native.dt);
            let i = cover / native.dt;
            if i < 0 || i as usize >= data.len() {
                return f32::NAN;
            }
            let v = data[i as usize];
            if v.is_nan() {
                f32::NAN
            } else {
                f(v, i as usize, j)
            }
        })
        .collect()
}

/// Combine the member native steps of each coarse step, NaN if any
/// member is missing.
fn member_steps<F>(data: &[f32], native: &TimeRange, requested: &TimeRange, f: F) -> Vec<f32>
where
    F: Fn(f32, f32) -> f32,
{
    let steps = (requested.dt / native.dt) as usize;
    requested
        .iter()
        .map(|ts| {
            let mut acc = 0.0f32;
            for k in 0..steps {
                let member_ts = ts - (steps - 1 - k) as i64 * native.dt;
                match native.index_of(member_ts) {
                    Some(i) if !data[i].is_nan() => acc = f(acc, data[i]),
                    _ => return f32::NAN,
                }
            }
            acc
        })
        .collect()
}

#[inline]
fn lerp(a: f32, b: f32, frac: f32) -> f32 {
    a + (b - a) * frac
}

/// Linear on the 0–360 circle along the shortest arc.
#[inline]
fn lerp_degrees(a: f32, b: f32, frac: f32) -> f32 {
    let delta = (b - a + 540.0) % 360.0 - 180.0;
    (a + delta * frac).rem_euclid(360.0)
}

/// Cubic hermite through the middle tap pair with central-difference
/// tangents; degrades to linear when an outer tap is missing.
#[inline]
fn hermite(taps: [f32; 4], t: f32) -> f32 {
    let [p0, p1, p2, p3] = taps;
    if p0.is_nan() || p3.is_nan() {
        return lerp(p1, p2, t);
    }
    let m1 = (p2 - p0) * 0.5;
    let m2 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * p1
        + (t3 - 2.0 * t2 + t) * m1
        + (-2.0 * t3 + 3.0 * t2) * p2
        + (t3 - t2) * m2
}

/// Redistribute a backward-averaged radiation sample onto a sub-step.
#[inline]
fn scale_by_zenith(v: f32, reference_cos: f32, sub_cos: f32) -> f32 {
    if reference_cos <= 1e-4 {
        // Night step: no energy to redistribute.
        0.0
    } else {
        (v * sub_cos / reference_cos).max(0.0)
    }
}
