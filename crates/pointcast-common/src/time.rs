//! Time-range algebra for chunked time-series reads.
//!
//! All arithmetic is integer seconds since the Unix epoch, UTC only.
//! Time zones are a display concern handled outside the core. `chrono`
//! appears only at the boundary, to build ranges from calendar times in
//! tests and configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::variable::Interpolation;

/// Round `t` down to a multiple of `d`.
#[inline]
pub fn floor_to(t: i64, d: i64) -> i64 {
    t.div_euclid(d) * d
}

/// Round `t` up to a multiple of `d`.
#[inline]
pub fn ceil_to(t: i64, d: i64) -> i64 {
    -((-t).div_euclid(d)) * d
}

/// A closed-start/open-end read window `[start, end)` with a sample
/// spacing of `dt` seconds.
///
/// Sample timestamps are `start, start + dt, …, end - dt`. A range is
/// well formed when `start <= end`, `dt > 0`, and `end - start` is a
/// multiple of `dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// First sample timestamp, seconds since epoch.
    pub start: i64,
    /// Exclusive end, seconds since epoch.
    pub end: i64,
    /// Sample spacing in seconds.
    pub dt: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64, dt: i64) -> Self {
        debug_assert!(dt > 0, "dt must be positive");
        debug_assert!(start <= end, "start must not exceed end");
        Self { start, end, dt }
    }

    /// Build a range from calendar bounds.
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>, dt: i64) -> Self {
        Self::new(start.timestamp(), end.timestamp(), dt)
    }

    /// Number of samples in the half-open window.
    pub fn count(&self) -> usize {
        ((self.end - self.start) / self.dt) as usize
    }

    /// Iterate the sample timestamps.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (self.start..self.end).step_by(self.dt as usize)
    }

    /// Index of the sample at timestamp `t`, if `t` is one.
    pub fn index_of(&self, t: i64) -> Option<usize> {
        if t < self.start || t >= self.end || (t - self.start) % self.dt != 0 {
            return None;
        }
        Some(((t - self.start) / self.dt) as usize)
    }

    /// Whether every sample of `other` is also a sample of `self`.
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && other.dt % self.dt == 0
            && (other.start - self.start) % self.dt == 0
    }

    /// Snap both bounds outward to multiples of `dt`, keeping the spacing.
    pub fn aligned_to(&self, dt: i64) -> TimeRange {
        TimeRange::new(floor_to(self.start, dt), ceil_to(self.end, dt), dt)
    }

    /// The native-resolution window a model must deliver so this range
    /// can be interpolated from it.
    ///
    /// The start snaps down and the end snaps up to `model_dt`
    /// boundaries, always keeping the bracketing sample past the open
    /// end; each side then widens by `model_dt * (padding - 1)` where
    /// `padding` is the interpolation kernel's one-sided sample count
    /// (1 for linear and the backward kinds, 2 for hermite and the
    /// solar kinds).
    pub fn for_interpolation_to(&self, model_dt: i64, kind: Interpolation) -> TimeRange {
        let pad = kind.padding() as i64;
        TimeRange::new(
            floor_to(self.start, model_dt) - model_dt * (pad - 1),
            ceil_to(self.end, model_dt) + model_dt * pad,
            model_dt,
        )
    }

    /// The native-resolution window needed to aggregate up to this
    /// range's coarser `dt`.
    ///
    /// Backward (summing/averaging) kinds need the member steps of each
    /// coarse step, so the start extends back by `model_dt * (steps - 1)`
    /// with `steps = dt / model_dt`. Point-sampling kinds read the same
    /// window at native spacing.
    pub fn for_aggregation_to(&self, model_dt: i64, kind: Interpolation) -> TimeRange {
        let aligned = self.aligned_to(model_dt);
        if !kind.is_backwards() || self.dt <= model_dt {
            return aligned;
        }
        let steps = self.dt / model_dt;
        TimeRange::new(aligned.start - model_dt * (steps - 1), aligned.end, model_dt)
    }

    /// The native window for a read at this range's `dt` from a model
    /// with spacing `model_dt`, whichever direction the resampling goes.
    pub fn expanded_to(&self, model_dt: i64, kind: Interpolation) -> TimeRange {
        if self.dt == model_dt {
            *self
        } else if self.dt < model_dt {
            self.for_interpolation_to(model_dt, kind)
        } else {
            self.for_aggregation_to(model_dt, kind)
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_ts = |t: i64| {
            DateTime::<Utc>::from_timestamp(t, 0)
                .map(|d| d.format("%Y-%m-%dT%H:%M").to_string())
                .unwrap_or_else(|| t.to_string())
        };
        write!(
            f,
            "{}/{} dt={}s",
            fmt_ts(self.start),
            fmt_ts(self.end),
            self.dt
        )
    }
}

/// Per-read options carried beside the time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadSettings {
    /// Ensemble member routed to a disjoint file family. 0 is the
    /// control/deterministic member.
    pub ensemble_member: usize,
    /// Ensemble member stored as a sub-dimension inside one file.
    pub ensemble_member_level: Option<usize>,
    /// Read data shifted back by whole days (0 = the requested window).
    pub previous_day: usize,
}

impl ReadSettings {
    /// Settings for a plain deterministic read.
    pub fn deterministic() -> Self {
        Self::default()
    }

    /// Settings selecting an ensemble member in a packed-member file.
    pub fn member_level(level: usize) -> Self {
        Self {
            ensemble_member_level: Some(level),
            ..Self::default()
        }
    }

    /// The shift in seconds implied by `previous_day`.
    pub fn time_shift(&self) -> i64 {
        self.previous_day as i64 * 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: i64 = 3600;

    #[test]
    fn test_count_and_iter() {
        let t = TimeRange::new(0, 12 * H, H);
        assert_eq!(t.count(), 12);
        let stamps: Vec<i64> = t.iter().collect();
        assert_eq!(stamps.len(), 12);
        assert_eq!(stamps[0], 0);
        assert_eq!(stamps[11], 11 * H);
    }

    #[test]
    fn test_index_of() {
        let t = TimeRange::new(3 * H, 9 * H, H);
        assert_eq!(t.index_of(3 * H), Some(0));
        assert_eq!(t.index_of(8 * H), Some(5));
        assert_eq!(t.index_of(9 * H), None);
        assert_eq!(t.index_of(3 * H + 1), None);
    }

    #[test]
    fn test_floor_ceil_negative_safe() {
        assert_eq!(floor_to(-1, 3600), -3600);
        assert_eq!(ceil_to(-1, 3600), 0);
        assert_eq!(floor_to(7200, 3600), 7200);
        assert_eq!(ceil_to(7200, 3600), 7200);
    }

    #[test]
    fn test_interpolation_window_linear() {
        // Hourly read from a 6-hourly model needs the two bracketing
        // native samples.
        let req = TimeRange::new(0, 6 * H, H);
        let native = req.for_interpolation_to(6 * H, Interpolation::Linear);
        assert_eq!(native, TimeRange::new(0, 12 * H, 6 * H));
        assert_eq!(native.count(), 2);
    }

    #[test]
    fn test_interpolation_window_hermite() {
        let req = TimeRange::new(12 * H, 18 * H, H);
        let native = req.for_interpolation_to(6 * H, Interpolation::hermite());
        // Four taps: one step before the window, two past its end.
        assert_eq!(native, TimeRange::new(6 * H, 30 * H, 6 * H));
        assert_eq!(native.count(), 4);
    }

    #[test]
    fn test_interpolation_window_unaligned() {
        let req = TimeRange::new(5 * H, 7 * H, H);
        let native = req.for_interpolation_to(6 * H, Interpolation::Linear);
        assert_eq!(native, TimeRange::new(0, 18 * H, 6 * H));
    }

    #[test]
    fn test_aggregation_window_backwards_sum() {
        // Six-hourly sums built from an hourly model need the five
        // preceding member steps of the first coarse step.
        let req = TimeRange::new(6 * H, 18 * H, 6 * H);
        let native = req.for_aggregation_to(H, Interpolation::BackwardsSum);
        assert_eq!(native, TimeRange::new(H, 18 * H, H));
    }

    #[test]
    fn test_aggregation_window_point_sampling_unchanged() {
        let req = TimeRange::new(6 * H, 18 * H, 6 * H);
        let native = req.for_aggregation_to(H, Interpolation::Linear);
        assert_eq!(native, TimeRange::new(6 * H, 18 * H, H));
    }

    #[test]
    fn test_expanded_to_native_dt_is_identity() {
        let req = TimeRange::new(0, 24 * H, H);
        assert_eq!(req.expanded_to(H, Interpolation::Linear), req);
    }

    #[test]
    fn test_read_settings_time_shift() {
        let s = ReadSettings {
            previous_day: 2,
            ..Default::default()
        };
        assert_eq!(s.time_shift(), 2 * 86_400);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever the native step and kind, the expanded window
            /// always contains the requested one.
            #[test]
            fn prop_expanded_window_contains_request(
                start_steps in -100i64..100,
                len_steps in 1i64..50,
                model_dt in prop::sample::select(vec![900i64, 3600, 10800, 21600]),
            ) {
                let req = TimeRange::new(start_steps * H, (start_steps + len_steps) * H, H);
                for kind in [
                    Interpolation::Linear,
                    Interpolation::hermite(),
                    Interpolation::BackwardsSum,
                    Interpolation::SolarBackwardsAveraged,
                ] {
                    let native = req.expanded_to(model_dt, kind);
                    prop_assert!(native.start <= req.start);
                    prop_assert!(native.end >= req.end);
                    prop_assert!((native.end - native.start) % native.dt == 0);
                }
            }
        }
    }
}
