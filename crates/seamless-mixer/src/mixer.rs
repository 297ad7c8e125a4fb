//! Last-wins fusion of an ordered reader stack.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

use chunk_archive::StaticKind;
use point_reader::ForecastReader;
use pointcast_common::{PointcastError, ReadSettings, Result, TimeRange, Unit, Variable};

/// An ordered composition of readers for one coordinate.
///
/// `readers[0]` is the coarsest and least preferred; the rightmost
/// reader overrides. For every sample the highest-priority non-NaN
/// value wins. The mixer implements `ForecastReader` itself, so
/// derived-variable evaluation and nesting work unchanged.
pub struct MultiDomainMixer {
    readers: Vec<Arc<dyn ForecastReader>>,
    latitude: f64,
    longitude: f64,
}

impl std::fmt::Debug for MultiDomainMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiDomainMixer")
            .field("readers", &self.readers.len())
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .finish()
    }
}

impl MultiDomainMixer {
    /// Build a mixer over readers that share the requested coordinate.
    /// `None` when the stack is empty (no domain covers the point).
    pub fn new(readers: Vec<Arc<dyn ForecastReader>>, latitude: f64, longitude: f64) -> Option<Self> {
        if readers.is_empty() {
            return None;
        }
        Some(Self {
            readers,
            latitude,
            longitude,
        })
    }

    /// Number of composed readers.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    fn best(&self) -> &dyn ForecastReader {
        self.readers
            .last()
            .expect("mixer is never empty")
            .as_ref()
    }
}

/// Merge per-reader series into winner values and winner indices,
/// highest priority (largest index) first.
fn merge(series: &[Vec<f32>], len: usize) -> (Vec<f32>, Vec<Option<usize>>) {
    let mut values = vec![f32::NAN; len];
    let mut winners: Vec<Option<usize>> = vec![None; len];
    for j in 0..len {
        for (r, s) in series.iter().enumerate().rev() {
            if !s[j].is_nan() {
                values[j] = s[j];
                winners[j] = Some(r);
                break;
            }
        }
    }
    (values, winners)
}

/// Re-anchor cumulative series so a change of winning reader keeps the
/// curve continuous. The shift at a crossover is the difference between
/// the outgoing and incoming reader at that step (or the previous step
/// when the outgoing reader ended exactly there), applied to the new
/// winner until the next crossover.
fn offset_correct(values: &mut [f32], winners: &[Option<usize>], series: &[Vec<f32>]) {
    let mut shift = 0.0f32;
    let mut prev: Option<usize> = None;
    for j in 0..values.len() {
        let Some(cur) = winners[j] else {
            prev = None;
            shift = 0.0;
            continue;
        };
        if let Some(p) = prev {
            if p != cur {
                let prev_here = series[p][j];
                shift = if !prev_here.is_nan() {
                    (prev_here + shift) - series[cur][j]
                } else if j > 0 && !series[cur][j - 1].is_nan() {
                    values[j - 1] - series[cur][j - 1]
                } else {
                    0.0
                };
            }
        } else {
            shift = 0.0;
        }
        values[j] += shift;
        prev = Some(cur);
    }
}

#[async_trait]
impl ForecastReader for MultiDomainMixer {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn target_elevation(&self) -> f32 {
        self.best().target_elevation()
    }

    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: &ReadSettings,
    ) -> Result<(Vec<f32>, Unit)> {
        let fetched = try_join_all(
            self.readers
                .iter()
                .map(|r| r.get(variable, range, settings)),
        )
        .await?;

        let unit = fetched
            .last()
            .map(|(_, u)| *u)
            .ok_or(PointcastError::OutsideGrid)?;
        let series: Vec<Vec<f32>> = fetched.into_iter().map(|(data, _)| data).collect();

        let (mut values, winners) = merge(&series, range.count());
        if variable.requires_offset_correction_for_mixing() {
            offset_correct(&mut values, &winners, &series);
        }
        Ok((values, unit))
    }

    fn prefetch(&self, variable: Variable, range: TimeRange, settings: &ReadSettings) {
        for reader in &self.readers {
            reader.prefetch(variable, range, settings);
        }
    }

    fn static_lookup(&self, kind: StaticKind) -> Option<f32> {
        self.readers
            .iter()
            .rev()
            .find_map(|r| r.static_lookup(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointcast_common::variable::SurfaceVariable;

    const H: i64 = 3600;

    /// A reader serving a fixed value for the first `available` steps
    /// of any request, NaN afterwards.
    struct PartialReader {
        value: f32,
        available: usize,
        elevation: f32,
    }

    #[async_trait]
    impl ForecastReader for PartialReader {
        fn latitude(&self) -> f64 {
            47.0
        }
        fn longitude(&self) -> f64 {
            8.0
        }
        fn target_elevation(&self) -> f32 {
            self.elevation
        }
        async fn get(
            &self,
            variable: Variable,
            range: TimeRange,
            _settings: &ReadSettings,
        ) -> Result<(Vec<f32>, Unit)> {
            let data = (0..range.count())
                .map(|i| if i < self.available { self.value } else { f32::NAN })
                .collect();
            Ok((data, variable.unit()))
        }
        fn prefetch(&self, _v: Variable, _r: TimeRange, _s: &ReadSettings) {}
        fn static_lookup(&self, _kind: StaticKind) -> Option<f32> {
            Some(self.elevation)
        }
    }

    fn reader(value: f32, available: usize) -> Arc<dyn ForecastReader> {
        Arc::new(PartialReader {
            value,
            available,
            elevation: 100.0,
        })
    }

    #[tokio::test]
    async fn test_regional_overrides_global_until_it_ends() {
        // Global hourly reader of 10s; regional covering steps 0..=6 of
        // 12s. The regional wins while present.
        let mixer = MultiDomainMixer::new(vec![reader(10.0, 64), reader(12.0, 7)], 47.0, 8.0)
            .unwrap();
        let range = TimeRange::new(0, 13 * H, H);
        let (data, _) = mixer
            .get(
                Variable::surface(SurfaceVariable::Temperature2m),
                range,
                &ReadSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            data,
            vec![12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]
        );
    }

    #[tokio::test]
    async fn test_gap_in_priority_reader_falls_through() {
        struct Gappy;
        #[async_trait]
        impl ForecastReader for Gappy {
            fn latitude(&self) -> f64 {
                47.0
            }
            fn longitude(&self) -> f64 {
                8.0
            }
            fn target_elevation(&self) -> f32 {
                100.0
            }
            async fn get(
                &self,
                variable: Variable,
                range: TimeRange,
                _settings: &ReadSettings,
            ) -> Result<(Vec<f32>, Unit)> {
                let data = (0..range.count())
                    .map(|i| if i % 2 == 0 { 20.0 } else { f32::NAN })
                    .collect();
                Ok((data, variable.unit()))
            }
            fn prefetch(&self, _v: Variable, _r: TimeRange, _s: &ReadSettings) {}
            fn static_lookup(&self, _kind: StaticKind) -> Option<f32> {
                None
            }
        }

        let mixer =
            MultiDomainMixer::new(vec![reader(10.0, 64), Arc::new(Gappy)], 47.0, 8.0).unwrap();
        let range = TimeRange::new(0, 4 * H, H);
        let (data, _) = mixer
            .get(
                Variable::surface(SurfaceVariable::Temperature2m),
                range,
                &ReadSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(data, vec![20.0, 10.0, 20.0, 10.0]);
    }

    #[tokio::test]
    async fn test_cumulative_variable_is_offset_corrected() {
        // Snow depth jumps from 0.52 m (regional) to 0.20 m (global) at
        // the boundary without correction; with it the curve stays C0.
        let mixer = MultiDomainMixer::new(vec![reader(0.20, 64), reader(0.52, 7)], 47.0, 8.0)
            .unwrap();
        let range = TimeRange::new(0, 13 * H, H);
        let (data, _) = mixer
            .get(
                Variable::surface(SurfaceVariable::SnowDepth),
                range,
                &ReadSettings::default(),
            )
            .await
            .unwrap();
        // Regional part untouched.
        assert!((data[6] - 0.52).abs() < 1e-6);
        // After the crossover the global series is shifted to join the
        // regional level; constant series stay at that level.
        for &v in &data[7..] {
            assert!((v - 0.52).abs() < 1e-6, "step not continuous: {v}");
        }
        // The non-cumulative case in the test above keeps the raw jump.
    }

    #[tokio::test]
    async fn test_no_correction_for_plain_variables() {
        let mixer = MultiDomainMixer::new(vec![reader(10.0, 64), reader(12.0, 7)], 47.0, 8.0)
            .unwrap();
        let range = TimeRange::new(0, 13 * H, H);
        let (data, _) = mixer
            .get(
                Variable::surface(SurfaceVariable::Temperature2m),
                range,
                &ReadSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(data[7], 10.0, "instantaneous variables jump freely");
    }

    #[tokio::test]
    async fn test_all_readers_missing_yields_nan() {
        let mixer = MultiDomainMixer::new(vec![reader(1.0, 0)], 47.0, 8.0).unwrap();
        let range = TimeRange::new(0, 3 * H, H);
        let (data, _) = mixer
            .get(
                Variable::surface(SurfaceVariable::Temperature2m),
                range,
                &ReadSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(data.len(), 3);
        assert!(data.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_empty_stack_is_none() {
        assert!(MultiDomainMixer::new(Vec::new(), 0.0, 0.0).is_none());
    }
}
