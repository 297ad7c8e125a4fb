//! The reader seam and its single-domain implementation.

use async_trait::async_trait;
use std::sync::Arc;

use chunk_archive::StaticKind;
use pointcast_common::{ReadSettings, Result, TimeRange, Unit, Variable};

use crate::domain::Domain;
use crate::interpolate::resample;
use crate::scaling;

/// How a coordinate resolves onto a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointSelection {
    /// Plain nearest grid point.
    #[default]
    Nearest,
    /// Prefer a neighbor whose surface elevation matches the target.
    TerrainOptimised,
}

/// Anything that serves per-point forecast series.
///
/// Implemented by the single-domain reader and by the multi-domain
/// mixer, which delegates to an ordered stack of these.
#[async_trait]
pub trait ForecastReader: Send + Sync {
    /// Latitude of the model grid point (for the mixer: of the request).
    fn latitude(&self) -> f64;

    /// Longitude of the model grid point.
    fn longitude(&self) -> f64;

    /// Elevation the series is corrected to. NaN when unknown.
    fn target_elevation(&self) -> f32;

    /// Read one raw variable over a time range, scaled to its output
    /// unit. The result always has `range.count()` samples.
    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: &ReadSettings,
    ) -> Result<(Vec<f32>, Unit)>;

    /// Advisory prefetch of the chunks `get` with the same arguments
    /// would touch.
    fn prefetch(&self, variable: Variable, range: TimeRange, settings: &ReadSettings);

    /// Static field value at the resolved grid point.
    fn static_lookup(&self, kind: StaticKind) -> Option<f32>;
}

/// The resolved view of one coordinate on one domain.
pub struct GridPointReader {
    domain: Arc<Domain>,
    gridpoint: usize,
    model_lat: f64,
    model_lon: f64,
    /// Surface elevation of the model cell; NaN without a static file.
    model_elevation: f32,
    /// Elevation the caller asked for; defaults to the model's.
    target_elevation: f32,
}

impl GridPointReader {
    /// Resolve a coordinate on a domain. `None` when the coordinate is
    /// outside the grid; the caller treats that as "no data here".
    pub fn open(
        domain: Arc<Domain>,
        lat: f64,
        lon: f64,
        elevation: Option<f32>,
        selection: PointSelection,
    ) -> Option<GridPointReader> {
        let gridpoint = match (selection, elevation, domain.elevation_field()) {
            (PointSelection::TerrainOptimised, Some(target), Some(field)) => {
                let (point, _) = domain
                    .grid()
                    .find_point_terrain_optimised(lat, lon, target, field)?;
                point
            }
            // Without a target or a terrain field there is nothing to
            // optimise against.
            _ => domain.grid().find_point(lat, lon)?,
        };

        let (model_lat, model_lon) = domain.grid().coordinates(gridpoint);
        let model_elevation = domain
            .static_value(StaticKind::Elevation, gridpoint)
            .unwrap_or(f32::NAN);
        let target_elevation = elevation.unwrap_or(model_elevation);

        Some(GridPointReader {
            domain,
            gridpoint,
            model_lat,
            model_lon,
            model_elevation,
            target_elevation,
        })
    }

    pub fn gridpoint(&self) -> usize {
        self.gridpoint
    }

    pub fn model_elevation(&self) -> f32 {
        self.model_elevation
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The native window backing a request, shifted for previous-day
    /// reads.
    fn native_range(&self, variable: &Variable, range: &TimeRange, settings: &ReadSettings) -> TimeRange {
        let shift = settings.time_shift();
        let shifted = TimeRange::new(range.start - shift, range.end - shift, range.dt);
        shifted.expanded_to(self.domain.dt(), variable.interpolation())
    }
}

#[async_trait]
impl ForecastReader for GridPointReader {
    fn latitude(&self) -> f64 {
        self.model_lat
    }

    fn longitude(&self) -> f64 {
        self.model_lon
    }

    fn target_elevation(&self) -> f32 {
        self.target_elevation
    }

    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: &ReadSettings,
    ) -> Result<(Vec<f32>, Unit)> {
        let kind = variable.interpolation();
        let key = variable.storage_key();
        let shift = settings.time_shift();
        let shifted = TimeRange::new(range.start - shift, range.end - shift, range.dt);

        let mut data = if shifted.dt == self.domain.dt() {
            self.domain
                .archive()
                .read(&key, self.gridpoint, settings, shifted)
                .await?
        } else {
            let native = shifted.expanded_to(self.domain.dt(), kind);
            let raw = self
                .domain
                .archive()
                .read(&key, self.gridpoint, settings, native)
                .await?;
            resample(&raw, &native, &shifted, kind, (self.model_lat, self.model_lon))
        };

        scaling::apply_storage_transform(&mut data, &variable);
        if variable.is_elevation_correctable() {
            scaling::apply_elevation_correction(
                &mut data,
                self.model_elevation,
                self.target_elevation,
            );
        }
        Ok((data, variable.unit()))
    }

    fn prefetch(&self, variable: Variable, range: TimeRange, settings: &ReadSettings) {
        let native = self.native_range(&variable, &range, settings);
        self.domain
            .archive()
            .will_need(&variable.storage_key(), settings, native);
    }

    fn static_lookup(&self, kind: StaticKind) -> Option<f32> {
        self.domain.static_value(kind, self.gridpoint)
    }
}
