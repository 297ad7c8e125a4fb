//! Single-domain point reading.
//!
//! A `GridPointReader` is the resolved view of one coordinate on one
//! model domain: grid point, model coordinates, model and target
//! elevation. Its `get` combines the archive read, time resampling to
//! the requested spacing, storage-unit scaling, and the lapse-rate
//! elevation correction. The `ForecastReader` trait is the seam the
//! mixer and the derived engine program against.

pub mod domain;
pub mod interpolate;
pub mod reader;
pub mod scaling;

pub use domain::Domain;
pub use interpolate::resample;
pub use reader::{ForecastReader, GridPointReader, PointSelection};
