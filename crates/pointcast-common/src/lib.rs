//! Shared vocabulary for the pointcast forecast core.
//!
//! Everything downstream crates agree on lives here: the error taxonomy,
//! integer-second time-range algebra, the variable taxonomy with its
//! per-variable storage and interpolation metadata, physical units, and
//! the solar geometry used by both the interpolator and the radiation
//! derivations.

pub mod error;
pub mod solar;
pub mod time;
pub mod unit;
pub mod variable;

pub use error::{PointcastError, Result};
pub use time::{ReadSettings, TimeRange};
pub use unit::Unit;
pub use variable::{
    DerivedPressureVariable, DerivedSurfaceVariable, DerivedVariable, HeightVariable,
    Interpolation, PressureVariable, RequestedVariable, SurfaceVariable, Variable,
};
