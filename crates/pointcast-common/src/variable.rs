//! Variable taxonomy for the forecast archive.
//!
//! Raw variables are what the archive stores: each carries a stable
//! storage key, the int16 compression scale factor, its interpolation
//! semantics, the output unit, and the two flags the reader and mixer
//! act on (elevation correction, offset correction across model
//! boundaries). Derived variables are tags only; the derived engine
//! maps them to prerequisite sets and compute functions.
//!
//! Alias spellings (`windspeed_10m`, `dewpoint_2m`, `cloudcover`, …)
//! resolve to canonical tags at parse time; the core never sees an
//! alias.

use serde::{Deserialize, Serialize};

use crate::unit::Unit;

/// How a native-resolution series is resampled to a requested spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    /// Linear between bracketing samples.
    Linear,
    /// Linear on circular 0–360 degrees with the shortest-arc rule.
    LinearDegrees,
    /// Cubic hermite on four consecutive samples, optionally clamped.
    Hermite { bounds: Option<(f32, f32)> },
    /// Samples are backward averages over the native step; disaggregate
    /// through the solar-zenith integral, then re-integrate.
    SolarBackwardsAveraged,
    /// As above, but gaps are instantaneous rather than averaged.
    SolarBackwardsMissingNotAveraged,
    /// Each native-step sum is distributed uniformly over sub-steps and
    /// summed when coarsening.
    BackwardsSum,
    /// The covering native step's value replicates into every sub-step.
    Backwards,
}

impl Interpolation {
    /// Unbounded hermite.
    pub fn hermite() -> Self {
        Interpolation::Hermite { bounds: None }
    }

    /// Hermite clamped to `[lo, hi]`.
    pub fn hermite_bounded(lo: f32, hi: f32) -> Self {
        Interpolation::Hermite {
            bounds: Some((lo, hi)),
        }
    }

    /// One-sided kernel width in native samples.
    pub fn padding(&self) -> usize {
        match self {
            Interpolation::Linear | Interpolation::LinearDegrees => 1,
            Interpolation::Hermite { .. } => 2,
            Interpolation::SolarBackwardsAveraged
            | Interpolation::SolarBackwardsMissingNotAveraged => 2,
            Interpolation::BackwardsSum | Interpolation::Backwards => 1,
        }
    }

    /// Whether samples describe the preceding interval rather than an
    /// instant. These kinds aggregate by summation/averaging.
    pub fn is_backwards(&self) -> bool {
        matches!(
            self,
            Interpolation::SolarBackwardsAveraged
                | Interpolation::SolarBackwardsMissingNotAveraged
                | Interpolation::BackwardsSum
                | Interpolation::Backwards
        )
    }

    /// Whether the kind runs through the solar-zenith disaggregation.
    pub fn is_solar(&self) -> bool {
        matches!(
            self,
            Interpolation::SolarBackwardsAveraged
                | Interpolation::SolarBackwardsMissingNotAveraged
        )
    }
}

/// Raw single-level variables stored per surface grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceVariable {
    Temperature2m,
    RelativeHumidity2m,
    PressureMsl,
    WindU10m,
    WindV10m,
    WindU100m,
    WindV100m,
    WindGusts10m,
    Precipitation,
    Showers,
    SnowfallWaterEquivalent,
    SnowDepth,
    CloudCover,
    CloudCoverLow,
    CloudCoverMid,
    CloudCoverHigh,
    ShortwaveRadiation,
    DiffuseRadiation,
    Cape,
    LiftedIndex,
    Visibility,
    SoilTemperature0cm,
    SoilMoisture0To10cm,
    CategoricalFreezingRain,
}

/// Raw variables available on pressure levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureVariable {
    Temperature,
    RelativeHumidity,
    WindU,
    WindV,
    GeopotentialHeight,
}

/// Raw variables available on height-above-ground levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightVariable {
    Temperature,
    WindU,
    WindV,
}

/// A raw archive variable: surface, or on a pressure/height level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variable {
    Surface { v: SurfaceVariable },
    /// Pressure-level variable; `level` is in hPa.
    Pressure { v: PressureVariable, level: i32 },
    /// Height-level variable; `level` is metres above ground.
    Height { v: HeightVariable, level: i32 },
}

impl Variable {
    pub fn surface(v: SurfaceVariable) -> Self {
        Variable::Surface { v }
    }

    pub fn pressure(v: PressureVariable, level: i32) -> Self {
        Variable::Pressure { v, level }
    }

    pub fn height(v: HeightVariable, level: i32) -> Self {
        Variable::Height { v, level }
    }

    /// Stable file-name fragment under `<domain>/`. Level sub-dimensions
    /// are path-encoded; ensemble sub-dimensions stay inside the chunk.
    pub fn storage_key(&self) -> String {
        match self {
            Variable::Surface { v } => v.storage_fragment().to_string(),
            Variable::Pressure { v, level } => {
                format!("{}_{}hPa", v.storage_fragment(), level)
            }
            Variable::Height { v, level } => format!("{}_{}m", v.storage_fragment(), level),
        }
    }

    /// float → int16 compression factor used by the archive.
    pub fn scalefactor(&self) -> f32 {
        match self {
            Variable::Surface { v } => v.scalefactor(),
            Variable::Pressure { v, .. } => match v {
                PressureVariable::Temperature => 20.0,
                PressureVariable::RelativeHumidity => 1.0,
                PressureVariable::WindU | PressureVariable::WindV => 10.0,
                PressureVariable::GeopotentialHeight => 0.1,
            },
            Variable::Height { v, .. } => match v {
                HeightVariable::Temperature => 20.0,
                HeightVariable::WindU | HeightVariable::WindV => 10.0,
            },
        }
    }

    pub fn interpolation(&self) -> Interpolation {
        match self {
            Variable::Surface { v } => v.interpolation(),
            Variable::Pressure { v, .. } => match v {
                PressureVariable::RelativeHumidity => Interpolation::hermite_bounded(0.0, 100.0),
                _ => Interpolation::hermite(),
            },
            Variable::Height { .. } => Interpolation::hermite(),
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            Variable::Surface { v } => v.unit(),
            Variable::Pressure { v, .. } => match v {
                PressureVariable::Temperature => Unit::Celsius,
                PressureVariable::RelativeHumidity => Unit::Percent,
                PressureVariable::WindU | PressureVariable::WindV => Unit::MetresPerSecond,
                PressureVariable::GeopotentialHeight => Unit::Metre,
            },
            Variable::Height { v, .. } => match v {
                HeightVariable::Temperature => Unit::Celsius,
                HeightVariable::WindU | HeightVariable::WindV => Unit::MetresPerSecond,
            },
        }
    }

    /// Multiply-add applied after decoding, converting storage units to
    /// the output unit (Pa → hPa, geopotential m²/s² → metres).
    pub fn storage_transform(&self) -> (f32, f32) {
        match self {
            Variable::Surface { v } => match v {
                SurfaceVariable::PressureMsl => (0.01, 0.0),
                _ => (1.0, 0.0),
            },
            Variable::Pressure { v, .. } => match v {
                PressureVariable::GeopotentialHeight => (1.0 / 9.806_65, 0.0),
                _ => (1.0, 0.0),
            },
            Variable::Height { .. } => (1.0, 0.0),
        }
    }

    /// True only for temperature-like Celsius variables, which get the
    /// lapse-rate elevation correction.
    pub fn is_elevation_correctable(&self) -> bool {
        matches!(
            self,
            Variable::Surface {
                v: SurfaceVariable::Temperature2m | SurfaceVariable::SoilTemperature0cm
            } | Variable::Height {
                v: HeightVariable::Temperature,
                ..
            }
        )
    }

    /// True for cumulative bucket processes whose absolute level differs
    /// between models; the mixer applies an additive shift when the
    /// winning reader changes.
    pub fn requires_offset_correction_for_mixing(&self) -> bool {
        matches!(
            self,
            Variable::Surface {
                v: SurfaceVariable::SnowDepth | SurfaceVariable::SoilMoisture0To10cm
            }
        )
    }
}

impl SurfaceVariable {
    fn storage_fragment(&self) -> &'static str {
        match self {
            SurfaceVariable::Temperature2m => "temperature_2m",
            SurfaceVariable::RelativeHumidity2m => "relative_humidity_2m",
            SurfaceVariable::PressureMsl => "pressure_msl",
            SurfaceVariable::WindU10m => "wind_u_component_10m",
            SurfaceVariable::WindV10m => "wind_v_component_10m",
            SurfaceVariable::WindU100m => "wind_u_component_100m",
            SurfaceVariable::WindV100m => "wind_v_component_100m",
            SurfaceVariable::WindGusts10m => "wind_gusts_10m",
            SurfaceVariable::Precipitation => "precipitation",
            SurfaceVariable::Showers => "showers",
            SurfaceVariable::SnowfallWaterEquivalent => "snowfall_water_equivalent",
            SurfaceVariable::SnowDepth => "snow_depth",
            SurfaceVariable::CloudCover => "cloud_cover",
            SurfaceVariable::CloudCoverLow => "cloud_cover_low",
            SurfaceVariable::CloudCoverMid => "cloud_cover_mid",
            SurfaceVariable::CloudCoverHigh => "cloud_cover_high",
            SurfaceVariable::ShortwaveRadiation => "shortwave_radiation",
            SurfaceVariable::DiffuseRadiation => "diffuse_radiation",
            SurfaceVariable::Cape => "cape",
            SurfaceVariable::LiftedIndex => "lifted_index",
            SurfaceVariable::Visibility => "visibility",
            SurfaceVariable::SoilTemperature0cm => "soil_temperature_0cm",
            SurfaceVariable::SoilMoisture0To10cm => "soil_moisture_0_to_10cm",
            SurfaceVariable::CategoricalFreezingRain => "categorical_freezing_rain",
        }
    }

    fn scalefactor(&self) -> f32 {
        match self {
            SurfaceVariable::Temperature2m | SurfaceVariable::SoilTemperature0cm => 20.0,
            SurfaceVariable::RelativeHumidity2m => 1.0,
            SurfaceVariable::PressureMsl => 0.1,
            SurfaceVariable::WindU10m
            | SurfaceVariable::WindV10m
            | SurfaceVariable::WindU100m
            | SurfaceVariable::WindV100m
            | SurfaceVariable::WindGusts10m => 10.0,
            SurfaceVariable::Precipitation
            | SurfaceVariable::Showers
            | SurfaceVariable::SnowfallWaterEquivalent => 10.0,
            SurfaceVariable::SnowDepth => 100.0,
            SurfaceVariable::CloudCover
            | SurfaceVariable::CloudCoverLow
            | SurfaceVariable::CloudCoverMid
            | SurfaceVariable::CloudCoverHigh => 1.0,
            SurfaceVariable::ShortwaveRadiation | SurfaceVariable::DiffuseRadiation => 1.0,
            SurfaceVariable::Cape => 0.1,
            SurfaceVariable::LiftedIndex => 10.0,
            SurfaceVariable::Visibility => 0.05,
            SurfaceVariable::SoilMoisture0To10cm => 1000.0,
            SurfaceVariable::CategoricalFreezingRain => 1.0,
        }
    }

    fn interpolation(&self) -> Interpolation {
        match self {
            SurfaceVariable::Temperature2m
            | SurfaceVariable::SoilTemperature0cm
            | SurfaceVariable::PressureMsl
            | SurfaceVariable::WindU10m
            | SurfaceVariable::WindV10m
            | SurfaceVariable::WindU100m
            | SurfaceVariable::WindV100m
            | SurfaceVariable::WindGusts10m
            | SurfaceVariable::LiftedIndex => Interpolation::hermite(),
            SurfaceVariable::RelativeHumidity2m
            | SurfaceVariable::CloudCover
            | SurfaceVariable::CloudCoverLow
            | SurfaceVariable::CloudCoverMid
            | SurfaceVariable::CloudCoverHigh => Interpolation::hermite_bounded(0.0, 100.0),
            SurfaceVariable::Precipitation
            | SurfaceVariable::Showers
            | SurfaceVariable::SnowfallWaterEquivalent => Interpolation::BackwardsSum,
            SurfaceVariable::SnowDepth | SurfaceVariable::SoilMoisture0To10cm => {
                Interpolation::Linear
            }
            SurfaceVariable::ShortwaveRadiation | SurfaceVariable::DiffuseRadiation => {
                Interpolation::SolarBackwardsAveraged
            }
            SurfaceVariable::Cape => Interpolation::hermite_bounded(0.0, f32::MAX),
            SurfaceVariable::Visibility => Interpolation::Linear,
            SurfaceVariable::CategoricalFreezingRain => Interpolation::Backwards,
        }
    }

    fn unit(&self) -> Unit {
        match self {
            SurfaceVariable::Temperature2m | SurfaceVariable::SoilTemperature0cm => Unit::Celsius,
            SurfaceVariable::RelativeHumidity2m => Unit::Percent,
            SurfaceVariable::PressureMsl => Unit::HectoPascal,
            SurfaceVariable::WindU10m
            | SurfaceVariable::WindV10m
            | SurfaceVariable::WindU100m
            | SurfaceVariable::WindV100m
            | SurfaceVariable::WindGusts10m => Unit::MetresPerSecond,
            SurfaceVariable::Precipitation
            | SurfaceVariable::Showers
            | SurfaceVariable::SnowfallWaterEquivalent => Unit::Millimetre,
            SurfaceVariable::SnowDepth => Unit::Metre,
            SurfaceVariable::CloudCover
            | SurfaceVariable::CloudCoverLow
            | SurfaceVariable::CloudCoverMid
            | SurfaceVariable::CloudCoverHigh => Unit::Percent,
            SurfaceVariable::ShortwaveRadiation | SurfaceVariable::DiffuseRadiation => {
                Unit::WattPerSquareMetre
            }
            SurfaceVariable::Cape => Unit::JoulePerKilogram,
            SurfaceVariable::LiftedIndex => Unit::Dimensionless,
            SurfaceVariable::Visibility => Unit::Metre,
            SurfaceVariable::SoilMoisture0To10cm => Unit::CubicMetrePerCubicMetre,
            SurfaceVariable::CategoricalFreezingRain => Unit::Dimensionless,
        }
    }
}

impl PressureVariable {
    fn storage_fragment(&self) -> &'static str {
        match self {
            PressureVariable::Temperature => "temperature",
            PressureVariable::RelativeHumidity => "relative_humidity",
            PressureVariable::WindU => "wind_u_component",
            PressureVariable::WindV => "wind_v_component",
            PressureVariable::GeopotentialHeight => "geopotential_height",
        }
    }
}

impl HeightVariable {
    fn storage_fragment(&self) -> &'static str {
        match self {
            HeightVariable::Temperature => "temperature",
            HeightVariable::WindU => "wind_u_component",
            HeightVariable::WindV => "wind_v_component",
        }
    }
}

/// Derived surface variables: computed from raw reads by the derived
/// engine, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedSurfaceVariable {
    WindSpeed10m,
    WindDirection10m,
    WindSpeed100m,
    WindDirection100m,
    DewPoint2m,
    ApparentTemperature,
    WetBulbTemperature2m,
    VapourPressureDeficit,
    SurfacePressure,
    Rain,
    Snowfall,
    DirectRadiation,
    DirectNormalIrradiance,
    /// Irradiance on a tilted plane; tilt and azimuth in degrees,
    /// azimuth 0 = south, positive towards west.
    GlobalTiltedIrradiance {
        tilt: f32,
        azimuth: f32,
    },
    TerrestrialRadiation,
    Et0FaoEvapotranspiration,
    WeatherCode,
}

/// Derived pressure-level variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedPressureVariable {
    CloudCover,
    WindSpeed,
    WindDirection,
    DewPoint,
}

/// A derived variable tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedVariable {
    Surface(DerivedSurfaceVariable),
    Pressure(DerivedPressureVariable, i32),
}

/// Anything a caller may request: a raw archive variable or a derived
/// one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestedVariable {
    Raw(Variable),
    Derived(DerivedVariable),
}

impl RequestedVariable {
    /// Resolve a request-layer name to a canonical tag. Alias spellings
    /// map to the same tag; `None` means the name is unknown.
    pub fn parse(name: &str) -> Option<RequestedVariable> {
        use DerivedSurfaceVariable as D;
        use SurfaceVariable as S;

        let raw = |v: S| Some(RequestedVariable::Raw(Variable::surface(v)));
        let derived = |v: D| Some(RequestedVariable::Derived(DerivedVariable::Surface(v)));

        match name {
            "temperature_2m" => raw(S::Temperature2m),
            "relative_humidity_2m" | "relativehumidity_2m" => raw(S::RelativeHumidity2m),
            "pressure_msl" => raw(S::PressureMsl),
            "wind_gusts_10m" | "windgusts_10m" => raw(S::WindGusts10m),
            "precipitation" => raw(S::Precipitation),
            "showers" => raw(S::Showers),
            "snowfall_water_equivalent" => raw(S::SnowfallWaterEquivalent),
            "snow_depth" => raw(S::SnowDepth),
            "cloud_cover" | "cloudcover" => raw(S::CloudCover),
            "cloud_cover_low" | "cloudcover_low" => raw(S::CloudCoverLow),
            "cloud_cover_mid" | "cloudcover_mid" => raw(S::CloudCoverMid),
            "cloud_cover_high" | "cloudcover_high" => raw(S::CloudCoverHigh),
            "shortwave_radiation" => raw(S::ShortwaveRadiation),
            "diffuse_radiation" => raw(S::DiffuseRadiation),
            "cape" => raw(S::Cape),
            "lifted_index" => raw(S::LiftedIndex),
            "visibility" => raw(S::Visibility),
            "soil_temperature_0cm" => raw(S::SoilTemperature0cm),
            "soil_moisture_0_to_10cm" => raw(S::SoilMoisture0To10cm),

            "wind_speed_10m" | "windspeed_10m" => derived(D::WindSpeed10m),
            "wind_direction_10m" | "winddirection_10m" => derived(D::WindDirection10m),
            "wind_speed_100m" | "windspeed_100m" => derived(D::WindSpeed100m),
            "wind_direction_100m" | "winddirection_100m" => derived(D::WindDirection100m),
            "dew_point_2m" | "dewpoint_2m" => derived(D::DewPoint2m),
            "apparent_temperature" => derived(D::ApparentTemperature),
            "wet_bulb_temperature_2m" => derived(D::WetBulbTemperature2m),
            "vapour_pressure_deficit" | "vapor_pressure_deficit" => {
                derived(D::VapourPressureDeficit)
            }
            "surface_pressure" => derived(D::SurfacePressure),
            "rain" => derived(D::Rain),
            "snowfall" => derived(D::Snowfall),
            "direct_radiation" => derived(D::DirectRadiation),
            "direct_normal_irradiance" => derived(D::DirectNormalIrradiance),
            "global_tilted_irradiance" => derived(D::GlobalTiltedIrradiance {
                tilt: 0.0,
                azimuth: 0.0,
            }),
            "terrestrial_radiation" => derived(D::TerrestrialRadiation),
            "et0_fao_evapotranspiration" => derived(D::Et0FaoEvapotranspiration),
            "weather_code" | "weathercode" => derived(D::WeatherCode),
            _ => None,
        }
    }
}
