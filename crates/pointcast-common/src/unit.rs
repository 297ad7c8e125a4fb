//! Physical units attached to returned series.

use serde::{Deserialize, Serialize};

/// SI-ish unit tags for the values the core returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Celsius,
    Percent,
    HectoPascal,
    KiloPascal,
    MetresPerSecond,
    Millimetre,
    Centimetre,
    Metre,
    WattPerSquareMetre,
    DegreeDirection,
    JoulePerKilogram,
    CubicMetrePerCubicMetre,
    WmoCode,
    Dimensionless,
}

impl Unit {
    /// Conventional abbreviation for response metadata.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Percent => "%",
            Unit::HectoPascal => "hPa",
            Unit::KiloPascal => "kPa",
            Unit::MetresPerSecond => "m/s",
            Unit::Millimetre => "mm",
            Unit::Centimetre => "cm",
            Unit::Metre => "m",
            Unit::WattPerSquareMetre => "W/m²",
            Unit::DegreeDirection => "°",
            Unit::JoulePerKilogram => "J/kg",
            Unit::CubicMetrePerCubicMetre => "m³/m³",
            Unit::WmoCode => "wmo code",
            Unit::Dimensionless => "",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}
