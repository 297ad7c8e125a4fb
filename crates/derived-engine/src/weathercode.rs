//! WMO weather interpretation codes.
//!
//! A rule table over the significant-weather inputs, fired in severity
//! order; the first matching rule wins. Rates are per hour regardless
//! of the request's step.

/// WMO 4677-style present-weather code subset served by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCode {
    ClearSky = 0,
    MainlyClear = 1,
    PartlyCloudy = 2,
    Overcast = 3,
    Fog = 45,
    DepositingRimeFog = 48,
    LightDrizzle = 51,
    ModerateDrizzle = 53,
    DenseDrizzle = 55,
    SlightRain = 61,
    ModerateRain = 63,
    HeavyRain = 65,
    LightFreezingRain = 66,
    HeavyFreezingRain = 67,
    SlightSnow = 71,
    ModerateSnow = 73,
    HeavySnow = 75,
    SlightRainShowers = 80,
    ModerateRainShowers = 81,
    ViolentRainShowers = 82,
    Thunderstorm = 95,
    ThunderstormSlightHail = 96,
    ThunderstormHeavyHail = 99,
}

/// Inputs for one time step. Rates are per hour; NaN means the input
/// is unavailable and its rules are skipped.
#[derive(Debug, Clone, Copy)]
pub struct WeatherInputs {
    /// Total cloud cover in percent.
    pub cloud_cover: f32,
    /// Total precipitation rate, mm/h.
    pub precipitation: f32,
    /// Convective precipitation rate, mm/h.
    pub showers: f32,
    /// Snowfall rate in cm/h.
    pub snowfall: f32,
    /// 2 m temperature in °C.
    pub temperature: f32,
    /// CAPE in J/kg.
    pub cape: f32,
    /// Surface lifted index.
    pub lifted_index: f32,
    /// Visibility in metres.
    pub visibility: f32,
    /// Categorical freezing rain flag (0/1).
    pub freezing_rain: f32,
}

/// Classify one step. Rules fire in order; the first match wins.
pub fn weather_code(inputs: &WeatherInputs) -> WeatherCode {
    let rate = inputs.precipitation.max(0.0);

    // 1. Freezing rain.
    if inputs.freezing_rain >= 0.5 && rate > 0.0 {
        return if rate < 2.5 {
            WeatherCode::LightFreezingRain
        } else {
            WeatherCode::HeavyFreezingRain
        };
    }

    // 2. Thunderstorm: unstable and convectively primed.
    if inputs.cape > 500.0 && inputs.lifted_index < -4.0 {
        return if rate <= 0.5 {
            WeatherCode::Thunderstorm
        } else if rate <= 4.0 {
            WeatherCode::ThunderstormSlightHail
        } else {
            WeatherCode::ThunderstormHeavyHail
        };
    }

    // 3. Snow, by centimetres per hour.
    if inputs.snowfall > 0.0 {
        return if inputs.snowfall < 0.7 {
            WeatherCode::SlightSnow
        } else if inputs.snowfall < 1.75 {
            WeatherCode::ModerateSnow
        } else {
            WeatherCode::HeavySnow
        };
    }

    // 4. Showers when convective precipitation dominates.
    if inputs.showers > 0.0 && inputs.showers >= rate * 0.5 {
        return if inputs.showers < 2.5 {
            WeatherCode::SlightRainShowers
        } else if inputs.showers < 10.0 {
            WeatherCode::ModerateRainShowers
        } else {
            WeatherCode::ViolentRainShowers
        };
    }

    // 5. Rain and drizzle, by rate.
    if rate > 0.0 {
        return if rate < 0.1 {
            WeatherCode::LightDrizzle
        } else if rate < 0.3 {
            WeatherCode::ModerateDrizzle
        } else if rate < 0.5 {
            WeatherCode::DenseDrizzle
        } else if rate < 2.5 {
            WeatherCode::SlightRain
        } else if rate < 7.6 {
            WeatherCode::ModerateRain
        } else {
            WeatherCode::HeavyRain
        };
    }

    // 6. Low visibility.
    if inputs.visibility.is_finite() && inputs.visibility < 1000.0 {
        return if inputs.temperature <= 0.0 {
            WeatherCode::DepositingRimeFog
        } else {
            WeatherCode::Fog
        };
    }

    // 7. Cloud cover.
    let cc = inputs.cloud_cover;
    if cc.is_nan() || cc < 12.5 {
        WeatherCode::ClearSky
    } else if cc < 50.0 {
        WeatherCode::MainlyClear
    } else if cc < 87.5 {
        WeatherCode::PartlyCloudy
    } else {
        WeatherCode::Overcast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear() -> WeatherInputs {
        WeatherInputs {
            cloud_cover: 5.0,
            precipitation: 0.0,
            showers: 0.0,
            snowfall: 0.0,
            temperature: 12.0,
            cape: 0.0,
            lifted_index: 2.0,
            visibility: 20_000.0,
            freezing_rain: 0.0,
        }
    }

    #[test]
    fn test_cloud_cover_codes() {
        assert_eq!(weather_code(&clear()), WeatherCode::ClearSky);
        assert_eq!(
            weather_code(&WeatherInputs { cloud_cover: 30.0, ..clear() }),
            WeatherCode::MainlyClear
        );
        assert_eq!(
            weather_code(&WeatherInputs { cloud_cover: 60.0, ..clear() }),
            WeatherCode::PartlyCloudy
        );
        assert_eq!(
            weather_code(&WeatherInputs { cloud_cover: 95.0, ..clear() }),
            WeatherCode::Overcast
        );
    }

    #[test]
    fn test_rain_by_rate() {
        let mut inputs = clear();
        inputs.precipitation = 0.05;
        assert_eq!(weather_code(&inputs), WeatherCode::LightDrizzle);
        inputs.precipitation = 1.0;
        assert_eq!(weather_code(&inputs), WeatherCode::SlightRain);
        inputs.precipitation = 5.0;
        assert_eq!(weather_code(&inputs), WeatherCode::ModerateRain);
        inputs.precipitation = 12.0;
        assert_eq!(weather_code(&inputs), WeatherCode::HeavyRain);
    }

    #[test]
    fn test_snow_beats_rain() {
        let inputs = WeatherInputs {
            precipitation: 1.0,
            snowfall: 0.7,
            temperature: -2.0,
            ..clear()
        };
        assert_eq!(weather_code(&inputs), WeatherCode::ModerateSnow);
    }

    #[test]
    fn test_freezing_rain_beats_everything() {
        let inputs = WeatherInputs {
            precipitation: 3.0,
            snowfall: 1.0,
            freezing_rain: 1.0,
            cape: 1000.0,
            lifted_index: -6.0,
            ..clear()
        };
        assert_eq!(weather_code(&inputs), WeatherCode::HeavyFreezingRain);
    }

    #[test]
    fn test_thunderstorm_requires_both_indices() {
        let mut inputs = clear();
        inputs.cape = 1200.0;
        inputs.lifted_index = -5.0;
        assert_eq!(weather_code(&inputs), WeatherCode::Thunderstorm);
        // High CAPE alone is not enough.
        inputs.lifted_index = 0.0;
        assert_eq!(weather_code(&inputs), WeatherCode::ClearSky);
    }

    #[test]
    fn test_showers_when_convective_dominates() {
        let inputs = WeatherInputs {
            precipitation: 2.0,
            showers: 1.8,
            ..clear()
        };
        assert_eq!(weather_code(&inputs), WeatherCode::SlightRainShowers);
        // Stratiform rain with a trace of convection stays rain.
        let inputs = WeatherInputs {
            precipitation: 2.0,
            showers: 0.2,
            ..clear()
        };
        assert_eq!(weather_code(&inputs), WeatherCode::SlightRain);
    }

    #[test]
    fn test_fog_codes() {
        let mut inputs = clear();
        inputs.visibility = 600.0;
        assert_eq!(weather_code(&inputs), WeatherCode::Fog);
        inputs.temperature = -3.0;
        assert_eq!(weather_code(&inputs), WeatherCode::DepositingRimeFog);
    }
}
