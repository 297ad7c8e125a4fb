//! Surface meteorology formulas.
//!
//! Pure elementwise functions over aligned series. Temperatures are
//! °C, humidities %, pressures hPa, wind m/s unless a signature says
//! otherwise. NaN inputs yield NaN outputs.

/// Wind speed from components.
#[inline]
pub fn wind_speed(u: f32, v: f32) -> f32 {
    u.hypot(v)
}

/// Meteorological wind direction in degrees: the direction the wind
/// blows FROM, clockwise from north.
#[inline]
pub fn wind_direction(u: f32, v: f32) -> f32 {
    (u.atan2(v).to_degrees() + 180.0).rem_euclid(360.0)
}

/// Saturation vapour pressure over water in kPa (Magnus form).
#[inline]
pub fn saturation_vapour_pressure(temperature: f32) -> f32 {
    0.6108 * (17.27 * temperature / (temperature + 237.3)).exp()
}

/// Dew point from temperature and relative humidity (Magnus).
#[inline]
pub fn dew_point(temperature: f32, relative_humidity: f32) -> f32 {
    const A: f32 = 17.27;
    const B: f32 = 237.3;
    let rh = (relative_humidity / 100.0).max(1e-6);
    let gamma = A * temperature / (B + temperature) + rh.ln();
    B * gamma / (A - gamma)
}

/// Relative humidity (%) from temperature and dew point.
#[inline]
pub fn relative_humidity(temperature: f32, dew_point: f32) -> f32 {
    (100.0 * saturation_vapour_pressure(dew_point) / saturation_vapour_pressure(temperature))
        .clamp(0.0, 100.0)
}

/// Vapour pressure deficit in kPa.
#[inline]
pub fn vapour_pressure_deficit(temperature: f32, relative_humidity: f32) -> f32 {
    (saturation_vapour_pressure(temperature) * (1.0 - relative_humidity / 100.0)).max(0.0)
}

/// Steadman (1994) apparent temperature including radiation, as used
/// for the Australian AT index.
///
/// `radiation` is global shortwave in W/m²; wind is at 10 m.
#[inline]
pub fn apparent_temperature(
    temperature: f32,
    relative_humidity: f32,
    wind_speed: f32,
    radiation: f32,
) -> f32 {
    // Water vapour pressure in hPa.
    let e = relative_humidity / 100.0
        * 6.105
        * (17.27 * temperature / (237.7 + temperature)).exp();
    let q_glob = (0.1 * radiation.max(0.0)) / (wind_speed + 10.0);
    temperature + 0.348 * e - 0.7 * wind_speed + 0.7 * q_glob - 4.25
}

/// Wet-bulb temperature after Stull (2011).
#[inline]
pub fn wet_bulb_temperature(temperature: f32, relative_humidity: f32) -> f32 {
    let rh = relative_humidity;
    temperature * (0.151_977 * (rh + 8.313_659).sqrt()).atan() + (temperature + rh).atan()
        - (rh - 1.676_331).atan()
        + 0.003_918_38 * rh.powf(1.5) * (0.023_101 * rh).atan()
        - 4.686_035
}

/// Reduce mean-sea-level pressure to station pressure at `elevation`
/// metres, using the surface temperature for the column.
#[inline]
pub fn surface_pressure(pressure_msl: f32, temperature: f32, elevation: f32) -> f32 {
    if !elevation.is_finite() || elevation == 0.0 {
        return pressure_msl;
    }
    let kelvin = temperature + 273.15;
    pressure_msl * (1.0 - 0.0065 * elevation / (kelvin + 0.0065 * elevation)).powf(5.255)
}

/// Liquid share of precipitation: everything above freezing.
#[inline]
pub fn rain(precipitation: f32, temperature: f32) -> f32 {
    if temperature >= 0.0 {
        precipitation
    } else {
        0.0
    }
}

/// Snow depth share of precipitation in centimetres: a 7:1
/// snow-to-liquid ratio applied to millimetres of water below
/// freezing.
#[inline]
pub fn snowfall(precipitation: f32, temperature: f32) -> f32 {
    if temperature >= 0.0 {
        0.0
    } else {
        precipitation * 0.7
    }
}

/// FAO-56 Penman–Monteith reference evapotranspiration for one step,
/// in millimetres per hour.
///
/// `radiation` is global shortwave W/m², `wind_10m` the 10 m wind; the
/// formula's 2 m wind comes from the FAO log-profile factor. `elevation`
/// feeds the psychrometric constant; NaN falls back to sea level.
pub fn et0_reference(
    temperature: f32,
    relative_humidity: f32,
    wind_10m: f32,
    radiation: f32,
    elevation: f32,
) -> f32 {
    let elevation = if elevation.is_finite() { elevation } else { 0.0 };
    // Atmospheric pressure in kPa (FAO-56 eq. 7).
    let pressure = 101.3 * ((293.0 - 0.0065 * elevation) / 293.0).powf(5.26);
    let gamma = 0.000_665 * pressure;

    let es = saturation_vapour_pressure(temperature);
    let ea = es * relative_humidity / 100.0;
    let delta = 4098.0 * es / (temperature + 237.3).powi(2);

    // Net radiation: shortwave minus the canopy albedo, longwave
    // neglected at sub-daily steps. W/m² → MJ/m²/h.
    let rn = 0.77 * radiation.max(0.0) * 0.0036;
    let wind_2m = wind_10m * 0.748;

    let numerator =
        0.408 * delta * rn + gamma * 37.0 / (temperature + 273.0) * wind_2m * (es - ea);
    let denominator = delta + gamma * (1.0 + 0.34 * wind_2m);
    (numerator / denominator).max(0.0)
}

/// Slingo-style cloud cover (%) from relative humidity on a pressure
/// level. The critical humidity depends on the layer.
#[inline]
pub fn cloud_cover_from_humidity(relative_humidity: f32, pressure_hpa: f32) -> f32 {
    let rh_crit = if pressure_hpa >= 800.0 {
        85.0
    } else if pressure_hpa >= 450.0 {
        75.0
    } else {
        80.0
    };
    if relative_humidity <= rh_crit {
        return 0.0;
    }
    let scaled = (relative_humidity - rh_crit) / (100.0 - rh_crit);
    (scaled * scaled * 100.0).clamp(0.0, 100.0)
}
