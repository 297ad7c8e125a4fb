//! Derived-variable evaluation over a `ForecastReader`.
//!
//! Each derived variable declares its raw prerequisites; `get` fetches
//! them concurrently, waits for all, and applies a pure elementwise
//! compute function over the aligned series. `prefetch` forwards the
//! flattened prerequisite set so the archive can warm its cache before
//! the reads land. A failed derivation never poisons its siblings: the
//! error stays with the one variable that failed.

pub mod meteorology;
pub mod radiation;
pub mod weathercode;

use futures::future::try_join_all;

use point_reader::ForecastReader;
use pointcast_common::solar;
use pointcast_common::variable::{
    DerivedPressureVariable, DerivedSurfaceVariable, DerivedVariable, PressureVariable,
    SurfaceVariable,
};
use pointcast_common::{ReadSettings, Result, TimeRange, Unit, Variable};

use weathercode::{weather_code, WeatherInputs};

/// The flattened raw prerequisite set of a derived variable.
///
/// Derivations that build on other derivations (direct-normal on
/// direct, tilted on the split) list the raw variables at the bottom of
/// the chain, so one prefetch pass covers the whole dependency tree.
pub fn prerequisites(variable: &DerivedVariable) -> Vec<Variable> {
    use pointcast_common::variable::DerivedSurfaceVariable as D;
    use pointcast_common::variable::SurfaceVariable as S;

    let surface = |vars: &[SurfaceVariable]| vars.iter().map(|&v| Variable::surface(v)).collect();

    match variable {
        DerivedVariable::Surface(v) => match v {
            D::WindSpeed10m | D::WindDirection10m => surface(&[S::WindU10m, S::WindV10m]),
            D::WindSpeed100m | D::WindDirection100m => surface(&[S::WindU100m, S::WindV100m]),
            D::DewPoint2m | D::WetBulbTemperature2m | D::VapourPressureDeficit => {
                surface(&[S::Temperature2m, S::RelativeHumidity2m])
            }
            D::ApparentTemperature => surface(&[
                S::Temperature2m,
                S::WindU10m,
                S::WindV10m,
                S::RelativeHumidity2m,
                S::ShortwaveRadiation,
            ]),
            D::SurfacePressure => surface(&[S::PressureMsl, S::Temperature2m]),
            D::Rain | D::Snowfall => surface(&[S::Precipitation, S::Temperature2m]),
            D::DirectRadiation | D::DirectNormalIrradiance | D::GlobalTiltedIrradiance { .. } => {
                surface(&[S::ShortwaveRadiation, S::DiffuseRadiation])
            }
            D::TerrestrialRadiation => Vec::new(),
            D::Et0FaoEvapotranspiration => surface(&[
                S::Temperature2m,
                S::RelativeHumidity2m,
                S::WindU10m,
                S::WindV10m,
                S::ShortwaveRadiation,
            ]),
            D::WeatherCode => surface(&[
                S::CloudCover,
                S::Precipitation,
                S::Showers,
                S::Temperature2m,
                S::Cape,
                S::LiftedIndex,
                S::Visibility,
                S::CategoricalFreezingRain,
            ]),
        },
        DerivedVariable::Pressure(v, level) => {
            let p = |vars: &[PressureVariable]| {
                vars.iter().map(|&x| Variable::pressure(x, *level)).collect()
            };
            match v {
                DerivedPressureVariable::CloudCover => p(&[PressureVariable::RelativeHumidity]),
                DerivedPressureVariable::WindSpeed | DerivedPressureVariable::WindDirection => {
                    p(&[PressureVariable::WindU, PressureVariable::WindV])
                }
                DerivedPressureVariable::DewPoint => p(&[
                    PressureVariable::Temperature,
                    PressureVariable::RelativeHumidity,
                ]),
            }
        }
    }
}

/// Forward prefetches for every raw prerequisite.
pub fn prefetch(
    reader: &dyn ForecastReader,
    variable: &DerivedVariable,
    range: TimeRange,
    settings: &ReadSettings,
) {
    for raw in prerequisites(variable) {
        reader.prefetch(raw, range, settings);
    }
}

/// Fetch the prerequisites concurrently, in declaration order.
async fn fetch_all(
    reader: &dyn ForecastReader,
    vars: &[Variable],
    range: TimeRange,
    settings: &ReadSettings,
) -> Result<Vec<Vec<f32>>> {
    let fetched = try_join_all(vars.iter().map(|&v| reader.get(v, range, settings))).await?;
    Ok(fetched.into_iter().map(|(data, _)| data).collect())
}

fn zip2(a: &[f32], b: &[f32], f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// Compute a derived variable over the reader's resolved point.
pub async fn get(
    reader: &dyn ForecastReader,
    variable: DerivedVariable,
    range: TimeRange,
    settings: &ReadSettings,
) -> Result<(Vec<f32>, Unit)> {
    use pointcast_common::variable::DerivedSurfaceVariable as D;

    let coords = (reader.latitude(), reader.longitude());
    let raws = prerequisites(&variable);

    let derived = match variable {
        DerivedVariable::Surface(v) => match v {
            D::WindSpeed10m | D::WindSpeed100m => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (
                    zip2(&data[0], &data[1], meteorology::wind_speed),
                    Unit::MetresPerSecond,
                )
            }
            D::WindDirection10m | D::WindDirection100m => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (
                    zip2(&data[0], &data[1], meteorology::wind_direction),
                    Unit::DegreeDirection,
                )
            }
            D::DewPoint2m => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (zip2(&data[0], &data[1], meteorology::dew_point), Unit::Celsius)
            }
            D::WetBulbTemperature2m => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (
                    zip2(&data[0], &data[1], meteorology::wet_bulb_temperature),
                    Unit::Celsius,
                )
            }
            D::VapourPressureDeficit => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (
                    zip2(&data[0], &data[1], meteorology::vapour_pressure_deficit),
                    Unit::KiloPascal,
                )
            }
            D::ApparentTemperature => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                let [t, u, v, rh, rad] = &data[..] else {
                    unreachable!("five prerequisites");
                };
                let out = (0..t.len())
                    .map(|i| {
                        meteorology::apparent_temperature(
                            t[i],
                            rh[i],
                            meteorology::wind_speed(u[i], v[i]),
                            rad[i],
                        )
                    })
                    .collect();
                (out, Unit::Celsius)
            }
            D::SurfacePressure => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                let elevation = reader.target_elevation();
                (
                    zip2(&data[0], &data[1], |msl, t| {
                        meteorology::surface_pressure(msl, t, elevation)
                    }),
                    Unit::HectoPascal,
                )
            }
            D::Rain => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (zip2(&data[0], &data[1], meteorology::rain), Unit::Millimetre)
            }
            D::Snowfall => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                (
                    zip2(&data[0], &data[1], meteorology::snowfall),
                    Unit::Centimetre,
                )
            }
            D::DirectRadiation => {
                let (direct, _) = radiation_split(reader, &raws, range, settings, coords).await?;
                (direct, Unit::WattPerSquareMetre)
            }
            D::DirectNormalIrradiance => {
                let (direct, _) = radiation_split(reader, &raws, range, settings, coords).await?;
                (
                    radiation::direct_normal_irradiance(&direct, &range, coords.0, coords.1),
                    Unit::WattPerSquareMetre,
                )
            }
            D::GlobalTiltedIrradiance { tilt, azimuth } => {
                let (direct, diffuse) =
                    radiation_split(reader, &raws, range, settings, coords).await?;
                (
                    radiation::global_tilted_irradiance(
                        &direct, &diffuse, &range, coords.0, coords.1, tilt, azimuth,
                    ),
                    Unit::WattPerSquareMetre,
                )
            }
            D::TerrestrialRadiation => (
                solar::extraterrestrial_backwards_averaged(&range, coords.0, coords.1),
                Unit::WattPerSquareMetre,
            ),
            D::Et0FaoEvapotranspiration => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                let [t, rh, u, v, rad] = &data[..] else {
                    unreachable!("five prerequisites");
                };
                let elevation = reader.target_elevation();
                let step_hours = range.dt as f32 / 3600.0;
                let out = (0..t.len())
                    .map(|i| {
                        meteorology::et0_reference(
                            t[i],
                            rh[i],
                            meteorology::wind_speed(u[i], v[i]),
                            rad[i],
                            elevation,
                        ) * step_hours
                    })
                    .collect();
                (out, Unit::Millimetre)
            }
            D::WeatherCode => {
                let data = fetch_all(reader, &raws, range, settings).await?;
                let [cloud, precip, showers, t, cape, li, vis, frz] = &data[..] else {
                    unreachable!("eight prerequisites");
                };
                let per_hour = 3600.0 / range.dt as f32;
                let out = (0..cloud.len())
                    .map(|i| {
                        let precip_rate = precip[i].max(0.0) * per_hour;
                        let inputs = WeatherInputs {
                            cloud_cover: cloud[i],
                            precipitation: precip_rate,
                            showers: showers[i].max(0.0) * per_hour,
                            snowfall: meteorology::snowfall(precip_rate, t[i]),
                            temperature: t[i],
                            cape: cape[i],
                            lifted_index: li[i],
                            visibility: vis[i],
                            freezing_rain: frz[i],
                        };
                        weather_code(&inputs) as i32 as f32
                    })
                    .collect();
                (out, Unit::WmoCode)
            }
        },
        DerivedVariable::Pressure(v, level) => {
            let data = fetch_all(reader, &raws, range, settings).await?;
            match v {
                DerivedPressureVariable::CloudCover => (
                    data[0]
                        .iter()
                        .map(|&rh| meteorology::cloud_cover_from_humidity(rh, level as f32))
                        .collect(),
                    Unit::Percent,
                ),
                DerivedPressureVariable::WindSpeed => (
                    zip2(&data[0], &data[1], meteorology::wind_speed),
                    Unit::MetresPerSecond,
                ),
                DerivedPressureVariable::WindDirection => (
                    zip2(&data[0], &data[1], meteorology::wind_direction),
                    Unit::DegreeDirection,
                ),
                DerivedPressureVariable::DewPoint => (
                    zip2(&data[0], &data[1], meteorology::dew_point),
                    Unit::Celsius,
                ),
            }
        }
    };

    Ok(derived)
}

/// Fetch shortwave and diffuse, estimating diffuse from the clearness
/// index where the domain does not archive it.
async fn radiation_split(
    reader: &dyn ForecastReader,
    raws: &[Variable],
    range: TimeRange,
    settings: &ReadSettings,
    coords: (f64, f64),
) -> Result<(Vec<f32>, Vec<f32>)> {
    let data = fetch_all(reader, raws, range, settings).await?;
    let shortwave = &data[0];
    let archived_diffuse = &data[1];

    let estimated = radiation::diffuse_from_shortwave(shortwave, &range, coords.0, coords.1);
    let diffuse: Vec<f32> = archived_diffuse
        .iter()
        .zip(&estimated)
        .map(|(&a, &e)| if a.is_nan() { e } else { a })
        .collect();

    let direct = radiation::direct_radiation(shortwave, &diffuse);
    Ok((direct, diffuse))
}
