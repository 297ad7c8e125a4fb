//! End-to-end reads through the full stack: archive files on disk,
//! cache, single-domain readers, mixer, and the derived engine.

use std::sync::Arc;
use std::time::Duration;

use chunk_archive::{ChunkCache, LocalStore, MasterSpan};
use derived_engine as derived;
use grid_geometry::RegularGrid;
use point_reader::{Domain, ForecastReader, GridPointReader, PointSelection};
use pointcast_common::variable::{
    DerivedSurfaceVariable, DerivedVariable, Interpolation, SurfaceVariable,
};
use pointcast_common::{ReadSettings, TimeRange, Unit, Variable};
use seamless_mixer::{open_reader, DomainKey, DomainRegistry, ModelToken, MultiDomainMixer, RegistryConfig};
use test_utils::{generators, DomainFixture};

const H: i64 = 3600;
const DAY: i64 = 24 * H;

/// A 3×3 one-degree grid over the Alps shared by the fixture domains.
fn small_grid() -> Arc<RegularGrid> {
    Arc::new(RegularGrid::new(3, 3, 46.0, 8.0, 1.0, 1.0))
}

async fn open_fixture_domain(
    root: &std::path::Path,
    key: &str,
    dt: i64,
    cache: Arc<ChunkCache>,
) -> Arc<Domain> {
    Domain::open(
        key,
        small_grid(),
        dt,
        DAY,
        None,
        Arc::new(LocalStore::new(root)),
        cache,
        Duration::from_secs(5),
        Duration::from_secs(30),
    )
    .await
    .unwrap()
}

fn point_reader(domain: Arc<Domain>) -> Arc<dyn ForecastReader> {
    Arc::new(
        GridPointReader::open(domain, 47.0, 9.0, None, PointSelection::Nearest).unwrap(),
    )
}

#[tokio::test]
async fn test_mixer_precedence_through_archive() {
    let dir = tempfile::tempdir().unwrap();

    // Global: 10.0 for two full days.
    let global = DomainFixture::new(dir.path(), "global", H, DAY);
    global.write_chunk_uniform("temperature_2m", 0, 20.0, 9, &generators::constant(10.0, 24));
    global.write_chunk_uniform("temperature_2m", 1, 20.0, 9, &generators::constant(10.0, 24));

    // Regional: 12.0 for steps 0..=6 only, NaN afterwards.
    let mut series = vec![f32::NAN; 24];
    for v in series.iter_mut().take(7) {
        *v = 12.0;
    }
    let regional = DomainFixture::new(dir.path(), "regional", H, DAY);
    regional.write_chunk_uniform("temperature_2m", 0, 20.0, 9, &series);

    let cache = Arc::new(ChunkCache::new(1 << 20));
    let global = open_fixture_domain(dir.path(), "global", H, cache.clone()).await;
    let regional = open_fixture_domain(dir.path(), "regional", H, cache).await;

    let mixer = MultiDomainMixer::new(
        vec![point_reader(global), point_reader(regional)],
        47.0,
        9.0,
    )
    .unwrap();

    let (data, unit) = mixer
        .get(
            Variable::surface(SurfaceVariable::Temperature2m),
            TimeRange::new(0, 13 * H, H),
            &ReadSettings::default(),
        )
        .await
        .unwrap();
    assert_eq!(unit, Unit::Celsius);
    assert_eq!(
        data,
        vec![12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]
    );
}

#[tokio::test]
async fn test_snow_depth_offset_correction_through_archive() {
    let dir = tempfile::tempdir().unwrap();

    let global = DomainFixture::new(dir.path(), "global", H, DAY);
    global.write_chunk_uniform("snow_depth", 0, 100.0, 9, &generators::constant(0.20, 24));

    let mut series = vec![f32::NAN; 24];
    for v in series.iter_mut().take(7) {
        *v = 0.52;
    }
    let regional = DomainFixture::new(dir.path(), "regional", H, DAY);
    regional.write_chunk_uniform("snow_depth", 0, 100.0, 9, &series);

    let cache = Arc::new(ChunkCache::new(1 << 20));
    let global = open_fixture_domain(dir.path(), "global", H, cache.clone()).await;
    let regional = open_fixture_domain(dir.path(), "regional", H, cache).await;

    let mixer = MultiDomainMixer::new(
        vec![point_reader(global), point_reader(regional)],
        47.0,
        9.0,
    )
    .unwrap();

    let (data, _) = mixer
        .get(
            Variable::surface(SurfaceVariable::SnowDepth),
            TimeRange::new(0, 12 * H, H),
            &ReadSettings::default(),
        )
        .await
        .unwrap();

    // No step jumps more than the physically plausible hourly change.
    for pair in data.windows(2) {
        assert!(
            (pair[1] - pair[0]).abs() < 0.05,
            "discontinuity at mixer boundary: {:?}",
            pair
        );
    }
}

#[tokio::test]
async fn test_six_hourly_source_interpolates_to_hourly() {
    let dir = tempfile::tempdir().unwrap();

    // dt = 6h, four steps per day-chunk: 10, 16, 22, 28.
    let coarse = DomainFixture::new(dir.path(), "coarse", 6 * H, DAY);
    coarse.write_chunk_uniform("snow_depth", 0, 100.0, 9, &generators::ramp(10.0, 6.0, 4));
    coarse.write_chunk_uniform("snow_depth", 1, 100.0, 9, &generators::ramp(34.0, 6.0, 4));

    let cache = Arc::new(ChunkCache::new(1 << 20));
    let domain = open_fixture_domain(dir.path(), "coarse", 6 * H, cache).await;
    let reader = point_reader(domain);

    // snow_depth interpolates linearly.
    assert_eq!(
        Variable::surface(SurfaceVariable::SnowDepth).interpolation(),
        Interpolation::Linear
    );
    let (data, _) = reader
        .get(
            Variable::surface(SurfaceVariable::SnowDepth),
            TimeRange::new(0, 6 * H, H),
            &ReadSettings::default(),
        )
        .await
        .unwrap();
    assert_eq!(data, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
}

#[tokio::test]
async fn test_apparent_temperature_through_archive() {
    let dir = tempfile::tempdir().unwrap();

    let domain_fixture = DomainFixture::new(dir.path(), "surface", H, DAY);
    domain_fixture.write_chunk_uniform("temperature_2m", 0, 20.0, 9, &generators::constant(20.0, 24));
    domain_fixture.write_chunk_uniform(
        "relative_humidity_2m",
        0,
        1.0,
        9,
        &generators::constant(50.0, 24),
    );
    domain_fixture.write_chunk_uniform("wind_u_component_10m", 0, 10.0, 9, &generators::constant(3.0, 24));
    domain_fixture.write_chunk_uniform("wind_v_component_10m", 0, 10.0, 9, &generators::constant(4.0, 24));
    domain_fixture.write_chunk_uniform("shortwave_radiation", 0, 1.0, 9, &generators::constant(0.0, 24));

    let cache = Arc::new(ChunkCache::new(1 << 20));
    let domain = open_fixture_domain(dir.path(), "surface", H, cache).await;
    let reader = point_reader(domain);

    let (data, unit) = derived::get(
        reader.as_ref(),
        DerivedVariable::Surface(DerivedSurfaceVariable::ApparentTemperature),
        TimeRange::new(0, 24 * H, H),
        &ReadSettings::default(),
    )
    .await
    .unwrap();
    assert_eq!(unit, Unit::Celsius);
    let expected = derived::meteorology::apparent_temperature(20.0, 50.0, 5.0, 0.0);
    for &v in &data {
        assert!((v - expected).abs() < 0.1, "{v} vs {expected}");
    }
}

#[tokio::test]
async fn test_master_file_read_through_domain() {
    let dir = tempfile::tempdir().unwrap();

    let span = MasterSpan { start: 0, end: 2 * DAY };
    let reanalysis = DomainFixture::new(dir.path(), "reanalysis", H, DAY);
    let rows: Vec<Vec<f32>> = (0..9).map(|_| generators::ramp(0.0, 1.0, 48)).collect();
    reanalysis.write_master("temperature_2m", span, 20.0, &rows);

    let cache = Arc::new(ChunkCache::new(1 << 20));
    let domain = Domain::open(
        "reanalysis",
        small_grid(),
        H,
        DAY,
        Some(span),
        Arc::new(LocalStore::new(dir.path())),
        cache,
        Duration::from_secs(5),
        Duration::from_secs(30),
    )
    .await
    .unwrap();
    let reader = point_reader(domain);

    let (data, _) = reader
        .get(
            Variable::surface(SurfaceVariable::Temperature2m),
            TimeRange::new(30 * H, 34 * H, H),
            &ReadSettings::default(),
        )
        .await
        .unwrap();
    assert_eq!(data, vec![30.0, 31.0, 32.0, 33.0]);
}

#[tokio::test]
async fn test_registry_and_selector_over_meta_only_archive() {
    let dir = tempfile::tempdir().unwrap();

    // Only two domains have metadata; no chunk data at all.
    DomainFixture::new(dir.path(), "icon_global", H, DAY).write_meta(0, 7 * DAY, None);
    DomainFixture::new(dir.path(), "icon_d2", H, DAY).write_meta(0, 2 * DAY, None);

    let registry = DomainRegistry::open(
        Arc::new(LocalStore::new(dir.path())),
        Arc::new(ChunkCache::new(1 << 20)),
        DomainKey::all(),
        &RegistryConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(registry.len(), 2);

    // The D2 ensemble aliases onto the deterministic D2 archive.
    assert!(registry.resolve(DomainKey::IconD2Eps).is_some());
    assert!(registry.resolve(DomainKey::Hrrr).is_none());

    // best_match over the Alps survives the missing domains and serves
    // a NaN-filled series of the right length.
    let mixer = open_reader(
        &registry,
        ModelToken::BestMatch,
        46.88,
        8.67,
        None,
        PointSelection::Nearest,
    )
    .await
    .unwrap();
    assert!(mixer.len() >= 2);

    let range = TimeRange::new(0, 6 * H, H);
    let (data, _) = mixer
        .get(
            Variable::surface(SurfaceVariable::Temperature2m),
            range,
            &ReadSettings::default(),
        )
        .await
        .unwrap();
    assert_eq!(data.len(), range.count());
    assert!(data.iter().all(|v| v.is_nan()));

    // A sole explicit token for an unregistered domain is an error.
    let err = open_reader(
        &registry,
        ModelToken::Single(DomainKey::Hrrr),
        39.0,
        -94.5,
        None,
        PointSelection::Nearest,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        pointcast_common::PointcastError::UnknownModel(_)
    ));

    // A registered domain that does not cover the point: no data.
    let err = open_reader(
        &registry,
        ModelToken::Single(DomainKey::IconD2),
        39.0,
        -94.5,
        None,
        PointSelection::Nearest,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, pointcast_common::PointcastError::OutsideGrid));
}
