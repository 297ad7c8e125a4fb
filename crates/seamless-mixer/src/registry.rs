//! The process-wide domain registry.
//!
//! Grid geometry is a fixed property of each producer and lives here in
//! code; cadence (native step, chunk length, master span) comes from
//! each domain's `meta.json` at startup. The registry is built once and
//! shared read-only for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use chunk_archive::{ArchiveStore, ChunkCache, DomainMeta};
use grid_geometry::{
    GaussianGrid, Grid, LambertAzimuthalProjection, LambertConformalProjection, ProjectionGrid,
    RegularGrid, RotatedGrid,
};
use point_reader::Domain;
use pointcast_common::Result;

/// Every model domain the platform can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKey {
    IconGlobal,
    IconEu,
    IconD2,
    IconEps,
    IconD2Eps,
    GfsGlobal,
    Hrrr,
    AromeFrance,
    ArpegeEurope,
    KnmiHarmonie,
    MetNoNordic,
    JmaMsm,
    EcmwfIfs,
}

impl DomainKey {
    /// Directory name under the archive root.
    pub fn archive_key(&self) -> &'static str {
        match self {
            DomainKey::IconGlobal => "icon_global",
            DomainKey::IconEu => "icon_eu",
            DomainKey::IconD2 => "icon_d2",
            DomainKey::IconEps => "icon_eps",
            DomainKey::IconD2Eps => "icon_d2_eps",
            DomainKey::GfsGlobal => "gfs_global",
            DomainKey::Hrrr => "hrrr",
            DomainKey::AromeFrance => "arome_france",
            DomainKey::ArpegeEurope => "arpege_europe",
            DomainKey::KnmiHarmonie => "knmi_harmonie",
            DomainKey::MetNoNordic => "metno_nordic",
            DomainKey::JmaMsm => "jma_msm",
            DomainKey::EcmwfIfs => "ecmwf_ifs",
        }
    }

    pub fn all() -> &'static [DomainKey] {
        &[
            DomainKey::IconGlobal,
            DomainKey::IconEu,
            DomainKey::IconD2,
            DomainKey::IconEps,
            DomainKey::IconD2Eps,
            DomainKey::GfsGlobal,
            DomainKey::Hrrr,
            DomainKey::AromeFrance,
            DomainKey::ArpegeEurope,
            DomainKey::KnmiHarmonie,
            DomainKey::MetNoNordic,
            DomainKey::JmaMsm,
            DomainKey::EcmwfIfs,
        ]
    }

    /// The fixed grid geometry of this producer.
    pub fn grid(&self) -> Arc<dyn Grid> {
        match self {
            DomainKey::IconGlobal => {
                Arc::new(RegularGrid::new(1441, 2880, -90.0, -180.0, 0.125, 0.125))
            }
            DomainKey::IconEu => {
                Arc::new(RegularGrid::new(657, 1097, 29.5, -23.5, 0.0625, 0.0625))
            }
            DomainKey::IconD2 | DomainKey::IconD2Eps => {
                Arc::new(RegularGrid::new(746, 1215, 43.18, -3.94, 0.02, 0.02))
            }
            DomainKey::IconEps => {
                Arc::new(RegularGrid::new(721, 1440, -90.0, -180.0, 0.25, 0.25))
            }
            // GFS publishes on 0–360 longitudes.
            DomainKey::GfsGlobal => Arc::new(RegularGrid::new(721, 1440, -90.0, 0.0, 0.25, 0.25)),
            DomainKey::Hrrr => Arc::new(ProjectionGrid::new(
                LambertConformalProjection::new(-97.5, 38.5, 38.5, 38.5, 6_371_229.0),
                21.138123,
                -122.719528,
                3000.0,
                3000.0,
                1799,
                1059,
            )),
            DomainKey::AromeFrance => {
                Arc::new(RegularGrid::new(717, 1121, 37.5, -12.0, 0.025, 0.025))
            }
            DomainKey::ArpegeEurope => Arc::new(RegularGrid::new(521, 741, 20.0, -32.0, 0.1, 0.1)),
            DomainKey::KnmiHarmonie => Arc::new(RotatedGrid::new(
                38.0,
                -175.0,
                RegularGrid::new(301, 301, -3.0, -3.0, 0.02, 0.02),
            )),
            DomainKey::MetNoNordic => Arc::new(ProjectionGrid::new(
                LambertAzimuthalProjection::new(63.0, 15.0, 6_371_000.0),
                52.3,
                1.9,
                2500.0,
                2500.0,
                1000,
                900,
            )),
            DomainKey::JmaMsm => Arc::new(RegularGrid::new(505, 481, 22.4, 120.0, 0.05, 0.0625)),
            DomainKey::EcmwfIfs => Arc::new(GaussianGrid::o1280()),
        }
    }
}

/// Registry construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Deadline for chunk fetches, seconds.
    pub fetch_deadline_secs: u64,
    /// Deadline for static files, seconds. Longer: they are reused
    /// across requests.
    pub static_deadline_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fetch_deadline_secs: 20,
            static_deadline_secs: 180,
        }
    }
}

/// Immutable set of opened domains.
pub struct DomainRegistry {
    domains: HashMap<DomainKey, Arc<Domain>>,
}

impl DomainRegistry {
    /// Open every domain with a `meta.json` in the archive. Domains
    /// without metadata are simply absent; the selector degrades around
    /// them.
    pub async fn open(
        store: Arc<dyn ArchiveStore>,
        cache: Arc<ChunkCache>,
        keys: &[DomainKey],
        config: &RegistryConfig,
    ) -> Result<DomainRegistry> {
        let fetch_deadline = Duration::from_secs(config.fetch_deadline_secs);
        let static_deadline = Duration::from_secs(config.static_deadline_secs);

        let mut domains = HashMap::new();
        for &key in keys {
            let archive_key = key.archive_key();
            let meta =
                match DomainMeta::load(store.as_ref(), archive_key, static_deadline).await? {
                    None => {
                        warn!(domain = archive_key, "no meta.json, domain not registered");
                        continue;
                    }
                    Some(m) => m,
                };
            let domain = Domain::open(
                archive_key,
                key.grid(),
                meta.dt_seconds,
                meta.chunk_time_length,
                meta.master,
                store.clone(),
                cache.clone(),
                fetch_deadline,
                static_deadline,
            )
            .await?;
            info!(domain = archive_key, dt = meta.dt_seconds, "registered domain");
            domains.insert(key, domain);
        }
        Ok(DomainRegistry { domains })
    }

    /// Look up a domain, applying the documented aliasing: the D2
    /// ensemble falls back to the deterministic D2 domain (same grid)
    /// when its own archive is not present.
    pub fn resolve(&self, key: DomainKey) -> Option<Arc<Domain>> {
        if let Some(d) = self.domains.get(&key) {
            return Some(d.clone());
        }
        match key {
            DomainKey::IconD2Eps => self.domains.get(&DomainKey::IconD2).cloned(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
