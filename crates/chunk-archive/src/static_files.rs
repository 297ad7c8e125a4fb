//! Static per-domain fields: surface elevation and soil type.
//!
//! Stored under `<domain-key>/static/` in the chunk format with a
//! single row spanning every grid point. The field decodes once per
//! handle and then serves point lookups from memory; terrain-optimised
//! point selection borrows the whole decoded field.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::warn;

use pointcast_common::Result;

use crate::cache::ChunkCache;
use crate::format::ChunkFile;
use crate::store::ArchiveStore;

/// The static fields a domain may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticKind {
    Elevation,
    SoilType,
}

impl StaticKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            StaticKind::Elevation => "HSURF.dat",
            StaticKind::SoilType => "soil_type.dat",
        }
    }
}

/// A decoded static field for one domain.
pub struct StaticFile {
    handle: Arc<ChunkFile>,
    values: OnceLock<Vec<f32>>,
}

impl StaticFile {
    /// Load a static field through the shared cache. `Ok(None)` when
    /// the domain ships no such file; readers then skip elevation
    /// correction rather than fail.
    pub async fn load(
        store: &dyn ArchiveStore,
        cache: &ChunkCache,
        domain_key: &str,
        kind: StaticKind,
        deadline: Duration,
    ) -> Result<Option<StaticFile>> {
        let path = format!("{domain_key}/static/{}", kind.file_name());
        let handle = match cache.get_or_fetch(&path, store, deadline).await? {
            None => return Ok(None),
            Some(h) => h,
        };
        Ok(Some(StaticFile {
            handle,
            values: OnceLock::new(),
        }))
    }

    /// The full decoded field, indexed by grid point. Empty when the
    /// row fails to decode; lookups then behave as missing data.
    pub fn values(&self) -> &[f32] {
        self.values.get_or_init(|| match self.handle.read_row(0, 0) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "static field decode failed");
                Vec::new()
            }
        })
    }

    /// Value at a grid point; `None` for out-of-range or missing data.
    pub fn value(&self, gridpoint: usize) -> Option<f32> {
        self.values()
            .get(gridpoint)
            .copied()
            .filter(|v| v.is_finite())
    }
}
