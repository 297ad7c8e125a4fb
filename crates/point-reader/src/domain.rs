//! A registered model domain.

use std::sync::Arc;
use std::time::Duration;

use chunk_archive::{ArchiveStore, ChunkArchive, ChunkCache, MasterSpan, StaticFile, StaticKind};
use grid_geometry::Grid;
use pointcast_common::Result;

/// One NWP model deployment: a grid, a native step, and its slice of
/// the archive tree with static fields.
///
/// Domains are immutable process-wide registrations; readers borrow
/// them through `Arc` for the life of a request.
pub struct Domain {
    key: String,
    grid: Arc<dyn Grid>,
    dt: i64,
    archive: ChunkArchive,
    elevation: Option<StaticFile>,
    soil_type: Option<StaticFile>,
}

impl Domain {
    /// Open a domain against an archive. Static fields load eagerly
    /// with the longer deadline; a domain without them still serves
    /// data, only without elevation handling.
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        key: impl Into<String>,
        grid: Arc<dyn Grid>,
        dt: i64,
        chunk_time_length: i64,
        master: Option<MasterSpan>,
        store: Arc<dyn ArchiveStore>,
        cache: Arc<ChunkCache>,
        fetch_deadline: Duration,
        static_deadline: Duration,
    ) -> Result<Arc<Domain>> {
        let key = key.into();
        let archive = ChunkArchive::new(
            key.clone(),
            store.clone(),
            cache.clone(),
            dt,
            chunk_time_length,
            master,
            fetch_deadline,
        );
        let elevation = StaticFile::load(
            store.as_ref(),
            cache.as_ref(),
            &key,
            StaticKind::Elevation,
            static_deadline,
        )
        .await?;
        let soil_type = StaticFile::load(
            store.as_ref(),
            cache.as_ref(),
            &key,
            StaticKind::SoilType,
            static_deadline,
        )
        .await?;

        Ok(Arc::new(Domain {
            key,
            grid,
            dt,
            archive,
            elevation,
            soil_type,
        }))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn grid(&self) -> &dyn Grid {
        self.grid.as_ref()
    }

    /// Native step in seconds.
    pub fn dt(&self) -> i64 {
        self.dt
    }

    pub fn archive(&self) -> &ChunkArchive {
        &self.archive
    }

    /// Static field of the given kind at a grid point.
    pub fn static_value(&self, kind: StaticKind, gridpoint: usize) -> Option<f32> {
        let field = match kind {
            StaticKind::Elevation => self.elevation.as_ref(),
            StaticKind::SoilType => self.soil_type.as_ref(),
        }?;
        field.value(gridpoint)
    }

    /// The full elevation field, for terrain-optimised point selection.
    pub fn elevation_field(&self) -> Option<&[f32]> {
        self.elevation.as_ref().map(|f| f.values())
    }
}
