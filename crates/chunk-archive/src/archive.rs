//! Per-domain read facade over the chunked archive.
//!
//! Turns `(variable, grid point, time range)` into the chunk files that
//! hold it, reads them through the shared cache, and assembles exactly
//! `range.count()` samples. Missing files contribute NaN, never a
//! shorter result. Domains with a master file serve requests inside its
//! span from that single file, bypassing chunk arithmetic.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use pointcast_common::{PointcastError, ReadSettings, Result, TimeRange};

use crate::cache::ChunkCache;
use crate::meta::MasterSpan;
use crate::store::ArchiveStore;

/// Reader for one domain's slice of the archive tree.
pub struct ChunkArchive {
    domain_key: String,
    store: Arc<dyn ArchiveStore>,
    cache: Arc<ChunkCache>,
    /// Native step in seconds.
    dt: i64,
    /// Seconds of data per chunk file; a multiple of `dt`.
    chunk_time_length: i64,
    master: Option<MasterSpan>,
    fetch_deadline: Duration,
}

impl ChunkArchive {
    pub fn new(
        domain_key: impl Into<String>,
        store: Arc<dyn ArchiveStore>,
        cache: Arc<ChunkCache>,
        dt: i64,
        chunk_time_length: i64,
        master: Option<MasterSpan>,
        fetch_deadline: Duration,
    ) -> Self {
        debug_assert!(chunk_time_length % dt == 0);
        Self {
            domain_key: domain_key.into(),
            store,
            cache,
            dt,
            chunk_time_length,
            master,
            fetch_deadline,
        }
    }

    /// Native step of this archive in seconds.
    pub fn dt(&self) -> i64 {
        self.dt
    }

    fn file_fragment(&self, variable_key: &str, member: usize) -> String {
        if member == 0 {
            variable_key.to_string()
        } else {
            // Separately stored ensemble members are a disjoint file
            // family next to the control run.
            format!("{variable_key}_member{member:02}")
        }
    }

    fn chunk_path(&self, variable_key: &str, member: usize, index: i64) -> String {
        format!(
            "{}/{}/chunk_{index}.dat",
            self.domain_key,
            self.file_fragment(variable_key, member)
        )
    }

    fn master_path(&self, variable_key: &str, member: usize) -> String {
        format!(
            "{}/{}/master.dat",
            self.domain_key,
            self.file_fragment(variable_key, member)
        )
    }

    fn validate(&self, range: &TimeRange) -> Result<()> {
        if range.dt != self.dt {
            return Err(PointcastError::InvalidTimeRange(format!(
                "archive read at dt {} from a {}s domain",
                range.dt, self.dt
            )));
        }
        if range.start % self.dt != 0 || range.end % self.dt != 0 {
            return Err(PointcastError::InvalidTimeRange(format!(
                "range {range} not aligned to dt {}",
                self.dt
            )));
        }
        Ok(())
    }

    /// The chunk file paths a read of `range` would touch, in time
    /// order.
    fn paths_for(&self, variable_key: &str, settings: &ReadSettings, range: &TimeRange) -> Vec<String> {
        if range.count() == 0 {
            return Vec::new();
        }
        if let Some(master) = &self.master {
            if master.covers(range.start, range.end) {
                return vec![self.master_path(variable_key, settings.ensemble_member)];
            }
        }
        let first = range.start.div_euclid(self.chunk_time_length);
        let last = (range.end - self.dt).div_euclid(self.chunk_time_length);
        (first..=last)
            .map(|ci| self.chunk_path(variable_key, settings.ensemble_member, ci))
            .collect()
    }

    /// Read one grid point over a native-resolution time range.
    ///
    /// The result always has exactly `range.count()` samples; spans not
    /// covered by any file are NaN.
    pub async fn read(
        &self,
        variable_key: &str,
        location: usize,
        settings: &ReadSettings,
        range: TimeRange,
    ) -> Result<Vec<f32>> {
        self.validate(&range)?;
        let mut out = vec![f32::NAN; range.count()];
        if out.is_empty() {
            return Ok(out);
        }

        let sub_level = settings.ensemble_member_level.unwrap_or(0);

        if let Some(master) = self.master {
            if master.covers(range.start, range.end) {
                let path = self.master_path(variable_key, settings.ensemble_member);
                self.fill_from_file(&path, master.start, location, sub_level, &range, &mut out)
                    .await?;
                return Ok(out);
            }
        }

        let first = range.start.div_euclid(self.chunk_time_length);
        let last = (range.end - self.dt).div_euclid(self.chunk_time_length);
        for ci in first..=last {
            let path = self.chunk_path(variable_key, settings.ensemble_member, ci);
            self.fill_from_file(
                &path,
                ci * self.chunk_time_length,
                location,
                sub_level,
                &range,
                &mut out,
            )
            .await?;
        }
        Ok(out)
    }

    /// Copy the overlap of one file into the output. A missing file
    /// leaves its span as NaN.
    async fn fill_from_file(
        &self,
        path: &str,
        file_start: i64,
        location: usize,
        sub_level: usize,
        range: &TimeRange,
        out: &mut [f32],
    ) -> Result<()> {
        let file = match self
            .cache
            .get_or_fetch(path, self.store.as_ref(), self.fetch_deadline)
            .await?
        {
            None => {
                debug!(path, "chunk absent, span stays NaN");
                return Ok(());
            }
            Some(f) => f,
        };

        let file_end = file_start + file.time_len as i64 * self.dt;
        let begin = range.start.max(file_start);
        let end = range.end.min(file_end);
        if begin >= end {
            return Ok(());
        }

        let src0 = ((begin - file_start) / self.dt) as usize;
        let src1 = ((end - file_start) / self.dt) as usize;
        let dst0 = ((begin - range.start) / self.dt) as usize;

        let row = file.read_row_range(location, sub_level, src0, src1)?;
        out[dst0..dst0 + row.len()].copy_from_slice(&row);
        Ok(())
    }

    /// Advisory prefetch: warm the cache for a later `read` of the same
    /// arguments. Safe to call redundantly; fetch failures surface at
    /// read time instead.
    pub fn will_need(&self, variable_key: &str, settings: &ReadSettings, range: TimeRange) {
        if self.validate(&range).is_err() {
            return;
        }
        for path in self.paths_for(variable_key, settings, &range) {
            if self.cache.contains(&path) {
                continue;
            }
            let cache = self.cache.clone();
            let store = self.store.clone();
            let deadline = self.fetch_deadline;
            tokio::spawn(async move {
                if let Err(e) = cache.get_or_fetch(&path, store.as_ref(), deadline).await {
                    debug!(path, error = %e, "prefetch failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ChunkFileBuilder;
    use crate::store::LocalStore;

    const H: i64 = 3600;
    /// 24 hourly steps per chunk.
    const L: i64 = 24 * H;

    /// Write a chunk file whose single location ramps `base, base+1, …`.
    fn write_chunk(root: &std::path::Path, variable: &str, index: i64, base: f32) {
        let steps = (L / H) as usize;
        let values: Vec<f32> = (0..steps).map(|i| base + i as f32).collect();
        let mut builder = ChunkFileBuilder::new(1, 1, steps, 10.0);
        builder.push_row(&values).unwrap();
        let dir = root.join("icon").join(variable);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("chunk_{index}.dat")), builder.finish().unwrap()).unwrap();
    }

    fn archive(root: &std::path::Path, master: Option<MasterSpan>) -> ChunkArchive {
        ChunkArchive::new(
            "icon",
            Arc::new(LocalStore::new(root)),
            Arc::new(ChunkCache::new(1 << 20)),
            H,
            L,
            master,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_read_spanning_two_chunks() {
        let dir = tempfile::tempdir().unwrap();
        write_chunk(dir.path(), "temperature_2m", 0, 0.0);
        write_chunk(dir.path(), "temperature_2m", 1, 100.0);
        let archive = archive(dir.path(), None);

        // Last 2 hours of chunk 0 plus first 3 of chunk 1.
        let range = TimeRange::new(22 * H, 27 * H, H);
        let data = archive
            .read("temperature_2m", 0, &ReadSettings::default(), range)
            .await
            .unwrap();
        assert_eq!(data, vec![22.0, 23.0, 100.0, 101.0, 102.0]);
    }

    #[tokio::test]
    async fn test_missing_chunk_fills_nan_keeps_length() {
        let dir = tempfile::tempdir().unwrap();
        write_chunk(dir.path(), "temperature_2m", 0, 0.0);
        let archive = archive(dir.path(), None);

        let range = TimeRange::new(22 * H, 28 * H, H);
        let data = archive
            .read("temperature_2m", 0, &ReadSettings::default(), range)
            .await
            .unwrap();
        assert_eq!(data.len(), range.count());
        assert_eq!(&data[0..2], &[22.0, 23.0]);
        assert!(data[2..].iter().all(|v| v.is_nan()));
    }

    #[tokio::test]
    async fn test_wholly_missing_variable_is_all_nan() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive(dir.path(), None);
        let range = TimeRange::new(0, 6 * H, H);
        let data = archive
            .read("cape", 0, &ReadSettings::default(), range)
            .await
            .unwrap();
        assert_eq!(data.len(), 6);
        assert!(data.iter().all(|v| v.is_nan()));
    }

    #[tokio::test]
    async fn test_master_file_bypasses_chunks() {
        let dir = tempfile::tempdir().unwrap();
        // Master spans two days; deliberately no chunk files exist.
        let steps = (2 * L / H) as usize;
        let values: Vec<f32> = (0..steps).map(|i| i as f32).collect();
        let mut builder = ChunkFileBuilder::new(1, 1, steps, 10.0);
        builder.push_row(&values).unwrap();
        let vdir = dir.path().join("icon/temperature_2m");
        std::fs::create_dir_all(&vdir).unwrap();
        std::fs::write(vdir.join("master.dat"), builder.finish().unwrap()).unwrap();

        let archive = archive(dir.path(), Some(MasterSpan { start: 0, end: 2 * L }));
        let range = TimeRange::new(23 * H, 26 * H, H);
        let data = archive
            .read("temperature_2m", 0, &ReadSettings::default(), range)
            .await
            .unwrap();
        assert_eq!(data, vec![23.0, 24.0, 25.0]);
    }

    #[tokio::test]
    async fn test_ensemble_member_routes_to_file_family() {
        let dir = tempfile::tempdir().unwrap();
        write_chunk(dir.path(), "temperature_2m", 0, 0.0);
        write_chunk(dir.path(), "temperature_2m_member03", 0, 500.0);
        let archive = archive(dir.path(), None);

        let range = TimeRange::new(0, 2 * H, H);
        let control = archive
            .read("temperature_2m", 0, &ReadSettings::default(), range)
            .await
            .unwrap();
        let member = ReadSettings {
            ensemble_member: 3,
            ..Default::default()
        };
        let data = archive
            .read("temperature_2m", 0, &member, range)
            .await
            .unwrap();
        assert_eq!(control, vec![0.0, 1.0]);
        assert_eq!(data, vec![500.0, 501.0]);
    }

    #[tokio::test]
    async fn test_mismatched_dt_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive(dir.path(), None);
        let range = TimeRange::new(0, 4 * H, 2 * H);
        let err = archive
            .read("temperature_2m", 0, &ReadSettings::default(), range)
            .await
            .unwrap_err();
        assert!(matches!(err, PointcastError::InvalidTimeRange(_)));
    }
}
