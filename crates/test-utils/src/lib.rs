//! Synthetic archive fixtures.
//!
//! Builds a miniature archive tree on disk (chunk files, static
//! fields, `meta.json`) so integration tests can exercise the whole
//! read path against a `LocalStore` without any network.

use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};

use chunk_archive::{ChunkFileBuilder, DomainMeta, MasterSpan};

pub mod generators;

/// Writes one domain's directory under an archive root.
pub struct DomainFixture {
    dir: PathBuf,
    dt: i64,
    chunk_time_length: i64,
}

impl DomainFixture {
    /// Start a domain at `<root>/<key>` with the given native step and
    /// chunk length in seconds.
    pub fn new(root: &Path, key: &str, dt: i64, chunk_time_length: i64) -> Self {
        let dir = root.join(key);
        std::fs::create_dir_all(&dir).expect("create domain dir");
        Self {
            dir,
            dt,
            chunk_time_length,
        }
    }

    /// Steps per chunk file.
    pub fn steps_per_chunk(&self) -> usize {
        (self.chunk_time_length / self.dt) as usize
    }

    /// Write `meta.json` covering `[valid_start, valid_end)`.
    pub fn write_meta(&self, valid_start: i64, valid_end: i64, master: Option<MasterSpan>) {
        let meta = DomainMeta {
            last_run: Utc.timestamp_opt(valid_start, 0).unwrap(),
            valid_start,
            valid_end,
            dt_seconds: self.dt,
            chunk_time_length: self.chunk_time_length,
            master,
        };
        let json = serde_json::to_vec_pretty(&meta).expect("serialize meta");
        std::fs::write(self.dir.join("meta.json"), json).expect("write meta.json");
    }

    /// Write one chunk file for a variable. `rows` is one series per
    /// grid location, each `steps_per_chunk()` long.
    pub fn write_chunk(
        &self,
        variable_key: &str,
        chunk_index: i64,
        scalefactor: f32,
        rows: &[Vec<f32>],
    ) {
        let steps = self.steps_per_chunk();
        let mut builder = ChunkFileBuilder::new(rows.len(), 1, steps, scalefactor);
        for row in rows {
            assert_eq!(row.len(), steps, "row length must match chunk steps");
            builder.push_row(row).expect("push row");
        }
        let dir = self.dir.join(variable_key);
        std::fs::create_dir_all(&dir).expect("create variable dir");
        std::fs::write(
            dir.join(format!("chunk_{chunk_index}.dat")),
            builder.finish().expect("finish chunk"),
        )
        .expect("write chunk");
    }

    /// Write a chunk where every location carries the same series.
    pub fn write_chunk_uniform(
        &self,
        variable_key: &str,
        chunk_index: i64,
        scalefactor: f32,
        locations: usize,
        series: &[f32],
    ) {
        let rows: Vec<Vec<f32>> = (0..locations).map(|_| series.to_vec()).collect();
        self.write_chunk(variable_key, chunk_index, scalefactor, &rows);
    }

    /// Write a master file spanning `span` for a variable.
    pub fn write_master(
        &self,
        variable_key: &str,
        span: MasterSpan,
        scalefactor: f32,
        rows: &[Vec<f32>],
    ) {
        let steps = ((span.end - span.start) / self.dt) as usize;
        let mut builder = ChunkFileBuilder::new(rows.len(), 1, steps, scalefactor);
        for row in rows {
            assert_eq!(row.len(), steps);
            builder.push_row(row).expect("push row");
        }
        let dir = self.dir.join(variable_key);
        std::fs::create_dir_all(&dir).expect("create variable dir");
        std::fs::write(
            dir.join("master.dat"),
            builder.finish().expect("finish master"),
        )
        .expect("write master");
    }

    /// Write the surface elevation field, one value per grid point.
    pub fn write_elevation(&self, values: &[f32]) {
        self.write_static("HSURF.dat", values);
    }

    /// Write the soil-type field.
    pub fn write_soil_type(&self, values: &[f32]) {
        self.write_static("soil_type.dat", values);
    }

    fn write_static(&self, file_name: &str, values: &[f32]) {
        let mut builder = ChunkFileBuilder::new(1, 1, values.len(), 1.0);
        builder.push_row(values).expect("push static row");
        let dir = self.dir.join("static");
        std::fs::create_dir_all(&dir).expect("create static dir");
        std::fs::write(
            dir.join(file_name),
            builder.finish().expect("finish static"),
        )
        .expect("write static");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = DomainFixture::new(dir.path(), "icon_d2", 3600, 24 * 3600);
        fixture.write_meta(0, 24 * 3600, None);
        fixture.write_chunk_uniform(
            "temperature_2m",
            0,
            20.0,
            4,
            &generators::ramp(0.0, 1.0, 24),
        );
        fixture.write_elevation(&[100.0, 200.0, 300.0, 400.0]);

        assert!(dir.path().join("icon_d2/meta.json").exists());
        assert!(dir
            .path()
            .join("icon_d2/temperature_2m/chunk_0.dat")
            .exists());
        assert!(dir.path().join("icon_d2/static/HSURF.dat").exists());
    }
}
