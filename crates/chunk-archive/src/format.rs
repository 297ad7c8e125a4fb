//! The chunk file codec.
//!
//! A chunk file is a self-describing block of `(location × sub-level ×
//! time)` samples for one variable. Values are stored as scaled
//! little-endian `i16` (`i16::MIN` marks missing) and each row is
//! deflate-compressed independently, so a point read touches one row.
//!
//! Layout:
//!
//! ```text
//! magic     [u8; 4]  = b"PCHK"
//! version   u16      = 1
//! sub_levels u16     ≥ 1, ensemble members packed in one file
//! locations u32
//! time_len  u32
//! scale     f32      float → i16 factor
//! offsets   [u64; locations * sub_levels + 1]   payload byte offsets
//! payload   deflate rows, each time_len i16 values
//! ```

use bytes::Bytes;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use pointcast_common::{PointcastError, Result};

const MAGIC: [u8; 4] = *b"PCHK";
const VERSION: u16 = 1;
/// Sentinel for a missing sample in the scaled integer domain.
const MISSING: i16 = i16::MIN;

const HEADER_LEN: usize = 4 + 2 + 2 + 4 + 4 + 4;

/// A parsed chunk file handle over its raw bytes.
///
/// Parsing only validates the header and offset table; rows decompress
/// on demand. Handles are cheap to clone through `Arc` and safe to use
/// after cache eviction.
#[derive(Debug)]
pub struct ChunkFile {
    raw: Bytes,
    path: String,
    pub sub_levels: usize,
    pub locations: usize,
    pub time_len: usize,
    pub scalefactor: f32,
    offsets_start: usize,
    payload_start: usize,
}

impl ChunkFile {
    /// Parse and validate a chunk file. `path` is kept for error
    /// identity only.
    pub fn parse(raw: Bytes, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let fail = |reason: &str| PointcastError::decode_failure(&path, reason);

        if raw.len() < HEADER_LEN {
            return Err(fail("truncated header"));
        }
        if raw[0..4] != MAGIC {
            return Err(fail("bad magic"));
        }
        let version = u16::from_le_bytes([raw[4], raw[5]]);
        if version != VERSION {
            return Err(fail(&format!("unsupported version {version}")));
        }
        let sub_levels = u16::from_le_bytes([raw[6], raw[7]]) as usize;
        let locations = u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
        let time_len = u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]) as usize;
        let scalefactor = f32::from_le_bytes([raw[16], raw[17], raw[18], raw[19]]);
        if sub_levels == 0 || locations == 0 || time_len == 0 {
            return Err(fail("empty dimensions"));
        }
        if !scalefactor.is_finite() || scalefactor <= 0.0 {
            return Err(fail("invalid scale factor"));
        }

        let rows = locations * sub_levels;
        let offsets_start = HEADER_LEN;
        let payload_start = offsets_start + (rows + 1) * 8;
        if raw.len() < payload_start {
            return Err(fail("truncated offset table"));
        }

        Ok(Self {
            raw,
            path,
            sub_levels,
            locations,
            time_len,
            scalefactor,
            offsets_start,
            payload_start,
        })
    }

    /// Size of the backing buffer, used for cache accounting.
    pub fn byte_size(&self) -> usize {
        self.raw.len()
    }

    fn offset(&self, row: usize) -> Result<usize> {
        let at = self.offsets_start + row * 8;
        let bytes: [u8; 8] = self.raw[at..at + 8]
            .try_into()
            .map_err(|_| PointcastError::decode_failure(&self.path, "offset out of range"))?;
        Ok(u64::from_le_bytes(bytes) as usize)
    }

    /// Decompress one `(location, sub_level)` row to floats.
    pub fn read_row(&self, location: usize, sub_level: usize) -> Result<Vec<f32>> {
        let fail = |reason: &str| PointcastError::decode_failure(&self.path, reason);
        if location >= self.locations {
            return Err(fail("location out of range"));
        }
        if sub_level >= self.sub_levels {
            return Err(fail("sub level out of range"));
        }

        let row = location * self.sub_levels + sub_level;
        let begin = self.payload_start + self.offset(row)?;
        let end = self.payload_start + self.offset(row + 1)?;
        if begin > end || end > self.raw.len() {
            return Err(fail("row offsets inconsistent"));
        }

        let mut packed = vec![0u8; self.time_len * 2];
        let mut decoder = DeflateDecoder::new(&self.raw[begin..end]);
        decoder
            .read_exact(&mut packed)
            .map_err(|e| fail(&format!("deflate: {e}")))?;

        let inv = 1.0 / self.scalefactor;
        let out = packed
            .chunks_exact(2)
            .map(|b| {
                let v = i16::from_le_bytes([b[0], b[1]]);
                if v == MISSING {
                    f32::NAN
                } else {
                    v as f32 * inv
                }
            })
            .collect();
        Ok(out)
    }

    /// Decompress a row and slice `[t0, t1)` out of it.
    pub fn read_row_range(
        &self,
        location: usize,
        sub_level: usize,
        t0: usize,
        t1: usize,
    ) -> Result<Vec<f32>> {
        if t1 > self.time_len || t0 > t1 {
            return Err(PointcastError::decode_failure(
                &self.path,
                "time slice out of range",
            ));
        }
        let mut row = self.read_row(location, sub_level)?;
        row.truncate(t1);
        row.drain(..t0);
        Ok(row)
    }
}

/// Writer for chunk files; production ingest has its own, this one
/// feeds fixtures and static fields.
pub struct ChunkFileBuilder {
    sub_levels: usize,
    locations: usize,
    time_len: usize,
    scalefactor: f32,
    compressed_rows: Vec<Vec<u8>>,
}

impl ChunkFileBuilder {
    pub fn new(locations: usize, sub_levels: usize, time_len: usize, scalefactor: f32) -> Self {
        Self {
            sub_levels,
            locations,
            time_len,
            scalefactor,
            compressed_rows: Vec::with_capacity(locations * sub_levels),
        }
    }

    /// Append the next row (location-major, sub-level minor). NaN
    /// samples become the missing sentinel.
    pub fn push_row(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.time_len {
            return Err(PointcastError::InvalidMetadata(format!(
                "row length {} != time length {}",
                values.len(),
                self.time_len
            )));
        }
        let mut packed = Vec::with_capacity(values.len() * 2);
        for &v in values {
            let scaled = if v.is_nan() {
                MISSING
            } else {
                (v * self.scalefactor).round().clamp(
                    (MISSING + 1) as f32,
                    i16::MAX as f32,
                ) as i16
            };
            packed.extend_from_slice(&scaled.to_le_bytes());
        }
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&packed)
            .and_then(|_| encoder.finish())
            .map(|compressed| self.compressed_rows.push(compressed))
            .map_err(|e| PointcastError::storage(format!("deflate encode: {e}")))
    }

    /// Serialize the file. Fails unless every row was pushed.
    pub fn finish(self) -> Result<Vec<u8>> {
        let rows = self.locations * self.sub_levels;
        if self.compressed_rows.len() != rows {
            return Err(PointcastError::InvalidMetadata(format!(
                "expected {} rows, got {}",
                rows,
                self.compressed_rows.len()
            )));
        }

        let payload_len: usize = self.compressed_rows.iter().map(|r| r.len()).sum();
        let mut out = Vec::with_capacity(HEADER_LEN + (rows + 1) * 8 + payload_len);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(self.sub_levels as u16).to_le_bytes());
        out.extend_from_slice(&(self.locations as u32).to_le_bytes());
        out.extend_from_slice(&(self.time_len as u32).to_le_bytes());
        out.extend_from_slice(&self.scalefactor.to_le_bytes());

        let mut offset = 0u64;
        for row in &self.compressed_rows {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += row.len() as u64;
        }
        out.extend_from_slice(&offset.to_le_bytes());
        for row in &self.compressed_rows {
            out.extend_from_slice(row);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(rows: &[Vec<f32>], locations: usize, subs: usize, scale: f32) -> ChunkFile {
        let time_len = rows[0].len();
        let mut builder = ChunkFileBuilder::new(locations, subs, time_len, scale);
        for row in rows {
            builder.push_row(row).unwrap();
        }
        let bytes = builder.finish().unwrap();
        ChunkFile::parse(Bytes::from(bytes), "test/chunk_0.dat").unwrap()
    }

    #[test]
    fn test_roundtrip_with_scale() {
        let file = build(&[vec![21.35, -4.6, 0.0, 18.05]], 1, 1, 20.0);
        let row = file.read_row(0, 0).unwrap();
        assert_eq!(row.len(), 4);
        for (got, want) in row.iter().zip([21.35, -4.6, 0.0, 18.05]) {
            assert!((got - want).abs() < 0.5 / 20.0, "{got} vs {want}");
        }
    }

    #[test]
    fn test_missing_samples_are_nan() {
        let file = build(&[vec![1.0, f32::NAN, 3.0]], 1, 1, 10.0);
        let row = file.read_row(0, 0).unwrap();
        assert!(!row[0].is_nan());
        assert!(row[1].is_nan());
        assert!(!row[2].is_nan());
    }

    #[test]
    fn test_sub_level_rows_are_independent() {
        let file = build(
            &[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0], vec![4.0, 4.0]],
            2,
            2,
            10.0,
        );
        assert_eq!(file.read_row(0, 1).unwrap(), vec![2.0, 2.0]);
        assert_eq!(file.read_row(1, 0).unwrap(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_row_range_slicing() {
        let file = build(&[vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]], 1, 1, 1.0);
        assert_eq!(file.read_row_range(0, 0, 2, 5).unwrap(), vec![2.0, 3.0, 4.0]);
        assert!(file.read_row_range(0, 0, 2, 7).is_err());
    }

    #[test]
    fn test_corrupt_header_rejected() {
        assert!(ChunkFile::parse(Bytes::from_static(b"nope"), "x").is_err());

        let mut builder = ChunkFileBuilder::new(1, 1, 1, 1.0);
        builder.push_row(&[1.0]).unwrap();
        let mut bytes = builder.finish().unwrap();
        bytes[0] = b'X';
        assert!(ChunkFile::parse(Bytes::from(bytes), "x").is_err());
    }
}
