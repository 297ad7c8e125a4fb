//! Per-domain archive metadata (`meta.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use pointcast_common::Result;

use crate::store::ArchiveStore;

/// The time span covered by a monolithic master file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSpan {
    /// First sample timestamp, seconds since epoch.
    pub start: i64,
    /// Exclusive end, seconds since epoch.
    pub end: i64,
}

impl MasterSpan {
    /// Whether `[start, end)` lies fully inside the master span.
    pub fn covers(&self, start: i64, end: i64) -> bool {
        self.start <= start && end <= self.end
    }
}

/// Metadata sidecar written by the ingest pipeline after each model
/// run; the reader treats it as the source of truth for cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMeta {
    /// Completion time of the last ingested run.
    pub last_run: DateTime<Utc>,
    /// First valid sample timestamp in the archive.
    pub valid_start: i64,
    /// Exclusive end of valid samples.
    pub valid_end: i64,
    /// Native model step in seconds.
    pub dt_seconds: i64,
    /// Seconds of data per chunk file; a multiple of `dt_seconds`.
    pub chunk_time_length: i64,
    /// Reanalysis-style domains keep one monolithic file for a declared
    /// span instead of chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterSpan>,
}

impl DomainMeta {
    /// Load `<domain-key>/meta.json`; `Ok(None)` when the domain has no
    /// metadata yet.
    pub async fn load(
        store: &dyn ArchiveStore,
        domain_key: &str,
        deadline: Duration,
    ) -> Result<Option<DomainMeta>> {
        let path = format!("{domain_key}/meta.json");
        let bytes = match tokio::time::timeout(deadline, store.fetch(&path)).await {
            Err(_) => {
                return Err(pointcast_common::PointcastError::Timeout {
                    path,
                    deadline_secs: deadline.as_secs(),
                })
            }
            Ok(result) => match result? {
                None => return Ok(None),
                Some(b) => b,
            },
        };
        let meta: DomainMeta = serde_json::from_slice(&bytes)?;
        Ok(Some(meta))
    }
}
