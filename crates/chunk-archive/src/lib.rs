//! Chunked time-series archive I/O.
//!
//! The archive stores one compressed file per `(variable, chunk index)`
//! under `<root>/<domain-key>/<variable>/chunk_<index>.dat`, plus
//! per-domain static fields and a `meta.json`. This crate owns the
//! chunk codec, the local/remote store backends, the process-wide
//! handle cache with request collapsing, and the per-domain read facade
//! that turns a time range into NaN-padded samples.

pub mod archive;
pub mod cache;
pub mod format;
pub mod meta;
pub mod static_files;
pub mod store;

pub use archive::ChunkArchive;
pub use cache::{CacheStats, ChunkCache};
pub use format::{ChunkFile, ChunkFileBuilder};
pub use meta::{DomainMeta, MasterSpan};
pub use static_files::{StaticFile, StaticKind};
pub use store::{ArchiveStore, LocalStore, RemoteStore, StorageConfig};
