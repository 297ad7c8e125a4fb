//! Seamless multi-model composition.
//!
//! A "seamless" model token resolves to an ordered stack of per-domain
//! readers: coarse global first, fine regional last. The mixer fuses
//! their series with last-wins precedence per sample and keeps
//! cumulative variables continuous across model boundaries.

pub mod mixer;
pub mod registry;
pub mod selector;

pub use mixer::MultiDomainMixer;
pub use registry::{DomainKey, DomainRegistry, RegistryConfig};
pub use selector::{open_reader, reader_stack, ModelToken};
