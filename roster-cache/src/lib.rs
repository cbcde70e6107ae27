//! TTL-bounded caching for roster node registries.
//!
//! [`CachingRegistry`] wraps an authoritative [`NodeRegistry`] and answers
//! `list` / `contains` from a local snapshot, going back to the source only
//! when the snapshot is older than its TTL or right after a mutation.
//!
//! [`NodeRegistry`]: roster_core::NodeRegistry

mod cache;

pub use cache::{CacheStats, CachingRegistry};
