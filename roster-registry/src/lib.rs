//! # Roster Registry
//!
//! Authoritative node registries for roster.
//!
//! - **Memory**: thread-safe in-memory membership, with optional simulated
//!   latency and outages for exercising callers against a slow or failing
//!   source of truth
//!
//! ## Example
//!
//! ```rust,ignore
//! use roster_registry::{MemoryRegistry, NodeRegistry};
//!
//! let registry = MemoryRegistry::with_nodes(["node-a", "node-b"])?;
//! registry.insert("node-c").await?;
//! assert!(registry.contains("node-c").await?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;

pub use memory::{MemoryRegistry, RegistryStats};

// Re-export the trait from core
pub use roster_core::traits::NodeRegistry;
