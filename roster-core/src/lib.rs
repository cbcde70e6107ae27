//! # Roster Core
//!
//! Core types, errors, traits and clocks shared by every roster crate.
//!
//! - **Types**: [`Node`] records and immutable [`NodeList`] snapshots
//! - **Errors**: the [`RegistryError`] hierarchy
//! - **Traits**: the [`NodeRegistry`] capability surface (list / contains / insert / delete)
//! - **Clock**: injectable time source used for snapshot expiration
//! - **Config**: cache tuning loaded from defaults or the environment
//!
//! ## Example
//!
//! ```rust
//! use roster_core::{Node, NodeList};
//!
//! let nodes = NodeList::from(vec![Node::new("node-a"), Node::new("node-b")]);
//! assert!(nodes.contains("node-a"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use constants::*;
pub use error::{RegistryError, Result};
pub use traits::*;
pub use types::*;
