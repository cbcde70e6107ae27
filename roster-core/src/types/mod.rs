//! Domain types for roster.
//!
//! - [`Node`]: a registered cluster node
//! - [`NodeList`]: an immutable, ordered listing of nodes

mod node;
mod node_list;

pub use node::*;
pub use node_list::*;
