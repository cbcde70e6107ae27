//! Node records held by a registry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_NODE_ID_LEN;
use crate::error::{RegistryError, Result};

/// A cluster node registered with the authoritative registry.
///
/// The identifier is the only field registries compare on; labels are
/// opaque attributes carried along with the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier (usually a host name)
    pub id: String,
    /// Free-form attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// When the node was registered
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl Node {
    /// Creates a node record with no labels, registered now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: BTreeMap::new(),
            registered_at: Utc::now(),
        }
    }

    /// Adds a label, replacing any previous value for `key`.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Validates the node record.
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.id)
    }
}

/// Checks that `id` is usable as a node identifier.
///
/// Identifiers must be non-empty, at most [`MAX_NODE_ID_LEN`] bytes, and
/// free of whitespace and control characters.
pub fn validate_node_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(RegistryError::InvalidNodeId("node id cannot be empty".into()));
    }

    if id.len() > MAX_NODE_ID_LEN {
        return Err(RegistryError::InvalidNodeId(format!(
            "node id too long: {} bytes, maximum {}",
            id.len(),
            MAX_NODE_ID_LEN
        )));
    }

    if let Some(c) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(RegistryError::InvalidNodeId(format!(
            "node id {:?} contains forbidden character {:?}",
            id, c
        )));
    }

    Ok(())
}
