//! Common traits for roster.
//!
//! These traits define the interfaces that registries and their decorators
//! satisfy, so a cache can sit in front of any authoritative source.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::NodeList;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for cluster node membership.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - A remote control plane reached over the network
/// - A caching decorator in front of either
///
/// Every method may block on I/O; callers that need a deadline should wrap
/// the call in their own timeout.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Returns every registered node.
    async fn list(&self) -> Result<NodeList>;

    /// Returns true if a node with the given identifier is registered.
    async fn contains(&self, id: &str) -> Result<bool>;

    /// Registers a node.
    async fn insert(&self, id: &str) -> Result<()>;

    /// Removes a node.
    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<T: NodeRegistry + ?Sized> NodeRegistry for Arc<T> {
    async fn list(&self) -> Result<NodeList> {
        (**self).list().await
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        (**self).contains(id).await
    }

    async fn insert(&self, id: &str) -> Result<()> {
        (**self).insert(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Node;

    struct FixedRegistry(NodeList);

    #[async_trait]
    impl NodeRegistry for FixedRegistry {
        async fn list(&self) -> Result<NodeList> {
            Ok(self.0.clone())
        }

        async fn contains(&self, id: &str) -> Result<bool> {
            Ok(self.0.contains(id))
        }

        async fn insert(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_arc_forwards_to_inner() {
        let inner = FixedRegistry(NodeList::from(vec![Node::new("a")]));
        let shared: Arc<dyn NodeRegistry> = Arc::new(inner);

        assert_eq!(shared.list().await.unwrap().len(), 1);
        assert!(shared.contains("a").await.unwrap());
        assert!(!shared.contains("b").await.unwrap());
    }
}
