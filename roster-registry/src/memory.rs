//! In-memory node registry.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use roster_core::error::{RegistryError, Result};
use roster_core::traits::NodeRegistry;
use roster_core::types::{validate_node_id, Node, NodeList};

/// Call counters for a [`MemoryRegistry`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// `list` calls served
    pub list_calls: u64,
    /// `contains` calls served
    pub contains_calls: u64,
    /// `insert` calls served
    pub insert_calls: u64,
    /// `delete` calls served
    pub delete_calls: u64,
    /// Calls rejected because the registry was marked unavailable
    pub rejected_calls: u64,
}

/// In-memory node registry.
///
/// Uses concurrent data structures for thread-safe access without
/// requiring external synchronization.
///
/// # Simulation
///
/// To stand in for a remote control plane, every call can be delayed by a
/// fixed latency, and the whole registry can be marked unavailable, in
/// which case every call fails with [`RegistryError::Unavailable`].
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// Primary storage: node ID → Node
    nodes: DashMap<String, Node>,
    /// Simulated per-call latency
    latency: RwLock<Duration>,
    /// Whether calls currently succeed
    available: AtomicBool,
    list_calls: AtomicU64,
    contains_calls: AtomicU64,
    insert_calls: AtomicU64,
    delete_calls: AtomicU64,
    rejected_calls: AtomicU64,
}

impl MemoryRegistry {
    /// Creates a new empty in-memory registry.
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
            latency: RwLock::new(Duration::ZERO),
            available: AtomicBool::new(true),
            list_calls: AtomicU64::new(0),
            contains_calls: AtomicU64::new(0),
            insert_calls: AtomicU64::new(0),
            delete_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
        }
    }

    /// Creates a registry pre-populated with the given node identifiers.
    pub fn with_nodes<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        registry.import(ids.into_iter().map(Node::new))?;
        Ok(registry)
    }

    /// Sets the simulated latency applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    /// Marks the registry available or unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns true if calls currently succeed.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Returns the call counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            list_calls: self.list_calls.load(Ordering::SeqCst),
            contains_calls: self.contains_calls.load(Ordering::SeqCst),
            insert_calls: self.insert_calls.load(Ordering::SeqCst),
            delete_calls: self.delete_calls.load(Ordering::SeqCst),
            rejected_calls: self.rejected_calls.load(Ordering::SeqCst),
        }
    }

    /// Clears all nodes.
    pub fn clear(&self) {
        self.nodes.clear();
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Imports node records, replacing any with the same identifier.
    ///
    /// Bypasses the simulated latency and availability; this is a
    /// seeding operation, not a client call.
    pub fn import(&self, nodes: impl IntoIterator<Item = Node>) -> Result<usize> {
        let mut imported = 0;

        for node in nodes {
            node.validate()?;
            self.nodes.insert(node.id.clone(), node);
            imported += 1;
        }

        Ok(imported)
    }

    /// Returns all nodes sorted by identifier.
    pub fn snapshot(&self) -> NodeList {
        let mut nodes: Vec<Node> = self
            .nodes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        NodeList::from(nodes)
    }

    /// Applies latency and availability to a client call.
    async fn admit(&self, counter: &AtomicU64) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.read();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !self.is_available() {
            self.rejected_calls.fetch_add(1, Ordering::SeqCst);
            return Err(RegistryError::Unavailable("memory registry marked unavailable".into()));
        }

        Ok(())
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRegistry for MemoryRegistry {
    /// Lists every node, ordered by identifier.
    #[instrument(skip(self))]
    async fn list(&self) -> Result<NodeList> {
        self.admit(&self.list_calls).await?;
        let nodes = self.snapshot();
        debug!(count = nodes.len(), "Listed nodes");
        Ok(nodes)
    }

    #[instrument(skip(self))]
    async fn contains(&self, id: &str) -> Result<bool> {
        self.admit(&self.contains_calls).await?;
        Ok(self.nodes.contains_key(id))
    }

    /// Registers a node. Inserting an existing node is a no-op.
    #[instrument(skip(self))]
    async fn insert(&self, id: &str) -> Result<()> {
        validate_node_id(id)?;
        self.admit(&self.insert_calls).await?;

        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id));

        debug!(id, "Inserted node");
        Ok(())
    }

    /// Removes a node; fails with `NodeNotFound` if it is not registered.
    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        self.admit(&self.delete_calls).await?;

        if self.nodes.remove(id).is_none() {
            return Err(RegistryError::NodeNotFound(id.to_string()));
        }

        debug!(id, "Deleted node");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_contains() {
        let registry = MemoryRegistry::new();

        registry.insert("node-a").await.unwrap();

        assert!(registry.contains("node-a").await.unwrap());
        assert!(!registry.contains("node-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let registry = MemoryRegistry::with_nodes(["node-c", "node-a", "node-b"]).unwrap();

        let nodes = registry.list().await.unwrap();
        assert_eq!(nodes.ids(), vec!["node-a", "node-b", "node-c"]);
    }

    #[tokio::test]
    async fn test_insert_existing_is_noop() {
        let registry = MemoryRegistry::new();

        registry.insert("node-a").await.unwrap();
        let first = registry.list().await.unwrap();
        registry.insert("node-a").await.unwrap();
        let second = registry.list().await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(first.get("node-a"), second.get("node-a"));
    }

    #[tokio::test]
    async fn test_insert_invalid_id_rejected() {
        let registry = MemoryRegistry::new();

        let result = registry.insert("").await;
        assert!(matches!(result, Err(RegistryError::InvalidNodeId(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = MemoryRegistry::with_nodes(["node-a"]).unwrap();

        registry.delete("node-a").await.unwrap();
        assert!(registry.is_empty());

        let err = registry.delete("node-a").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unavailable_rejects_calls() {
        let registry = MemoryRegistry::with_nodes(["node-a"]).unwrap();
        registry.set_available(false);

        assert!(matches!(registry.list().await, Err(RegistryError::Unavailable(_))));
        assert!(registry.insert("node-b").await.is_err());
        assert!(registry.delete("node-a").await.is_err());

        // Nothing changed behind the outage
        registry.set_available(true);
        assert_eq!(registry.list().await.unwrap().ids(), vec!["node-a"]);
    }

    #[tokio::test]
    async fn test_stats_count_calls() {
        let registry = MemoryRegistry::new();
        registry.insert("node-a").await.unwrap();
        registry.list().await.unwrap();
        registry.list().await.unwrap();
        registry.contains("node-a").await.unwrap();
        registry.set_available(false);
        let _ = registry.delete("node-a").await;

        let stats = registry.stats();
        assert_eq!(stats.insert_calls, 1);
        assert_eq!(stats.list_calls, 2);
        assert_eq!(stats.contains_calls, 1);
        assert_eq!(stats.delete_calls, 1);
        assert_eq!(stats.rejected_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let registry = MemoryRegistry::with_nodes(["node-a"]).unwrap();
        registry.set_latency(Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        registry.list().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_import_validates() {
        let registry = MemoryRegistry::new();
        let result = registry.import(vec![Node::new("ok"), Node::new("not ok")]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_insert() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let mut tasks = JoinSet::new();

        // Spawn 100 concurrent insert tasks
        for i in 0..100 {
            let reg = registry.clone();
            tasks.spawn(async move { reg.insert(&format!("node-{i}")).await.unwrap() });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(registry.len(), 100);
    }

    #[test]
    fn test_clear() {
        let registry = MemoryRegistry::with_nodes(["a", "b"]).unwrap();
        assert_eq!(registry.len(), 2);
        registry.clear();
        assert!(registry.is_empty());
    }
}
