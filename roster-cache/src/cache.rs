//! Snapshot cache in front of an authoritative node registry.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use roster_core::clock::{Clock, SystemClock};
use roster_core::config::CacheConfig;
use roster_core::error::{RegistryError, Result};
use roster_core::traits::NodeRegistry;
use roster_core::types::NodeList;

/// The cached listing and the time it was fetched, always replaced together.
struct Snapshot {
    nodes: NodeList,
    fetched_at: DateTime<Utc>,
}

/// Caching decorator over a [`NodeRegistry`].
///
/// Holds one snapshot of the delegate's full listing. `list` and `contains`
/// are served from it while it is younger than the TTL; once it is older,
/// the next query refreshes it first. `insert` and `delete` are written
/// through to the delegate and followed by an unconditional refresh, so a
/// caller always reads its own writes.
///
/// # Concurrency
///
/// The snapshot lives behind an async `RwLock`. Staleness is first checked
/// against an atomic copy of the fetch time without taking the lock, then
/// re-checked under the write lock, so any number of callers that notice
/// staleness at once cause a single delegate fetch.
///
/// # Failures
///
/// A failed refresh keeps the previous snapshot and fetch time. The error
/// is returned as [`RegistryError::RefreshFailed`], which carries the
/// last-known-good listing. Because the fetch time is left alone, the next
/// query tries again.
pub struct CachingRegistry<R> {
    delegate: R,
    ttl: Duration,
    /// TTL in nanoseconds, saturated to `i64::MAX`
    ttl_nanos: i64,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Snapshot>,
    /// Mirror of `snapshot.fetched_at`, only written under the write lock
    last_update_nanos: AtomicI64,
    fetches: AtomicU64,
    failed_fetches: AtomicU64,
}

/// Nanoseconds since the Unix epoch, saturating outside the `i64` range
/// (roughly years 1677 to 2262).
fn nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(if at.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Point-in-time view of a [`CachingRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Nodes in the current snapshot
    pub node_count: usize,
    /// When the current snapshot was fetched
    pub last_update: DateTime<Utc>,
    /// Snapshot age according to the cache's clock
    pub age: Duration,
    /// Configured time-to-live
    pub ttl: Duration,
    /// Whether the snapshot is older than the TTL
    pub expired: bool,
    /// Delegate `list` calls made, including the initial one
    pub fetches: u64,
    /// Delegate `list` calls that failed
    pub failed_fetches: u64,
}

impl<R: NodeRegistry> CachingRegistry<R> {
    /// Creates a cache over `delegate` using the system clock.
    ///
    /// Fetches the initial snapshot; fails if that fetch fails.
    pub async fn new(delegate: R, ttl: Duration) -> Result<Self> {
        Self::with_clock(delegate, ttl, Arc::new(SystemClock)).await
    }

    /// Creates a cache from configuration.
    pub async fn from_config(
        delegate: R,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_clock(delegate, config.ttl(), clock).await
    }

    /// Creates a cache that measures snapshot age with `clock`.
    pub async fn with_clock(delegate: R, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        let nodes = delegate.list().await?;
        let fetched_at = clock.now();

        info!(
            nodes = nodes.len(),
            ttl_ms = ttl.as_millis() as u64,
            "Caching registry initialized"
        );

        Ok(Self {
            delegate,
            ttl,
            ttl_nanos: i64::try_from(ttl.as_nanos()).unwrap_or(i64::MAX),
            clock,
            last_update_nanos: AtomicI64::new(nanos(fetched_at)),
            snapshot: RwLock::new(Snapshot { nodes, fetched_at }),
            fetches: AtomicU64::new(1),
            failed_fetches: AtomicU64::new(0),
        })
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the wrapped registry.
    pub fn delegate(&self) -> &R {
        &self.delegate
    }

    /// Returns when the current snapshot was fetched.
    pub async fn last_update(&self) -> DateTime<Utc> {
        self.snapshot.read().await.fetched_at
    }

    /// Returns a snapshot of cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let snapshot = self.snapshot.read().await;
        let age_nanos = self.age_nanos(nanos(snapshot.fetched_at));

        CacheStats {
            node_count: snapshot.nodes.len(),
            last_update: snapshot.fetched_at,
            age: Duration::from_nanos(age_nanos.max(0) as u64),
            ttl: self.ttl,
            expired: age_nanos > self.ttl_nanos,
            fetches: self.fetches.load(Ordering::SeqCst),
            failed_fetches: self.failed_fetches.load(Ordering::SeqCst),
        }
    }

    /// Refreshes the snapshot from the delegate regardless of its age.
    pub async fn refresh_now(&self) -> Result<()> {
        self.refresh(true).await
    }

    fn age_nanos(&self, fetched_at_nanos: i64) -> i64 {
        nanos(self.clock.now()).saturating_sub(fetched_at_nanos)
    }

    /// Lock-free staleness check against the mirrored fetch time.
    fn expired(&self) -> bool {
        self.age_nanos(self.last_update_nanos.load(Ordering::Acquire)) > self.ttl_nanos
    }

    /// Replaces the snapshot with a fresh listing from the delegate.
    ///
    /// Unless `force` is set, staleness is re-checked under the write lock
    /// and the fetch is skipped if another caller already refreshed.
    async fn refresh(&self, force: bool) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;

        if !force && self.age_nanos(nanos(snapshot.fetched_at)) <= self.ttl_nanos {
            debug!("Snapshot already refreshed by another caller");
            return Ok(());
        }

        self.fetches.fetch_add(1, Ordering::SeqCst);

        match self.delegate.list().await {
            Ok(nodes) => {
                let fetched_at = self.clock.now();
                debug!(nodes = nodes.len(), force, "Snapshot refreshed");
                *snapshot = Snapshot { nodes, fetched_at };
                self.last_update_nanos
                    .store(nanos(fetched_at), Ordering::Release);
                Ok(())
            }
            Err(err) => {
                self.failed_fetches.fetch_add(1, Ordering::SeqCst);
                warn!(
                    error = %err,
                    stale_nodes = snapshot.nodes.len(),
                    "Snapshot refresh failed, keeping last good snapshot"
                );
                Err(RegistryError::RefreshFailed {
                    stale: snapshot.nodes.clone(),
                    source: Box::new(err),
                })
            }
        }
    }
}

#[async_trait]
impl<R: NodeRegistry> NodeRegistry for CachingRegistry<R> {
    /// Returns the cached listing, refreshing it first if it has expired.
    ///
    /// If that refresh fails, the error carries the previous listing.
    #[instrument(skip(self))]
    async fn list(&self) -> Result<NodeList> {
        if self.expired() {
            self.refresh(false).await?;
        } else {
            debug!("Serving list from snapshot");
        }
        Ok(self.snapshot.read().await.nodes.clone())
    }

    #[instrument(skip(self))]
    async fn contains(&self, id: &str) -> Result<bool> {
        if self.expired() {
            self.refresh(false).await?;
        } else {
            debug!("Serving contains from snapshot");
        }
        // Hold the read lock for the whole scan so a refresh cannot swap
        // the snapshot mid-way.
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.nodes.contains(id))
    }

    /// Registers the node with the delegate, then refreshes.
    ///
    /// A delegate failure is returned as-is and leaves the cache untouched.
    #[instrument(skip(self))]
    async fn insert(&self, id: &str) -> Result<()> {
        self.delegate.insert(id).await?;
        self.refresh(true).await
    }

    /// Removes the node from the delegate, then refreshes.
    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        self.delegate.delete(id).await?;
        self.refresh(true).await
    }
}

impl<R> fmt::Debug for CachingRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingRegistry")
            .field("ttl", &self.ttl)
            .field("last_update_nanos", &self.last_update_nanos.load(Ordering::Relaxed))
            .field("fetches", &self.fetches.load(Ordering::Relaxed))
            .field("failed_fetches", &self.failed_fetches.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
