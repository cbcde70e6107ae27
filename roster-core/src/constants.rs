//! Shared constants for roster registries.

// ═══════════════════════════════════════════════════════════════════════════════
// NODE IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length of a node identifier in bytes.
/// Node names are usually DNS names, which cap at 253 characters.
pub const MAX_NODE_ID_LEN: usize = 253;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default snapshot time-to-live in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Longest accepted snapshot time-to-live (one day).
pub const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Environment variable overriding the snapshot TTL.
pub const ENV_CACHE_TTL_SECS: &str = "ROSTER_CACHE_TTL_SECS";
