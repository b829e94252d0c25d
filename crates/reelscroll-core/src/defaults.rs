//! Centralized default constants for reelscroll.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// TRANSPORT
// =============================================================================

/// Default catalog server URL.
pub const SERVER_URL: &str = "http://localhost:9999";

/// Path of the GraphQL endpoint relative to the server URL.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Header carrying the API key on raw HTTP calls.
pub const API_KEY_HEADER: &str = "ApiKey";

/// Timeout for a single GraphQL request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// RESULT CACHE
// =============================================================================

/// Time-to-live of a cached query result, measured from write time (seconds).
pub const CACHE_TTL_SECS: u64 = 300;

/// Interval between periodic cache sweeps (seconds).
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 300;

/// Shortest interval the sweeper accepts; shorter values are raised to it.
pub const MIN_SWEEP_INTERVAL_MS: u64 = 1000;

/// Maximum number of entries the result cache keeps after a sweep.
pub const CACHE_MAX_ENTRIES: usize = 100;

/// Length of the hex digest used in request signatures.
pub const SIGNATURE_HASH_LEN: usize = 16;

// =============================================================================
// EXISTENCE PROBING
// =============================================================================

/// Maximum members of a membership cache before compaction.
pub const MEMBERSHIP_CACHE_MAX: usize = 1000;

/// IDs probed per batch.
pub const EXISTENCE_BATCH_SIZE: usize = 5;

/// Batches allowed in flight at once.
pub const EXISTENCE_MAX_CONCURRENT_BATCHES: usize = 3;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default feed page size.
pub const PAGE_SIZE: u32 = 20;

/// Default result limit for tag/performer autocomplete.
pub const AUTOCOMPLETE_LIMIT: u32 = 20;

/// Prefix of the sort token that asks the server for a seeded random order.
pub const RANDOM_SORT_PREFIX: &str = "random_";

// =============================================================================
// SHUFFLE
// =============================================================================

/// Scenes with this many in-page markers or more are dropped from shuffle.
pub const SHUFFLE_MAX_MARKERS_PER_SCENE: usize = 5;

/// ID prefix that marks a marker as synthetic ("whole scene").
pub const SYNTHETIC_MARKER_PREFIX: &str = "synthetic-";

// =============================================================================
// RATING
// =============================================================================

/// Upper bound of the external rating scale.
pub const RATING_SCALE_MAX: f64 = 10.0;

/// Upper bound of the wire rating scale (`rating100`).
pub const RATING100_MAX: i32 = 100;
