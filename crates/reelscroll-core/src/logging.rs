//! Structured logging field name constants for reelscroll.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Read-path failure absorbed into an empty result |
//! | WARN  | Recoverable issue, automatic fallback applied (malformed filter, empty page retry) |
//! | INFO  | Lifecycle events (client create/dispose, backend selection) |
//! | DEBUG | Cache hits/misses, dedup joins, page decisions, cancellations |
//! | TRACE | Per-ID probe results |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "transport", "engine"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "result_cache", "dedup", "existence", "pager", "http"
pub const COMPONENT: &str = "component";

/// GraphQL operation name.
pub const OPERATION: &str = "op";

/// Request signature used for caching and deduplication.
pub const SIGNATURE: &str = "signature";

/// Transport backend name ("http", "injected", "mock").
pub const BACKEND: &str = "backend";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Scene ID being operated on.
pub const SCENE_ID: &str = "scene_id";

/// Marker ID being operated on.
pub const MARKER_ID: &str = "marker_id";

/// Tag ID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Free-text search term.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned.
pub const RESULT_COUNT: &str = "result_count";

/// Server-reported total count.
pub const TOTAL_COUNT: &str = "total_count";

/// Page number requested.
pub const PAGE: &str = "page";

/// Number of IDs sent to a probe.
pub const ID_COUNT: &str = "id_count";

/// Number of cache entries removed by a sweep.
pub const EVICTED: &str = "evicted";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
