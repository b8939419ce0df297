//! Structured logging field name constants for ctxbridge.
//!
//! Every crate uses these names for `tracing` fields so log aggregation
//! can query the client and the MCP server the same way.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Fatal startup conditions (invalid configuration) |
//! | WARN  | Upstream failures, degraded search responses, slow calls |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Request dispatch, detected response shapes |
//! | TRACE | Raw protocol lines |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for a single outbound call. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "client", "mcp", "config"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "context_api", "normalizer", "stdio"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "insert_context", "search_context", "tools/call"
pub const OPERATION: &str = "op";

// ─── Request fields ────────────────────────────────────────────────────────

/// Endpoint URL a call was sent to.
pub const ENDPOINT: &str = "endpoint";

/// Search query text.
pub const QUERY: &str = "query";

/// Requested result count.
pub const K: &str = "k";

/// Byte length of inserted content.
pub const CONTENT_LEN: &str = "content_len";

/// MCP tool name.
pub const TOOL: &str = "tool";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Configured timeout in milliseconds.
pub const TIMEOUT_MS: &str = "timeout_ms";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// HTTP status code returned upstream.
pub const STATUS: &str = "status";

/// Detected search response shape.
pub const SHAPE: &str = "shape";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
