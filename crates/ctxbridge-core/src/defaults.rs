//! Centralized default constants for ctxbridge.
//!
//! Both the client and the MCP server reference these constants instead of
//! defining their own literals.

// =============================================================================
// TRANSPORT
// =============================================================================

/// Default request timeout in milliseconds.
pub const API_TIMEOUT_MS: u64 = 30_000;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "MCP-Context-Server/1.0.0";

/// Path appended to `BASE_API_URL` when no insert endpoint is configured.
pub const INSERT_PATH: &str = "/insert";

/// Path appended to `BASE_API_URL` when no search endpoint is configured.
pub const SEARCH_PATH: &str = "/search";

/// Calls slower than this are logged with `slow = true`.
pub const SLOW_CALL_MS: u64 = 5_000;

// =============================================================================
// INSERT
// =============================================================================

/// Metadata `context` value when the caller supplies none.
pub const METADATA_CONTEXT: &str = "user_data";

/// Metadata `client` value when the caller supplies none.
pub const METADATA_CLIENT: &str = "mcp-server";

/// Placeholder id when a 2xx insert body carries no id.
pub const UNKNOWN_ID: &str = "unknown";

/// Message synthesized for insert bodies without one.
pub const INSERT_MESSAGE: &str = "Context inserted successfully";

// =============================================================================
// SEARCH
// =============================================================================

/// Number of results requested when `k` is omitted.
pub const SEARCH_K: u32 = 5;

/// Smallest accepted `k`.
pub const SEARCH_K_MIN: u32 = 1;

/// Largest accepted `k`.
pub const SEARCH_K_MAX: u32 = 100;

/// Message synthesized for recognized search bodies without one.
pub const SEARCH_MESSAGE: &str = "Search completed successfully";

/// Message returned when the search body matches no known shape.
pub const SEARCH_UNEXPECTED_FORMAT: &str = "Unexpected response format from search endpoint";

// =============================================================================
// MCP
// =============================================================================

/// Server name reported during `initialize`.
pub const SERVER_NAME: &str = "context-server";

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
