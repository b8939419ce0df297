//! # ctxbridge-mcp
//!
//! MCP server that exposes `insert_context` and `search_context` as tools to
//! an AI-assistant host over newline-delimited JSON-RPC on stdin/stdout.
//! Tool calls are forwarded to a [`ctxbridge_core::ContextApi`].

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{ContextTools, ToolContent, ToolDefinition, ToolResult};
