//! # ctxbridge-core
//!
//! Core types, traits, and configuration for the ctxbridge context API bridge.
//!
//! This crate provides the request/response data model shared by the HTTP
//! client and the MCP tool server, the error taxonomy every operation
//! reports through, and the environment-driven configuration loader.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{ConfigError, ConfigIssue, ContextConfig};
pub use error::{Error, ErrorKind, Operation, Result};
pub use models::*;
pub use traits::ContextApi;
