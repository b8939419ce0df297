//! # ctxbridge-client
//!
//! HTTP client for a remote context store exposing insert and search
//! endpoints.
//!
//! This crate provides:
//! - [`ContextApiClient`], the [`ContextApi`] implementation over `reqwest`
//! - Request body construction with metadata/filter defaults
//! - Normalization of the several search response shapes upstreams return
//!
//! # Example
//!
//! ```rust,no_run
//! use ctxbridge_client::{ContextApi, ContextApiClient, ContextConfig, SearchContextRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ContextConfig::from_env().unwrap();
//!     let client = ContextApiClient::new(config).unwrap();
//!     let hits = client
//!         .search_context(&SearchContextRequest::new("deployment notes"))
//!         .await
//!         .unwrap();
//!     println!("{} results", hits.results.len());
//! }
//! ```

pub mod client;
pub mod normalize;
pub mod request;

// Re-export core types
pub use ctxbridge_core::*;

pub use client::ContextApiClient;
pub use normalize::{map_row, normalize_insert, normalize_search, SearchShape, ShapeKind};
pub use request::{insert_body, search_body};
