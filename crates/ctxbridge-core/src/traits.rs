//! Trait definitions for the context API.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    InsertContextRequest, InsertContextResponse, SearchContextRequest, SearchContextResponse,
};

/// Remote context store reachable through insert and search calls.
///
/// Implementations issue exactly one outbound request per call and never
/// retry. Failures are reported as [`crate::Error::Timeout`],
/// [`crate::Error::Http`] or [`crate::Error::Unknown`].
#[async_trait]
pub trait ContextApi: Send + Sync {
    /// Store a piece of context.
    async fn insert_context(&self, request: &InsertContextRequest)
        -> Result<InsertContextResponse>;

    /// Search stored context.
    ///
    /// Unrecognized response shapes are not errors; they resolve to an
    /// empty result with `success: false`.
    async fn search_context(&self, request: &SearchContextRequest)
        -> Result<SearchContextResponse>;
}
