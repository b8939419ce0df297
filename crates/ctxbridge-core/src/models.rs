//! Request and response types exchanged with the context API.
//!
//! All types are request-scoped value objects. Field names serialize in
//! camelCase to match the remote API's JSON.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults;
use crate::error::{Error, Result};

/// JSON object with arbitrary keys.
pub type JsonObject = Map<String, Value>;

// =============================================================================
// INSERT
// =============================================================================

/// Caller-supplied metadata for an inserted context.
///
/// Unset fields are filled with defaults when the request body is built;
/// unknown keys are carried through verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsertMetadata {
    /// Context category (e.g. "user_data", "project_notes").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Tags for categorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// ISO-8601 timestamp. Defaults to the time of the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Name of the client that produced the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Additional fields forwarded as-is.
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Request to store a piece of context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsertContextRequest {
    /// The context content to store.
    #[schemars(length(min = 1))]
    pub content: String,
    /// Optional metadata for the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<InsertMetadata>,
}

impl InsertContextRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: InsertMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check the request against its input contract.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(Error::InvalidInput("Content cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Canonical insert response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertContextResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

// =============================================================================
// SEARCH
// =============================================================================

/// Caller-supplied search filters. Unknown keys are forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilters {
    /// Only return contexts carrying these tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Additional filter fields forwarded as-is.
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Request to search stored context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchContextRequest {
    /// The search query.
    #[schemars(length(min = 1))]
    pub query: String,
    /// Number of results to return (1-100, default 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1, max = 100))]
    pub k: Option<u32>,
    /// Optional filters for the search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
}

impl SearchContextRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: None,
            filters: None,
        }
    }

    pub fn with_k(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Requested result count, falling back to the default.
    pub fn effective_k(&self) -> u32 {
        self.k.unwrap_or(defaults::SEARCH_K)
    }

    /// Check the request against its input contract.
    pub fn validate(&self) -> Result<()> {
        if self.query.is_empty() {
            return Err(Error::InvalidInput("Query cannot be empty".to_string()));
        }
        if let Some(k) = self.k {
            if !(defaults::SEARCH_K_MIN..=defaults::SEARCH_K_MAX).contains(&k) {
                return Err(Error::InvalidInput(format!(
                    "k must be between {} and {}, got {}",
                    defaults::SEARCH_K_MIN,
                    defaults::SEARCH_K_MAX,
                    k
                )));
            }
        }
        Ok(())
    }
}

/// One search hit in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonObject>,
    /// Similarity in [0, 1]. Derived as `1 - distance` when upstream only
    /// reports a distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl ContextItem {
    /// Tags recorded in the item's metadata, if any.
    pub fn tags(&self) -> Vec<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("tags"))
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Canonical search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchContextResponse {
    pub success: bool,
    pub results: Vec<ContextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
