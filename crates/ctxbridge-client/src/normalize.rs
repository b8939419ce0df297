//! Response normalization.
//!
//! Search upstreams answer in one of several shapes. [`SearchShape::classify`]
//! resolves a body to exactly one shape by checking, in order:
//!
//! 1. bare array of rows
//! 2. canonical object (`success` and `results`)
//! 3. `data` envelope
//! 4. `results` envelope without `success`
//! 5. anything else
//!
//! Every shape converts into a [`SearchContextResponse`]; shape 5 becomes an
//! empty `success: false` result instead of an error.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use ctxbridge_core::defaults;
use ctxbridge_core::models::{ContextItem, InsertContextResponse, JsonObject, SearchContextResponse};

/// Discriminant of [`SearchShape`], used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    BareArray,
    Canonical,
    DataEnvelope,
    ResultsEnvelope,
    Unrecognized,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BareArray => write!(f, "bare_array"),
            Self::Canonical => write!(f, "canonical"),
            Self::DataEnvelope => write!(f, "data_envelope"),
            Self::ResultsEnvelope => write!(f, "results_envelope"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// A search response body resolved to one known shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchShape<'a> {
    /// `[row, ...]`
    BareArray(&'a [Value]),
    /// `{ "success": bool, "results": [...], ... }`
    Canonical {
        success: bool,
        results: &'a [Value],
        body: &'a JsonObject,
    },
    /// `{ "data": [...], ... }`
    DataEnvelope {
        data: &'a [Value],
        body: &'a JsonObject,
    },
    /// `{ "results": [...], ... }` with no boolean `success`
    ResultsEnvelope {
        results: &'a [Value],
        body: &'a JsonObject,
    },
    Unrecognized,
}

impl<'a> SearchShape<'a> {
    /// Resolve `body` to its shape. Predicates are checked in fixed priority order.
    pub fn classify(body: &'a Value) -> Self {
        let obj = match body {
            Value::Array(rows) => return Self::BareArray(rows),
            Value::Object(obj) => obj,
            _ => return Self::Unrecognized,
        };

        let results = obj.get("results").and_then(Value::as_array);

        if let (Some(success), Some(results)) =
            (obj.get("success").and_then(Value::as_bool), results)
        {
            return Self::Canonical {
                success,
                results,
                body: obj,
            };
        }

        if let Some(data) = obj.get("data").and_then(Value::as_array) {
            return Self::DataEnvelope { data, body: obj };
        }

        if let Some(results) = results {
            return Self::ResultsEnvelope { results, body: obj };
        }

        Self::Unrecognized
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::BareArray(_) => ShapeKind::BareArray,
            Self::Canonical { .. } => ShapeKind::Canonical,
            Self::DataEnvelope { .. } => ShapeKind::DataEnvelope,
            Self::ResultsEnvelope { .. } => ShapeKind::ResultsEnvelope,
            Self::Unrecognized => ShapeKind::Unrecognized,
        }
    }

    /// Convert into the canonical response.
    pub fn into_response(self) -> SearchContextResponse {
        match self {
            Self::BareArray(rows) => SearchContextResponse {
                success: true,
                results: rows.iter().map(map_row).collect(),
                total: Some(rows.len() as u64),
                message: Some(defaults::SEARCH_MESSAGE.to_string()),
            },
            Self::Canonical {
                success,
                results,
                body,
            } => SearchContextResponse {
                success,
                results: results.iter().map(read_canonical_row).collect(),
                total: body.get("total").and_then(Value::as_u64),
                message: body.get("message").and_then(Value::as_str).map(String::from),
            },
            Self::DataEnvelope { data, body } => SearchContextResponse {
                success: body.get("success").and_then(Value::as_bool).unwrap_or(true),
                results: data.iter().map(map_row).collect(),
                total: Some(data.len() as u64),
                message: Some(message_or_default(body)),
            },
            Self::ResultsEnvelope { results, body } => SearchContextResponse {
                success: !matches!(body.get("success"), Some(Value::Bool(false))),
                results: results.iter().map(map_row).collect(),
                total: Some(
                    body.get("total")
                        .and_then(Value::as_u64)
                        .unwrap_or(results.len() as u64),
                ),
                message: Some(message_or_default(body)),
            },
            Self::Unrecognized => SearchContextResponse {
                success: false,
                results: Vec::new(),
                total: Some(0),
                message: Some(defaults::SEARCH_UNEXPECTED_FORMAT.to_string()),
            },
        }
    }
}

/// Normalize a 2xx search body. Never fails.
pub fn normalize_search(body: &Value) -> SearchContextResponse {
    let shape = SearchShape::classify(body);
    let kind = shape.kind();

    if kind == ShapeKind::Unrecognized {
        warn!(
            subsystem = "client",
            component = "normalizer",
            shape = %kind,
            body_type = json_type(body),
            "Unexpected response format from search endpoint"
        );
    } else {
        debug!(subsystem = "client", component = "normalizer", shape = %kind, "Search response shape detected");
    }

    shape.into_response()
}

/// Map a raw upstream row into a [`ContextItem`].
///
/// `id` is stringified, missing `content` becomes empty, and
/// `relevanceScore` is derived as `1 - distance` unless given explicitly.
/// `distance` is kept verbatim.
pub fn map_row(row: &Value) -> ContextItem {
    let mut item = read_canonical_row(row);
    if item.relevance_score.is_none() {
        item.relevance_score = item.distance.map(|d| 1.0 - d);
    }
    item
}

/// Read a row without deriving any field.
fn read_canonical_row(row: &Value) -> ContextItem {
    let obj = match row {
        Value::Object(obj) => obj,
        // A scalar row carries only content.
        Value::String(s) => {
            return ContextItem {
                content: s.clone(),
                ..Default::default()
            }
        }
        Value::Null => return ContextItem::default(),
        other => {
            return ContextItem {
                content: other.to_string(),
                ..Default::default()
            }
        }
    };

    ContextItem {
        id: obj.get("id").and_then(stringify),
        content: obj.get("content").and_then(stringify).unwrap_or_default(),
        metadata: obj.get("metadata").and_then(Value::as_object).cloned(),
        relevance_score: obj.get("relevanceScore").and_then(Value::as_f64),
        distance: obj.get("distance").and_then(Value::as_f64),
    }
}

/// Normalize a 2xx insert body.
///
/// A body carrying `success` is taken as canonical. Anything else is treated
/// as an optimistic success with `id`/`message` extracted where present.
pub fn normalize_insert(body: &Value) -> InsertContextResponse {
    let obj = body.as_object();

    match obj {
        Some(obj) if obj.contains_key("success") => {
            let success = obj.get("success").and_then(Value::as_bool).unwrap_or(false);
            InsertContextResponse {
                success,
                id: obj.get("id").and_then(stringify),
                message: obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| {
                        if success {
                            defaults::INSERT_MESSAGE.to_string()
                        } else {
                            "Insert context reported failure".to_string()
                        }
                    }),
            }
        }
        _ => {
            debug!(
                subsystem = "client",
                component = "normalizer",
                body_type = json_type(body),
                "Insert response has no success field, assuming success"
            );
            InsertContextResponse {
                success: true,
                id: Some(
                    obj.and_then(|o| o.get("id"))
                        .and_then(stringify)
                        .unwrap_or_else(|| defaults::UNKNOWN_ID.to_string()),
                ),
                message: obj
                    .map(message_or_insert_default)
                    .unwrap_or_else(|| defaults::INSERT_MESSAGE.to_string()),
            }
        }
    }
}

fn message_or_default(body: &JsonObject) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or(defaults::SEARCH_MESSAGE)
        .to_string()
}

fn message_or_insert_default(body: &JsonObject) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or(defaults::INSERT_MESSAGE)
        .to_string()
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    // ─── Shape classification ──────────────────────────────────────────────

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(SearchShape::classify(&json!([])).kind(), ShapeKind::BareArray);
        assert_eq!(
            SearchShape::classify(&json!({"success": true, "results": [], "data": [1]})).kind(),
            ShapeKind::Canonical
        );
        assert_eq!(
            SearchShape::classify(&json!({"data": [], "results": []})).kind(),
            ShapeKind::DataEnvelope
        );
        assert_eq!(
            SearchShape::classify(&json!({"results": []})).kind(),
            ShapeKind::ResultsEnvelope
        );
        assert_eq!(
            SearchShape::classify(&json!({"foo": "bar"})).kind(),
            ShapeKind::Unrecognized
        );
    }

    #[test]
    fn test_classify_non_object_bodies() {
        for body in [json!(null), json!("text"), json!(42), json!(true)] {
            assert_eq!(SearchShape::classify(&body).kind(), ShapeKind::Unrecognized);
        }
    }

    #[test]
    fn test_classify_results_not_array_is_unrecognized() {
        let body = json!({"success": true, "results": "none"});
        assert_eq!(SearchShape::classify(&body).kind(), ShapeKind::Unrecognized);
    }

    #[test]
    fn test_classify_non_bool_success_uses_results_envelope() {
        let body = json!({"success": "yes", "results": []});
        assert_eq!(SearchShape::classify(&body).kind(), ShapeKind::ResultsEnvelope);
    }

    // ─── Shape conversion ──────────────────────────────────────────────────

    #[test]
    fn test_bare_array_rows() {
        let body = json!([
            {"id": 1, "content": "first", "distance": 0.2},
            {"id": "b", "content": "second", "distance": 0.5}
        ]);

        let resp = normalize_search(&body);
        assert!(resp.success);
        assert_eq!(resp.total, Some(2));
        assert_eq!(resp.message.as_deref(), Some("Search completed successfully"));
        assert_eq!(resp.results[0].id.as_deref(), Some("1"));
        assert!(approx(resp.results[0].relevance_score, 0.8));
        assert!(approx(resp.results[0].distance, 0.2));
        assert!(approx(resp.results[1].relevance_score, 0.5));
    }

    #[test]
    fn test_canonical_passes_through() {
        let body = json!({
            "success": true,
            "results": [{"id": "a", "content": "hello", "relevanceScore": 0.9, "distance": 0.4}],
            "total": 17,
            "message": "ok"
        });

        let resp = normalize_search(&body);
        assert!(resp.success);
        assert_eq!(resp.total, Some(17));
        assert_eq!(resp.message.as_deref(), Some("ok"));
        assert!(approx(resp.results[0].relevance_score, 0.9));
        assert!(approx(resp.results[0].distance, 0.4));
    }

    #[test]
    fn test_canonical_keeps_absent_fields_absent() {
        let body = json!({"success": true, "results": [{"content": "c", "distance": 0.1}]});
        let resp = normalize_search(&body);
        assert_eq!(resp.total, None);
        assert_eq!(resp.message, None);
        assert_eq!(resp.results[0].relevance_score, None);
    }

    #[test]
    fn test_canonical_explicit_false_preserved() {
        let body = json!({"success": false, "results": [{"content": "stale"}]});
        let resp = normalize_search(&body);
        assert!(!resp.success);
        assert_eq!(resp.results.len(), 1);
    }

    #[test]
    fn test_data_envelope() {
        let body = json!({
            "data": [{"id": 7, "content": "x", "distance": 0.25}],
            "total": 99
        });

        let resp = normalize_search(&body);
        assert!(resp.success);
        assert_eq!(resp.total, Some(1));
        assert_eq!(resp.message.as_deref(), Some("Search completed successfully"));
        assert_eq!(resp.results[0].id.as_deref(), Some("7"));
        assert!(approx(resp.results[0].relevance_score, 0.75));
    }

    #[test]
    fn test_data_envelope_keeps_message_and_explicit_false() {
        let body = json!({"success": false, "data": [], "message": "index rebuilding"});
        let resp = normalize_search(&body);
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("index rebuilding"));
        assert_eq!(resp.total, Some(0));
    }

    #[test]
    fn test_results_envelope_defaults() {
        let body = json!({"results": [{"content": "a"}, {"content": "b"}]});
        let resp = normalize_search(&body);
        assert!(resp.success);
        assert_eq!(resp.total, Some(2));
        assert_eq!(resp.message.as_deref(), Some("Search completed successfully"));
    }

    #[test]
    fn test_results_envelope_total_from_body() {
        let body = json!({"results": [{"content": "a"}], "total": 40, "message": "page 1"});
        let resp = normalize_search(&body);
        assert_eq!(resp.total, Some(40));
        assert_eq!(resp.message.as_deref(), Some("page 1"));
    }

    #[test]
    fn test_unrecognized_degrades_to_empty_failure() {
        let resp = normalize_search(&json!({"foo": "bar"}));
        assert!(!resp.success);
        assert!(resp.results.is_empty());
        assert_eq!(resp.total, Some(0));
        assert_eq!(
            resp.message.as_deref(),
            Some("Unexpected response format from search endpoint")
        );
    }

    // ─── Row mapping ───────────────────────────────────────────────────────

    #[test]
    fn test_map_row_explicit_score_not_overwritten() {
        let item = map_row(&json!({"content": "x", "relevanceScore": 0.3, "distance": 0.1}));
        assert!(approx(item.relevance_score, 0.3));
        assert!(approx(item.distance, 0.1));
    }

    #[test]
    fn test_map_row_missing_content_is_empty() {
        let item = map_row(&json!({"id": "z"}));
        assert_eq!(item.content, "");
        assert_eq!(item.relevance_score, None);
        assert_eq!(item.distance, None);
    }

    #[test]
    fn test_map_row_keeps_metadata() {
        let item = map_row(&json!({
            "content": "x",
            "metadata": {"tags": ["a"], "context": "user_data"}
        }));
        assert_eq!(item.tags(), vec!["a"]);
        assert_eq!(
            item.metadata.unwrap().get("context"),
            Some(&json!("user_data"))
        );
    }

    #[test]
    fn test_map_row_null_id_is_absent() {
        let item = map_row(&json!({"id": null, "content": "x"}));
        assert_eq!(item.id, None);
    }

    #[test]
    fn test_map_row_scalar_rows() {
        assert_eq!(map_row(&json!("plain")).content, "plain");
        assert_eq!(map_row(&json!(12)).content, "12");
        assert_eq!(map_row(&json!(null)), ContextItem::default());
    }

    // ─── Insert ────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_canonical() {
        let resp = normalize_insert(&json!({"success": true, "id": "abc", "message": "stored"}));
        assert_eq!(
            resp,
            InsertContextResponse {
                success: true,
                id: Some("abc".to_string()),
                message: "stored".to_string(),
            }
        );
    }

    #[test]
    fn test_insert_canonical_false() {
        let resp = normalize_insert(&json!({"success": false, "message": "duplicate"}));
        assert!(!resp.success);
        assert_eq!(resp.id, None);
        assert_eq!(resp.message, "duplicate");
    }

    #[test]
    fn test_insert_synthesized_from_partial_body() {
        let resp = normalize_insert(&json!({"id": 42}));
        assert!(resp.success);
        assert_eq!(resp.id.as_deref(), Some("42"));
        assert_eq!(resp.message, "Context inserted successfully");
    }

    #[test]
    fn test_insert_synthesized_from_unrelated_body() {
        for body in [json!({"foo": 1}), json!([1, 2]), json!("ok"), json!(null)] {
            let resp = normalize_insert(&body);
            assert!(resp.success);
            assert_eq!(resp.id.as_deref(), Some("unknown"));
        }
    }
}
