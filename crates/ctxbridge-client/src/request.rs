//! Request body construction.
//!
//! Defaults are laid down first and the caller's fields are merged over them
//! one level deep: an explicit field always replaces the default wholesale.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use ctxbridge_core::defaults;
use ctxbridge_core::models::{InsertContextRequest, JsonObject, SearchContextRequest};

/// Build the JSON body for an insert call, stamping `now` as the default timestamp.
pub fn insert_body(request: &InsertContextRequest, now: DateTime<Utc>) -> Value {
    let mut metadata = JsonObject::new();
    metadata.insert("context".into(), json!(defaults::METADATA_CONTEXT));
    metadata.insert("tags".into(), json!([]));
    metadata.insert(
        "timestamp".into(),
        json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    metadata.insert("client".into(), json!(defaults::METADATA_CLIENT));

    if let Some(ref supplied) = request.metadata {
        overlay(&mut metadata, serde_json::to_value(supplied));
    }

    json!({
        "content": request.content,
        "metadata": metadata,
    })
}

/// Build the JSON body for a search call.
pub fn search_body(request: &SearchContextRequest) -> Value {
    let mut filters = JsonObject::new();
    filters.insert("tags".into(), json!([]));

    if let Some(ref supplied) = request.filters {
        overlay(&mut filters, serde_json::to_value(supplied));
    }

    json!({
        "query": request.query,
        "k": request.effective_k(),
        "filters": filters,
    })
}

fn overlay(target: &mut JsonObject, supplied: serde_json::Result<Value>) {
    // Serializing a derive(Serialize) struct of strings and JSON values cannot fail.
    if let Ok(Value::Object(fields)) = supplied {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
}
