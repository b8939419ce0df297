//! MCP tool definitions and execution for context insert/search.

use std::fmt::Write as _;
use std::sync::Arc;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use ctxbridge_core::models::{
    InsertContextRequest, InsertContextResponse, SearchContextRequest, SearchContextResponse,
};
use ctxbridge_core::{ContextApi, Error, Operation, Result};

/// Tool advertised through `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Result of a `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Concatenated text of all content blocks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Context tools backed by a [`ContextApi`].
#[derive(Clone)]
pub struct ContextTools {
    api: Arc<dyn ContextApi>,
}

impl ContextTools {
    pub fn new(api: Arc<dyn ContextApi>) -> Self {
        Self { api }
    }

    /// All tools, in listing order.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![Self::insert_context_tool(), Self::search_context_tool()]
    }

    pub fn insert_context_tool() -> ToolDefinition {
        ToolDefinition {
            name: Operation::Insert.name().to_string(),
            description: "Insert context data into the context store. Use this to store \
                          important information, notes, or data that should be remembered \
                          for future reference."
                .to_string(),
            input_schema: input_schema::<InsertContextRequest>(),
        }
    }

    pub fn search_context_tool() -> ToolDefinition {
        ToolDefinition {
            name: Operation::Search.name().to_string(),
            description: "Search for relevant context data using semantic search. Use this \
                          to find previously stored information that might be relevant to \
                          the current conversation."
                .to_string(),
            input_schema: input_schema::<SearchContextRequest>(),
        }
    }

    /// Dispatch a tool by name. Returns `None` for unknown tools.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<ToolResult> {
        if name == Operation::Insert.name() {
            Some(self.execute_insert_context(arguments).await)
        } else if name == Operation::Search.name() {
            Some(self.execute_search_context(arguments).await)
        } else {
            None
        }
    }

    #[instrument(skip(self, arguments), fields(subsystem = "mcp", component = "tools", tool = "insert_context"))]
    pub async fn execute_insert_context(&self, arguments: Value) -> ToolResult {
        let outcome = async {
            let request: InsertContextRequest = parse_arguments(arguments)?;
            request.validate()?;
            self.api.insert_context(&request).await
        }
        .await;

        match outcome {
            Ok(response) => {
                info!(success = response.success, "insert_context executed");
                render_insert(&response)
            }
            Err(e) => {
                warn!(error = %e, "insert_context failed");
                ToolResult::error(e.to_string())
            }
        }
    }

    #[instrument(skip(self, arguments), fields(subsystem = "mcp", component = "tools", tool = "search_context"))]
    pub async fn execute_search_context(&self, arguments: Value) -> ToolResult {
        let outcome = async {
            let request: SearchContextRequest = parse_arguments(arguments)?;
            request.validate()?;
            let response = self.api.search_context(&request).await?;
            Ok::<_, Error>((request, response))
        }
        .await;

        match outcome {
            Ok((request, response)) => {
                info!(
                    success = response.success,
                    result_count = response.results.len(),
                    "search_context executed"
                );
                render_search(&request.query, &response)
            }
            Err(e) => {
                warn!(error = %e, "search_context failed");
                ToolResult::error(e.to_string())
            }
        }
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// JSON Schema for a tool's arguments, with nested types inlined.
fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let mut schema = serde_json::to_value(generator.into_root_schema_for::<T>())
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));

    if let Some(obj) = schema.as_object_mut() {
        obj.remove("title");
        obj.remove("definitions");
    }
    schema
}

fn render_insert(response: &InsertContextResponse) -> ToolResult {
    if !response.success {
        return ToolResult::error(format!("Failed to insert context: {}", response.message));
    }
    match response.id {
        Some(ref id) => ToolResult::text(format!(
            "Successfully inserted context (ID: {}): {}",
            id, response.message
        )),
        None => ToolResult::text(format!(
            "Successfully inserted context: {}",
            response.message
        )),
    }
}

fn render_search(query: &str, response: &SearchContextResponse) -> ToolResult {
    if response.results.is_empty() {
        let mut text = format!("No results found for \"{}\"", query);
        if !response.success {
            if let Some(ref message) = response.message {
                let _ = write!(text, ": {}", message);
            }
        }
        return ToolResult::text(text);
    }

    let count = response.results.len();
    let mut text = format!(
        "Found {} result{} for \"{}\"",
        count,
        if count == 1 { "" } else { "s" },
        query
    );
    if let Some(total) = response.total.filter(|t| *t as usize > count) {
        let _ = write!(text, " ({} total)", total);
    }
    text.push_str(":\n");

    for (i, item) in response.results.iter().enumerate() {
        text.push('\n');
        match item.relevance_score {
            Some(score) => {
                let _ = write!(text, "{}. [relevance: {:.3}] {}", i + 1, score, item.content);
            }
            None => {
                let _ = write!(text, "{}. {}", i + 1, item.content);
            }
        }
        let tags = item.tags();
        if !tags.is_empty() {
            let _ = write!(text, "\n   Tags: {}", tags.join(", "));
        }
        if let Some(ref id) = item.id {
            let _ = write!(text, "\n   ID: {}", id);
        }
        text.push('\n');
    }

    ToolResult::text(text.trim_end().to_string())
}
