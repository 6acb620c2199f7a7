//! Tool registration and `tools/call` dispatch onto the three core tool
//! handlers. Catches any [`procontext_types::ProContextError`] and formats
//! it as the JSON error envelope; never leaks raw stack traces.

use procontext_core::tools::{get_library_docs, read_page, resolve_library};
use procontext_core::AppState;
use procontext_types::{
    GetLibraryDocsInput, ProContextError, ReadPageInput, ResolveLibraryInput,
};
use serde_json::Value;

use crate::protocol::{CallToolResult, Tool};

/// The fixed tool catalogue `tools/list` returns.
#[must_use]
pub fn list_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "resolve_library".to_string(),
            description: "Resolve a free-text library name to a canonical library id.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "minLength": 1, "maxLength": 500}
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_library_docs".to_string(),
            description: "Fetch (or serve from cache) a library's llms.txt documentation root."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "library_id": {"type": "string", "pattern": "^[a-z0-9][a-z0-9_-]*$"}
                },
                "required": ["library_id"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "read_page".to_string(),
            description: "Read a windowed line range of a cached-or-fetched documentation page."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "maxLength": 2048},
                    "offset": {"type": "integer", "minimum": 1, "default": 1},
                    "limit": {"type": "integer", "minimum": 1, "default": 2000}
                },
                "required": ["url"],
                "additionalProperties": false
            }),
        },
    ]
}

/// Dispatches a `tools/call` by name, returning the envelope the transport
/// serializes verbatim. Unknown tool names and malformed arguments are
/// `INVALID_INPUT` rather than a JSON-RPC-level error, matching the MCP
/// convention of surfacing tool failures inside the result envelope.
pub async fn call_tool(state: &AppState, name: &str, arguments: Value) -> CallToolResult {
    match name {
        "resolve_library" => match parse_args::<ResolveLibraryInput>(arguments) {
            Ok(input) => to_result(resolve_library(state, input)),
            Err(error) => CallToolResult::failure(&error),
        },
        "get_library_docs" => match parse_args::<GetLibraryDocsInput>(arguments) {
            Ok(input) => to_result(get_library_docs(state, input).await),
            Err(error) => CallToolResult::failure(&error),
        },
        "read_page" => match parse_args::<ReadPageInput>(arguments) {
            Ok(input) => to_result(read_page(state, input).await),
            Err(error) => CallToolResult::failure(&error),
        },
        other => CallToolResult::failure(&ProContextError::invalid_input(format!(
            "unknown tool: {other}"
        ))),
    }
}

fn parse_args<I: serde::de::DeserializeOwned>(arguments: Value) -> Result<I, ProContextError> {
    serde_json::from_value(arguments)
        .map_err(|e| ProContextError::invalid_input(format!("malformed arguments: {e}")))
}

fn to_result<O: serde::Serialize>(outcome: Result<O, ProContextError>) -> CallToolResult {
    match outcome {
        Ok(output) => CallToolResult::ok(&output),
        Err(error) => CallToolResult::failure(&error),
    }
}
