//! Transport-agnostic request/notification handling: `initialize`,
//! `notifications/initialized`, `ping`, `tools/list`, `tools/call`. Both the
//! stdio and HTTP transports call through [`handle_request`] and
//! [`handle_notification`].

use procontext_core::AppState;

use crate::dispatch::{call_tool, list_tools};
use crate::protocol::{
    methods, CallToolParams, Implementation, InitializeResult, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
};

/// Handles one JSON-RPC request and always produces a response — MCP has no
/// notion of "no reply" for a request with an id.
pub async fn handle_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let result = match request.method.as_str() {
        methods::INITIALIZE => Ok(serde_json::to_value(InitializeResult {
            protocol_version: crate::protocol::PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: Implementation::server(),
        })
        .expect("InitializeResult always serializes")),
        methods::PING => Ok(serde_json::json!({})),
        methods::TOOLS_LIST => Ok(serde_json::to_value(ListToolsResult {
            tools: list_tools(),
        })
        .expect("ListToolsResult always serializes")),
        methods::TOOLS_CALL => handle_tools_call(state, request.params).await,
        other => Err(JsonRpcError::method_not_found(other)),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(request.id, value),
        Err(error) => JsonRpcResponse::error(request.id, error),
    }
}

async fn handle_tools_call(
    state: &AppState,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    let call: CallToolParams = serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {e}")))?;

    let result = call_tool(state, &call.name, call.arguments.unwrap_or(serde_json::json!({}))).await;
    Ok(serde_json::to_value(result).expect("CallToolResult always serializes"))
}

/// Handles a notification (no response is ever sent). Unknown notifications
/// are logged and otherwise ignored.
pub fn handle_notification(notification: &JsonRpcNotification) {
    match notification.method.as_str() {
        methods::INITIALIZED => {
            tracing::debug!(event = "mcp_initialized");
        }
        other => {
            tracing::warn!(event = "mcp_unknown_notification", method = other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use procontext_cache::Cache;
    use procontext_fetcher::{build_allowlist, build_http_client, AllowlistHandle, Fetcher};
    use procontext_types::{Config, RegistryIndexes};

    fn empty_state() -> AppState {
        let (registry_indexes, _) = RegistryIndexes::build(&[]);
        let client = build_http_client().unwrap();
        AppState::new(
            Config::default(),
            registry_indexes,
            "test".to_string(),
            client.clone(),
            Cache::open_in_memory().unwrap(),
            Fetcher::new(client, true),
            AllowlistHandle::new(build_allowlist(&[], &[])),
        )
    }

    #[tokio::test]
    async fn initialize_returns_server_info() {
        let state = empty_state();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "initialize".to_string(),
            params: None,
        };
        let response = handle_request(&state, request).await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "procontext");
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let state = empty_state();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "bogus/method".to_string(),
            params: None,
        };
        let response = handle_request(&state, request).await;
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn tools_list_returns_three_tools() {
        let state = empty_state();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "tools/list".to_string(),
            params: None,
        };
        let response = handle_request(&state, request).await;
        let result = response.result.unwrap();
        assert_eq!(result["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid_params() {
        let state = empty_state();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "tools/call".to_string(),
            params: None,
        };
        let response = handle_request(&state, request).await;
        assert!(response.error.is_some());
    }
}
