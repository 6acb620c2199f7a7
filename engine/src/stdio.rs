//! The stdio transport: one JSON-RPC message per line on stdin, one
//! response per line on stdout. Malformed input yields a JSON-RPC parse
//! error rather than killing the process.

use std::sync::Arc;

use procontext_core::AppState;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::protocol::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::server::{handle_notification, handle_request};

/// Runs the stdio loop until EOF on stdin. Each line is tried as a request
/// first, then a notification; anything else is a JSON-RPC parse error.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            tracing::info!(event = "stdio_eof");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(trimmed) {
            let response = handle_request(&state, request).await;
            write_line(&mut stdout, &response).await?;
            continue;
        }

        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(trimmed) {
            handle_notification(&notification);
            continue;
        }

        tracing::warn!(event = "stdio_parse_error", line = trimmed);
        let response = JsonRpcResponse::error(
            RequestId::Number(0),
            JsonRpcError::parse_error("invalid JSON-RPC message"),
        );
        write_line(&mut stdout, &response).await?;
    }
}

async fn write_line(
    stdout: &mut tokio::io::Stdout,
    response: &JsonRpcResponse,
) -> anyhow::Result<()> {
    let body = serde_json::to_string(response)?;
    stdout.write_all(body.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
