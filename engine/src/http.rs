//! The HTTP transport: a single POST endpoint accepting one JSON-RPC
//! request body per call and returning one JSON-RPC response body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use procontext_core::AppState;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::server::handle_request;

/// Binds `addr` and serves `POST /` until the listener is dropped or the
/// process is signalled.
pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/", post(handle_json_rpc))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(event = "http_transport_listening", %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_json_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    Json(handle_request(&state, request).await)
}
