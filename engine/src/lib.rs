//! The MCP transport layer: JSON-RPC protocol types, tool dispatch onto
//! `procontext-core`, and the stdio/HTTP bindings.

pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod stdio;

#[cfg(feature = "http")]
pub mod http;

pub use dispatch::{call_tool, list_tools};
pub use server::{handle_notification, handle_request};
