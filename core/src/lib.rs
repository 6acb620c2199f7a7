//! `AppState` wiring, markdown windowing, the maintenance task, and the
//! three MCP tool implementations that operate on shared state.

pub mod maintenance;
pub mod markdown;
pub mod startup;
pub mod state;
pub mod tools;

pub use startup::build_app_state;
pub use state::AppState;
