//! Shared HTTP client construction.

use std::time::Duration;

/// User-Agent sent with every request; documented and stable so upstream
/// operators can identify the crawler.
pub const USER_AGENT: &str = concat!("procontext/", env!("CARGO_PKG_VERSION"));

/// Builds the shared client: connection pooling, a 30s total timeout, and
/// `follow_redirects=false` — the [`crate::Fetcher`] handles redirects itself
/// so every hop can be re-validated against the allowlist.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
}
