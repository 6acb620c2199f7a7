//! SSRF-safe HTTP fetching: domain classification, the allowlist, and the
//! manual-redirect [`Fetcher`] itself.

pub mod allowlist;
pub mod client;
pub mod domain;
pub mod fetch;

pub use allowlist::{
    build_allowlist, expand_allowlist_from_content, extract_base_domains_from_content, Allowlist,
    AllowlistHandle,
};
pub use client::build_http_client;
pub use domain::{base_domain, is_private_ip, is_url_allowed};
pub use fetch::Fetcher;
