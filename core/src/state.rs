//! The immutable-except-for-allowlist container wired up at startup.

use procontext_cache::Cache;
use procontext_fetcher::{AllowlistHandle, Fetcher};
use procontext_types::{Config, RegistryIndexes};

/// Holds every shared reference a tool handler needs. Every field is set
/// once at startup; only [`AppState::allowlist`]'s published value may
/// change afterward, and only via
/// `procontext_fetcher::expand_allowlist_from_content`.
pub struct AppState {
    pub config: Config,
    pub registry_indexes: RegistryIndexes,
    pub registry_version: String,
    pub http_client: reqwest::Client,
    pub cache: Cache,
    pub fetcher: Fetcher,
    pub allowlist: AllowlistHandle,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Config,
        registry_indexes: RegistryIndexes,
        registry_version: String,
        http_client: reqwest::Client,
        cache: Cache,
        fetcher: Fetcher,
        allowlist: AllowlistHandle,
    ) -> Self {
        Self {
            config,
            registry_indexes,
            registry_version,
            http_client,
            cache,
            fetcher,
            allowlist,
        }
    }
}
