//! Assembles an [`AppState`] from a loaded [`procontext_types::Config`].

use procontext_cache::Cache;
use procontext_fetcher::{build_allowlist, build_http_client, Allowlist, AllowlistHandle, Fetcher};
use procontext_registry::load_registry;
use procontext_types::{ProContextError, RegistryIndexes};

use crate::state::AppState;

/// Loads the registry, opens the cache, rehydrates the allowlist with
/// previously discovered domains, and wires up [`AppState`]. Any failure
/// here is a startup failure: the caller should print it to stderr and exit
/// non-zero without serving MCP traffic.
pub async fn build_app_state(config: procontext_types::Config) -> Result<AppState, ProContextError> {
    let http_client = build_http_client()
        .map_err(|e| ProContextError::internal(format!("failed to build HTTP client: {e}")))?;

    let (entries, registry_version) =
        load_registry(&http_client, &config.registry.url, &config.registry.metadata_url).await?;

    let (registry_indexes, warnings) = RegistryIndexes::build(&entries);
    for warning in warnings {
        tracing::warn!(event = "registry_validation_warning", message = %warning);
    }

    let db_path = config
        .cache
        .db_path
        .as_deref()
        .ok_or_else(|| ProContextError::internal("cache.db_path was not resolved by config loading"))?;
    let cache = Cache::open(std::path::Path::new(db_path))
        .map_err(|e| ProContextError::internal(format!("failed to open cache database: {e}")))?;

    let initial_allowlist = build_allowlist(&entries, &config.fetcher.extra_domains);
    let rehydrated_domains = cache.load_discovered_domains(true, true).await;
    let allowlist = merge_rehydrated(initial_allowlist, rehydrated_domains);

    let fetcher = Fetcher::new(http_client.clone(), config.fetcher.ssrf_domain_check);

    Ok(AppState::new(
        config,
        registry_indexes,
        registry_version,
        http_client,
        cache,
        fetcher,
        AllowlistHandle::new(allowlist),
    ))
}

fn merge_rehydrated(initial: Allowlist, rehydrated: std::collections::BTreeSet<String>) -> Allowlist {
    let mut domains = initial.domains().clone();
    domains.extend(rehydrated);
    Allowlist::from_domains(domains)
}
