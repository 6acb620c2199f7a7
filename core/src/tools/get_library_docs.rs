use procontext_fetcher::expand_allowlist_from_content;
use procontext_types::{GetLibraryDocsInput, GetLibraryDocsOutput, ProContextError};

use crate::state::AppState;

/// The recursion-depth threshold `get_library_docs`' own fetch is checked
/// against: a top-level tool call is depth 1.
const EXPANSION_DEPTH_THRESHOLD: u32 = 1;

pub async fn get_library_docs(
    state: &AppState,
    input: GetLibraryDocsInput,
) -> Result<GetLibraryDocsOutput, ProContextError> {
    let library_id = input.validated_library_id()?.to_string();

    let entry = state
        .registry_indexes
        .by_id
        .get(&library_id)
        .cloned()
        .ok_or_else(|| ProContextError::library_not_found(&library_id))?;

    if let Some(cached) = state.cache.get_toc(&library_id).await {
        let stale = cached.is_stale(chrono::Utc::now());
        return Ok(GetLibraryDocsOutput {
            library_id: entry.id,
            name: entry.name,
            content: cached.content,
            cached: true,
            cached_at: cached.fetched_at,
            stale,
        });
    }

    let allowlist = state.allowlist.snapshot();
    let content = state.fetcher.fetch(&entry.llms_txt_url, &allowlist).await?;

    let discovered = expand_allowlist_from_content(
        &content,
        &state.allowlist,
        state.config.fetcher.allowlist_depth,
        EXPANSION_DEPTH_THRESHOLD,
    );

    let fetched_at = chrono::Utc::now();
    state
        .cache
        .set_toc(
            &library_id,
            &entry.llms_txt_url,
            &content,
            &discovered,
            state.config.cache.ttl_hours,
        )
        .await;

    Ok(GetLibraryDocsOutput {
        library_id: entry.id,
        name: entry.name,
        content,
        cached: false,
        cached_at: fetched_at,
        stale: false,
    })
}
