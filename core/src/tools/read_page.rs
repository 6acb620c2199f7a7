use procontext_fetcher::expand_allowlist_from_content;
use procontext_types::cache::url_hash;
use procontext_types::{ProContextError, ReadPageInput, ReadPageOutput};

use crate::markdown::{extract_headings, total_lines, window};
use crate::state::AppState;

const EXPANSION_DEPTH_THRESHOLD: u32 = 1;

pub async fn read_page(
    state: &AppState,
    input: ReadPageInput,
) -> Result<ReadPageOutput, ProContextError> {
    let (url, offset, limit) = input.validated()?;
    let hash = url_hash(&url);

    let (content, headings, cached, cached_at, stale) =
        if let Some(entry) = state.cache.get_page(&hash).await {
            let stale = entry.is_stale(chrono::Utc::now());
            (entry.content, entry.headings, true, entry.fetched_at, stale)
        } else {
            let allowlist = state.allowlist.snapshot();
            let content = state.fetcher.fetch(&url, &allowlist).await?;
            let headings = extract_headings(&content);

            let discovered = expand_allowlist_from_content(
                &content,
                &state.allowlist,
                state.config.fetcher.allowlist_depth,
                EXPANSION_DEPTH_THRESHOLD,
            );

            let fetched_at = chrono::Utc::now();
            state
                .cache
                .set_page(
                    &hash,
                    &url,
                    &content,
                    &headings,
                    &discovered,
                    state.config.cache.ttl_hours,
                )
                .await;

            (content, headings, false, fetched_at, false)
        };

    let total = total_lines(&content);
    let windowed = window(&content, offset, limit);

    Ok(ReadPageOutput {
        url,
        headings,
        total_lines: total,
        offset,
        limit,
        content: windowed,
        cached,
        cached_at,
        stale,
    })
}
