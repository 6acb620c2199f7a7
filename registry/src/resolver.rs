//! Three-tier library resolution: exact package name, exact id/alias, fuzzy.

use procontext_types::{LibraryMatch, MatchedVia, RegistryIndexes};

const FUZZY_THRESHOLD: f64 = 0.6;
const FUZZY_WEIGHT: f64 = 0.9;
const MAX_MATCHES: usize = 10;

/// Resolves `query` against `indexes`, returning at most 10 matches sorted
/// by descending relevance (ties broken ascending by `library_id`), with no
/// duplicate `library_id`.
///
/// Callers are expected to have already validated `query` is non-empty and
/// within length bounds (see `procontext_types::tools::ResolveLibraryInput`).
#[must_use]
pub fn resolve_library(query: &str, indexes: &RegistryIndexes) -> Vec<LibraryMatch> {
    let normalized = query.trim().to_lowercase();
    let mut matches: Vec<LibraryMatch> = Vec::new();

    if let Some(library_id) = indexes.by_package.get(&normalized) {
        if let Some(entry) = indexes.by_id.get(library_id) {
            matches.push(LibraryMatch {
                library_id: entry.id.clone(),
                name: entry.name.clone(),
                languages: entry.languages.clone(),
                docs_url: entry.docs_url.clone(),
                matched_via: MatchedVia::PackageName,
                relevance: 1.0,
            });
        }
    }

    if let Some(entry) = indexes.by_id.get(&normalized) {
        matches.push(LibraryMatch {
            library_id: entry.id.clone(),
            name: entry.name.clone(),
            languages: entry.languages.clone(),
            docs_url: entry.docs_url.clone(),
            matched_via: MatchedVia::LibraryId,
            relevance: 1.0,
        });
    } else if let Some(entry) = indexes
        .by_id
        .values()
        .find(|entry| entry.aliases.iter().any(|a| a.trim().to_lowercase() == normalized))
    {
        matches.push(LibraryMatch {
            library_id: entry.id.clone(),
            name: entry.name.clone(),
            languages: entry.languages.clone(),
            docs_url: entry.docs_url.clone(),
            matched_via: MatchedVia::Alias,
            relevance: 0.95,
        });
    }

    let mut best_fuzzy: std::collections::HashMap<&str, f64> = std::collections::HashMap::new();
    for (term, library_id) in &indexes.fuzzy_corpus {
        let score = strsim::normalized_levenshtein(&normalized, term);
        if score < FUZZY_THRESHOLD {
            continue;
        }
        best_fuzzy
            .entry(library_id.as_str())
            .and_modify(|best| {
                if score > *best {
                    *best = score;
                }
            })
            .or_insert(score);
    }
    for (library_id, score) in best_fuzzy {
        if let Some(entry) = indexes.by_id.get(library_id) {
            matches.push(LibraryMatch {
                library_id: entry.id.clone(),
                name: entry.name.clone(),
                languages: entry.languages.clone(),
                docs_url: entry.docs_url.clone(),
                matched_via: MatchedVia::Fuzzy,
                relevance: score * FUZZY_WEIGHT,
            });
        }
    }

    dedup_keep_highest(&mut matches);
    matches.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.library_id.cmp(&b.library_id))
    });
    matches.truncate(MAX_MATCHES);
    matches
}

fn dedup_keep_highest(matches: &mut Vec<LibraryMatch>) {
    let mut best: std::collections::HashMap<String, LibraryMatch> = std::collections::HashMap::new();
    for m in matches.drain(..) {
        best.entry(m.library_id.clone())
            .and_modify(|existing| {
                if m.relevance > existing.relevance {
                    *existing = m.clone();
                }
            })
            .or_insert(m);
    }
    matches.extend(best.into_values());
}
