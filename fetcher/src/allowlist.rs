//! The fetch-target allowlist and its atomic-swap publishing handle.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::OnceLock;

use arc_swap::ArcSwap;
use procontext_types::RegistryEntry;
use regex::Regex;

use crate::domain::base_domain;

/// An immutable set of base domains the fetcher may contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist(BTreeSet<String>);

impl Allowlist {
    #[must_use]
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(domains.into_iter().map(|d| d.as_ref().to_string()).collect())
    }

    #[must_use]
    pub fn contains_domain(&self, domain: &str) -> bool {
        self.0.contains(domain)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn domains(&self) -> &BTreeSet<String> {
        &self.0
    }

    fn union_new(&self, extra: &BTreeSet<String>) -> Self {
        let mut merged = self.0.clone();
        merged.extend(extra.iter().cloned());
        Self(merged)
    }
}

/// Atomic-swap publishing slot for the current [`Allowlist`].
///
/// Readers call [`AllowlistHandle::snapshot`] once at the start of an
/// operation and reuse that `Arc` throughout — never re-reading mid-call.
#[derive(Debug)]
pub struct AllowlistHandle(ArcSwap<Allowlist>);

impl AllowlistHandle {
    #[must_use]
    pub fn new(initial: Allowlist) -> Self {
        Self(ArcSwap::new(Arc::new(initial)))
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Allowlist> {
        self.0.load_full()
    }

    /// Replace the published set with `new`.
    pub fn publish(&self, new: Allowlist) {
        self.0.store(Arc::new(new));
    }
}

/// Unions the base domain of every non-null `docs_url` and every
/// `llms_txt_url` across `entries`, plus the base domain of each
/// `extra_domains` member.
#[must_use]
pub fn build_allowlist(entries: &[RegistryEntry], extra_domains: &[String]) -> Allowlist {
    let mut domains = BTreeSet::new();
    for entry in entries {
        if let Some(host) = url_host(&entry.llms_txt_url) {
            domains.insert(base_domain(&host));
        }
        if let Some(docs_url) = &entry.docs_url {
            if let Some(host) = url_host(docs_url) {
                domains.insert(base_domain(&host));
            }
        }
    }
    for extra in extra_domains {
        if let Some(host) = url_host(extra) {
            domains.insert(base_domain(&host));
        } else {
            // Not parseable as a URL; treat the literal value as a host.
            domains.insert(base_domain(extra));
        }
    }
    Allowlist(domains)
}

fn url_host(maybe_url: &str) -> Option<String> {
    url::Url::parse(maybe_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s<>\)\]\}]+").expect("static regex is valid"))
}

/// Finds every `http://`/`https://` URL in `text` — bare or wrapped in
/// Markdown link syntax — and returns the set of their base domains.
#[must_use]
pub fn extract_base_domains_from_content(text: &str) -> BTreeSet<String> {
    let mut domains = BTreeSet::new();
    for found in url_regex().find_iter(text) {
        let raw = found
            .as_str()
            .trim_end_matches(|c: char| ".,;:!?'\")]}".contains(c));
        if let Some(host) = url_host(raw) {
            domains.insert(base_domain(&host));
        }
    }
    domains
}

/// Always returns the discovered base-domain set (for cache persistence).
/// Atomically replaces the published allowlist with the union of the
/// current set and the discovered set, but only when
/// `configured_allowlist_depth >= depth_threshold`. When no genuinely new
/// domain is discovered, or the depth gate is closed, the published
/// reference is left untouched (identity-preserving).
pub fn expand_allowlist_from_content(
    content: &str,
    handle: &AllowlistHandle,
    configured_allowlist_depth: u32,
    depth_threshold: u32,
) -> BTreeSet<String> {
    let discovered = extract_base_domains_from_content(content);

    if configured_allowlist_depth >= depth_threshold {
        let current = handle.snapshot();
        let genuinely_new: BTreeSet<String> = discovered
            .difference(current.domains())
            .cloned()
            .collect();
        if !genuinely_new.is_empty() {
            handle.publish(current.union_new(&genuinely_new));
        }
    }

    discovered
}

#[cfg(test)]
mod tests {
    use super::*;
    use procontext_types::RegistryPackages;

    fn entry(llms_txt_url: &str, docs_url: Option<&str>) -> RegistryEntry {
        RegistryEntry {
            id: "lib".to_string(),
            name: "lib".to_string(),
            docs_url: docs_url.map(str::to_string),
            repo_url: None,
            languages: vec![],
            packages: RegistryPackages::default(),
            aliases: vec![],
            llms_txt_url: llms_txt_url.to_string(),
        }
    }

    #[test]
    fn build_allowlist_includes_llms_txt_and_docs_domains() {
        let entries = vec![entry(
            "https://docs.example.com/llms.txt",
            Some("https://example.com/docs"),
        )];
        let allowlist = build_allowlist(&entries, &[]);
        assert!(allowlist.contains_domain("example.com"));
    }

    #[test]
    fn build_allowlist_includes_extra_domains() {
        let allowlist = build_allowlist(&[], &["extra.org".to_string()]);
        assert!(allowlist.contains_domain("extra.org"));
    }

    #[test]
    fn extract_domains_from_bare_and_markdown_urls() {
        let text = "See https://bare.com/page and [link](https://markdown.net/x).";
        let domains = extract_base_domains_from_content(text);
        assert!(domains.contains("bare.com"));
        assert!(domains.contains("markdown.net"));
    }

    #[test]
    fn extract_domains_ignores_non_http_schemes() {
        let text = "ftp://nope.com/x and mailto:a@b.com";
        assert!(extract_base_domains_from_content(text).is_empty());
    }

    #[test]
    fn expand_is_identity_preserving_when_nothing_new() {
        let handle = AllowlistHandle::new(Allowlist::from_domains(["example.com"]));
        let before = handle.snapshot();
        let discovered =
            expand_allowlist_from_content("https://example.com/x", &handle, 1, 1);
        let after = handle.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(discovered.contains("example.com"));
    }

    #[test]
    fn expand_publishes_new_domains_when_depth_allows() {
        let handle = AllowlistHandle::new(Allowlist::from_domains(["example.com"]));
        expand_allowlist_from_content("https://fresh.org/x", &handle, 1, 1);
        assert!(handle.snapshot().contains_domain("fresh.org"));
    }

    #[test]
    fn expand_leaves_allowlist_untouched_below_depth_threshold() {
        let handle = AllowlistHandle::new(Allowlist::from_domains(["example.com"]));
        let before = handle.snapshot();
        expand_allowlist_from_content("https://fresh.org/x", &handle, 0, 1);
        let after = handle.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!after.contains_domain("fresh.org"));
    }
}
