//! Cache row shapes shared between `procontext-cache` and the tool layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A cached library table-of-contents (`llms.txt` body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocCacheEntry {
    pub library_id: String,
    pub llms_txt_url: String,
    pub content: String,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub discovered_domains: BTreeSet<String>,
}

impl TocCacheEntry {
    /// Whether this entry is past its TTL as of `now`.
    #[must_use]
    pub fn is_stale(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now > self.expires_at
    }
}

/// A cached documentation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCacheEntry {
    pub url_hash: String,
    pub url: String,
    pub content: String,
    /// `"<line>: <heading>"` rows, newline-joined.
    pub headings: String,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub discovered_domains: BTreeSet<String>,
}

impl PageCacheEntry {
    #[must_use]
    pub fn is_stale(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now > self.expires_at
    }
}

/// SHA-256 hex digest of a URL, used as [`PageCacheEntry::url_hash`].
#[must_use]
pub fn url_hash(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Encode a discovered-domain set as the comma-separated column format used
/// by the SQLite schema; the empty set encodes to the empty string.
#[must_use]
pub fn encode_domains(domains: &BTreeSet<String>) -> String {
    domains.iter().cloned().collect::<Vec<_>>().join(",")
}

/// Inverse of [`encode_domains`].
#[must_use]
pub fn decode_domains(raw: &str) -> BTreeSet<String> {
    if raw.is_empty() {
        return BTreeSet::new();
    }
    raw.split(',').map(str::to_string).collect()
}
