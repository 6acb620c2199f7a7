//! The SQLite-backed cache: ToC/page read-write, TTL expiry, stale-while-
//! revalidate, self-throttled cleanup, and discovered-domain persistence.

mod schema;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use procontext_types::cache::{decode_domains, encode_domains};
use procontext_types::{PageCacheEntry, TocCacheEntry};
use rusqlite::{params, Connection, OptionalExtension};

/// Rows older than their TTL by more than this are hard-deleted by
/// [`Cache::cleanup_expired`]. Clients still holding a stale reference get
/// one more grace window to observe it.
const CLEANUP_GRACE: Duration = Duration::days(7);

const LAST_CLEANUP_KEY: &str = "last_cleanup_at";

/// Per-table deletion counts from a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupCounts {
    pub toc_deleted: usize,
    pub page_deleted: usize,
}

#[derive(Clone)]
pub struct Cache {
    conn: Arc<Mutex<Connection>>,
}

impl Cache {
    /// Opens (creating if absent) the SQLite file at `db_path` and applies
    /// the schema. The parent directory is assumed to already exist —
    /// `procontext-config` creates it at load time.
    pub fn open(db_path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(db_path)?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory cache, for tests.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Connection) -> T + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&guard)
        })
        .await
        .expect("cache blocking task panicked")
    }

    /// Returns the cached ToC for `library_id`, or `None` on a miss *or* a
    /// read error — infrastructure errors never cross this boundary (see
    /// DESIGN.md for the rationale).
    pub async fn get_toc(&self, library_id: &str) -> Option<TocCacheEntry> {
        let library_id = library_id.to_string();
        self.with_conn(move |conn| {
            let result = conn.query_row(
                "SELECT library_id, llms_txt_url, content, discovered_domains, fetched_at, expires_at \
                 FROM toc_cache WHERE library_id = ?1",
                params![library_id],
                |row| {
                    Ok(TocCacheEntry {
                        library_id: row.get(0)?,
                        llms_txt_url: row.get(1)?,
                        content: row.get(2)?,
                        discovered_domains: decode_domains(&row.get::<_, String>(3)?),
                        fetched_at: parse_timestamp(&row.get::<_, String>(4)?),
                        expires_at: parse_timestamp(&row.get::<_, String>(5)?),
                    })
                },
            ).optional();

            match result {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(event = "cache_read_error", table = "toc_cache", %error);
                    None
                }
            }
        })
        .await
    }

    /// `INSERT OR REPLACE`. `expires_at = now + ttl_hours`. Write failures
    /// are logged and swallowed — the caller already has fresh content.
    pub async fn set_toc(
        &self,
        library_id: &str,
        llms_txt_url: &str,
        content: &str,
        discovered_domains: &BTreeSet<String>,
        ttl_hours: u64,
    ) {
        let library_id = library_id.to_string();
        let llms_txt_url = llms_txt_url.to_string();
        let content = content.to_string();
        let domains = encode_domains(discovered_domains);
        let fetched_at = Utc::now();
        let expires_at = fetched_at + Duration::hours(ttl_hours as i64);

        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT OR REPLACE INTO toc_cache \
                 (library_id, llms_txt_url, content, discovered_domains, fetched_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    library_id,
                    llms_txt_url,
                    content,
                    domains,
                    fetched_at.to_rfc3339(),
                    expires_at.to_rfc3339(),
                ],
            );
            if let Err(error) = result {
                tracing::warn!(event = "cache_write_error", table = "toc_cache", %error);
            }
        })
        .await;
    }

    pub async fn get_page(&self, url_hash: &str) -> Option<PageCacheEntry> {
        let url_hash = url_hash.to_string();
        self.with_conn(move |conn| {
            let result = conn.query_row(
                "SELECT url_hash, url, content, headings, discovered_domains, fetched_at, expires_at \
                 FROM page_cache WHERE url_hash = ?1",
                params![url_hash],
                |row| {
                    Ok(PageCacheEntry {
                        url_hash: row.get(0)?,
                        url: row.get(1)?,
                        content: row.get(2)?,
                        headings: row.get(3)?,
                        discovered_domains: decode_domains(&row.get::<_, String>(4)?),
                        fetched_at: parse_timestamp(&row.get::<_, String>(5)?),
                        expires_at: parse_timestamp(&row.get::<_, String>(6)?),
                    })
                },
            ).optional();

            match result {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(event = "cache_read_error", table = "page_cache", %error);
                    None
                }
            }
        })
        .await
    }

    pub async fn set_page(
        &self,
        url_hash: &str,
        url: &str,
        content: &str,
        headings: &str,
        discovered_domains: &BTreeSet<String>,
        ttl_hours: u64,
    ) {
        let url_hash = url_hash.to_string();
        let url = url.to_string();
        let content = content.to_string();
        let headings = headings.to_string();
        let domains = encode_domains(discovered_domains);
        let fetched_at = Utc::now();
        let expires_at = fetched_at + Duration::hours(ttl_hours as i64);

        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT OR REPLACE INTO page_cache \
                 (url_hash, url, content, headings, discovered_domains, fetched_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    url_hash,
                    url,
                    content,
                    headings,
                    domains,
                    fetched_at.to_rfc3339(),
                    expires_at.to_rfc3339(),
                ],
            );
            if let Err(error) = result {
                tracing::warn!(event = "cache_write_error", table = "page_cache", %error);
            }
        })
        .await;
    }

    /// Deletes rows from both tables where `expires_at < now - 7 days`.
    pub async fn cleanup_expired(&self) -> CleanupCounts {
        let cutoff = (Utc::now() - CLEANUP_GRACE).to_rfc3339();
        let counts = self
            .with_conn(move |conn| {
                let toc_deleted = conn
                    .execute("DELETE FROM toc_cache WHERE expires_at < ?1", params![cutoff])
                    .unwrap_or_else(|error| {
                        tracing::warn!(event = "cache_cleanup_error", table = "toc_cache", %error);
                        0
                    });
                let page_deleted = conn
                    .execute("DELETE FROM page_cache WHERE expires_at < ?1", params![cutoff])
                    .unwrap_or_else(|error| {
                        tracing::warn!(event = "cache_cleanup_error", table = "page_cache", %error);
                        0
                    });
                CleanupCounts {
                    toc_deleted,
                    page_deleted,
                }
            })
            .await;

        tracing::info!(
            event = "cache_cleanup_complete",
            toc_deleted = counts.toc_deleted,
            page_deleted = counts.page_deleted
        );
        counts
    }

    /// Runs [`Self::cleanup_expired`] at most once per `interval_hours`,
    /// coordinating across process restarts via `server_metadata`. A read
    /// error on the metadata row falls through to running cleanup anyway —
    /// failing safe toward doing the work rather than risking unbounded
    /// growth.
    pub async fn cleanup_if_due(&self, interval_hours: u64) -> bool {
        let last = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT value FROM server_metadata WHERE key = ?1",
                    params![LAST_CLEANUP_KEY],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await;

        let due = match last {
            Ok(Some(raw)) => {
                let last_at = parse_timestamp(&raw);
                Utc::now() - last_at >= Duration::hours(interval_hours as i64)
            }
            Ok(None) => true,
            Err(_) => true,
        };

        if !due {
            return false;
        }

        self.cleanup_expired().await;

        let now = Utc::now().to_rfc3339();
        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT OR REPLACE INTO server_metadata (key, value) VALUES (?1, ?2)",
                params![LAST_CLEANUP_KEY, now],
            );
            if let Err(error) = result {
                tracing::warn!(event = "cache_write_error", table = "server_metadata", %error);
            }
        })
        .await;

        true
    }

    /// Unions `discovered_domains` across the selected tables, for
    /// rehydrating the allowlist at startup. A read error returns the empty
    /// set.
    pub async fn load_discovered_domains(
        &self,
        include_toc: bool,
        include_pages: bool,
    ) -> BTreeSet<String> {
        self.with_conn(move |conn| {
            let mut domains = BTreeSet::new();

            if include_toc {
                collect_domains(conn, "toc_cache", &mut domains);
            }
            if include_pages {
                collect_domains(conn, "page_cache", &mut domains);
            }

            domains
        })
        .await
    }
}

fn collect_domains(conn: &Connection, table: &str, out: &mut BTreeSet<String>) {
    let query = format!("SELECT discovered_domains FROM {table}");
    let result = (|| -> rusqlite::Result<()> {
        let mut stmt = conn.prepare(&query)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            out.extend(decode_domains(&raw));
        }
        Ok(())
    })();

    if let Err(error) = result {
        tracing::warn!(event = "cache_read_error", table, %error);
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(domains: &[&str]) -> BTreeSet<String> {
        domains.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn set_then_get_toc_roundtrips_fresh() {
        let cache = Cache::open_in_memory().unwrap();
        cache
            .set_toc("langchain", "https://example.com/llms.txt", "# L", &set(&[]), 24)
            .await;
        let entry = cache.get_toc("langchain").await.unwrap();
        assert_eq!(entry.content, "# L");
        assert!(!entry.is_stale(Utc::now()));
    }

    #[tokio::test]
    async fn get_toc_miss_returns_none() {
        let cache = Cache::open_in_memory().unwrap();
        assert!(cache.get_toc("nope").await.is_none());
    }

    #[tokio::test]
    async fn set_toc_twice_keeps_one_row_with_latest_content() {
        let cache = Cache::open_in_memory().unwrap();
        cache
            .set_toc("lib", "https://example.com/a", "first", &set(&[]), 24)
            .await;
        cache
            .set_toc("lib", "https://example.com/a", "second", &set(&[]), 24)
            .await;
        let entry = cache.get_toc("lib").await.unwrap();
        assert_eq!(entry.content, "second");
    }

    #[tokio::test]
    async fn page_roundtrip_preserves_url_via_hash() {
        let cache = Cache::open_in_memory().unwrap();
        let url = "https://example.com/docs/page";
        let hash = procontext_types::cache::url_hash(url);
        cache
            .set_page(&hash, url, "content", "1: Heading", &set(&[]), 24)
            .await;
        let entry = cache.get_page(&hash).await.unwrap();
        assert_eq!(entry.url, url);
    }

    #[tokio::test]
    async fn expired_entry_reports_stale() {
        let cache = Cache::open_in_memory().unwrap();
        cache
            .set_toc("lib", "https://example.com/a", "content", &set(&[]), 24)
            .await;
        let far_future = Utc::now() + Duration::hours(25);
        let entry = cache.get_toc("lib").await.unwrap();
        assert!(entry.is_stale(far_future));
    }

    #[tokio::test]
    async fn cleanup_expired_deletes_rows_past_grace_window() {
        let cache = Cache::open_in_memory().unwrap();
        // Insert a row whose expires_at is already 8 days in the past by
        // writing directly through the connection.
        let eight_days_ago = (Utc::now() - Duration::days(8)).to_rfc3339();
        cache
            .with_conn({
                let eight_days_ago = eight_days_ago.clone();
                move |conn| {
                    conn.execute(
                        "INSERT INTO toc_cache (library_id, llms_txt_url, content, discovered_domains, fetched_at, expires_at) \
                         VALUES ('old', 'https://example.com', 'x', '', ?1, ?1)",
                        params![eight_days_ago],
                    )
                    .unwrap();
                }
            })
            .await;

        let counts = cache.cleanup_expired().await;
        assert_eq!(counts.toc_deleted, 1);
        assert!(cache.get_toc("old").await.is_none());
    }

    #[tokio::test]
    async fn cleanup_if_due_runs_once_per_interval() {
        let cache = Cache::open_in_memory().unwrap();
        assert!(cache.cleanup_if_due(6).await);
        assert!(!cache.cleanup_if_due(6).await);
    }

    #[tokio::test]
    async fn cleanup_if_due_runs_when_metadata_absent() {
        let cache = Cache::open_in_memory().unwrap();
        assert!(cache.cleanup_if_due(6).await);
    }

    #[tokio::test]
    async fn load_discovered_domains_unions_selected_tables() {
        let cache = Cache::open_in_memory().unwrap();
        cache
            .set_toc(
                "lib",
                "https://example.com/a",
                "content",
                &set(&["toc-domain.com"]),
                24,
            )
            .await;
        let hash = procontext_types::cache::url_hash("https://example.com/p");
        cache
            .set_page(
                &hash,
                "https://example.com/p",
                "content",
                "",
                &set(&["page-domain.com"]),
                24,
            )
            .await;

        let both = cache.load_discovered_domains(true, true).await;
        assert!(both.contains("toc-domain.com"));
        assert!(both.contains("page-domain.com"));

        let toc_only = cache.load_discovered_domains(true, false).await;
        assert!(toc_only.contains("toc-domain.com"));
        assert!(!toc_only.contains("page-domain.com"));
    }
}
