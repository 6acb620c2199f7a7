//! SQLite DDL: WAL journal mode, `foreign_keys=ON`, two content tables plus
//! a single-row-per-key metadata table used as the cleanup soft lease.

pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS toc_cache (
    library_id          TEXT PRIMARY KEY,
    llms_txt_url        TEXT NOT NULL,
    content             TEXT NOT NULL,
    discovered_domains  TEXT NOT NULL DEFAULT '',
    fetched_at          TEXT NOT NULL,
    expires_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS page_cache (
    url_hash            TEXT PRIMARY KEY,
    url                 TEXT NOT NULL UNIQUE,
    content             TEXT NOT NULL,
    headings            TEXT NOT NULL DEFAULT '',
    discovered_domains  TEXT NOT NULL DEFAULT '',
    fetched_at          TEXT NOT NULL,
    expires_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS server_metadata (
    key                 TEXT PRIMARY KEY,
    value               TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_toc_expires ON toc_cache(expires_at);
CREATE INDEX IF NOT EXISTS idx_page_expires ON page_cache(expires_at);
";

pub fn apply(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)
}
