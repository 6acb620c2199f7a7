//! MCP tool input/output payloads and their field validators.
//!
//! Each input type hand-validates its own fields rather than delegating to a
//! generic schema-validation library (see DESIGN.md for the rationale).

use serde::{Deserialize, Serialize};

use crate::errors::ProContextError;
use crate::registry::RegistryEntry;

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveLibraryInput {
    pub query: String,
}

impl ResolveLibraryInput {
    /// Trims and checks 1..=500 chars. Returns the trimmed query.
    pub fn validated_query(&self) -> Result<String, ProContextError> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(ProContextError::invalid_input(
                "query must not be empty",
            ));
        }
        if trimmed.chars().count() > 500 {
            return Err(ProContextError::invalid_input(
                "query must be at most 500 characters",
            ));
        }
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveLibraryOutput {
    pub matches: Vec<crate::registry::LibraryMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetLibraryDocsInput {
    pub library_id: String,
}

impl GetLibraryDocsInput {
    pub fn validated_library_id(&self) -> Result<&str, ProContextError> {
        if RegistryEntry::id_is_valid(&self.library_id) {
            Ok(&self.library_id)
        } else {
            Err(ProContextError::invalid_input(
                "library_id must match ^[a-z0-9][a-z0-9_-]*$",
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetLibraryDocsOutput {
    pub library_id: String,
    pub name: String,
    pub content: String,
    pub cached: bool,
    pub cached_at: chrono::DateTime<chrono::Utc>,
    pub stale: bool,
}

fn default_offset() -> i64 {
    1
}

fn default_limit() -> i64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadPageInput {
    pub url: String,
    #[serde(default = "default_offset")]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl ReadPageInput {
    /// Validates scheme, length, and the 1-based bounds, returning the
    /// offset/limit as `usize` on success.
    pub fn validated(&self) -> Result<(String, usize, usize), ProContextError> {
        if self.url.chars().count() > 2048 {
            return Err(ProContextError::invalid_input(
                "url must be at most 2048 characters",
            ));
        }
        let parsed = url::Url::parse(&self.url)
            .map_err(|_| ProContextError::invalid_input("url must be a valid http(s) URL"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ProContextError::invalid_input(
                "url scheme must be http or https",
            ));
        }
        if self.offset < 1 {
            return Err(ProContextError::invalid_input("offset must be >= 1"));
        }
        if self.limit < 1 {
            return Err(ProContextError::invalid_input("limit must be >= 1"));
        }
        Ok((self.url.clone(), self.offset as usize, self.limit as usize))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadPageOutput {
    pub url: String,
    pub headings: String,
    pub total_lines: usize,
    pub offset: usize,
    pub limit: usize,
    pub content: String,
    pub cached: bool,
    pub cached_at: chrono::DateTime<chrono::Utc>,
    pub stale: bool,
}
