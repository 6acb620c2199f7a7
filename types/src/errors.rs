//! The stable error taxonomy shared by every tool and the MCP envelope.

use serde::{Deserialize, Serialize};

/// Closed set of wire-stable error codes.
///
/// The string form (via `Serialize`/`Display`) is part of the public MCP
/// contract: never rename a variant without updating clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A tool argument failed validation.
    InvalidInput,
    /// `library_id` is absent from the registry.
    LibraryNotFound,
    /// The URL, or a redirect target, violated the allowlist or private-IP rules.
    UrlNotAllowed,
    /// Upstream responded 404.
    PageNotFound,
    /// Upstream responded 5xx, or a transport-level failure occurred.
    PageFetchFailed,
    /// The redirect hop count exceeded the configured maximum.
    TooManyRedirects,
    /// Startup-only: the registry manifest could not be loaded.
    RegistryLoadFailed,
    /// Catch-all for unexpected, unmapped failures.
    InternalError,
}

impl ErrorCode {
    /// Whether a client should reasonably expect a retry to succeed.
    #[must_use]
    pub fn recoverable(self) -> bool {
        matches!(self, Self::PageFetchFailed)
    }

    /// The stable wire string for this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::LibraryNotFound => "LIBRARY_NOT_FOUND",
            Self::UrlNotAllowed => "URL_NOT_ALLOWED",
            Self::PageNotFound => "PAGE_NOT_FOUND",
            Self::PageFetchFailed => "PAGE_FETCH_FAILED",
            Self::TooManyRedirects => "TOO_MANY_REDIRECTS",
            Self::RegistryLoadFailed => "REGISTRY_LOAD_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A taxonomy-backed error, carrying the wire code, a human message, and
/// whether the client should retry.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ProContextError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl ProContextError {
    /// Build an error, deriving `recoverable` from the code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            recoverable: code.recoverable(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    #[must_use]
    pub fn library_not_found(library_id: &str) -> Self {
        Self::new(
            ErrorCode::LibraryNotFound,
            format!("unknown library_id: {library_id}"),
        )
    }

    #[must_use]
    pub fn url_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UrlNotAllowed, message)
    }

    #[must_use]
    pub fn page_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PageNotFound, message)
    }

    #[must_use]
    pub fn page_fetch_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PageFetchFailed, message)
    }

    #[must_use]
    pub fn too_many_redirects(max_hops: u32) -> Self {
        Self::new(
            ErrorCode::TooManyRedirects,
            format!("exceeded {max_hops} redirect hops"),
        )
    }

    #[must_use]
    pub fn registry_load_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistryLoadFailed, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Render the `{"error": {...}}` envelope body used by the MCP result.
    #[must_use]
    pub fn to_envelope(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "recoverable": self.recoverable,
            }
        })
    }
}
