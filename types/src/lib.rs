//! Core domain types for procontext.
//!
//! Pure data definitions shared across the workspace: registry records, cache
//! rows, MCP tool input/output payloads, the error taxonomy, and the
//! configuration tree. Nothing here performs IO or touches `async` — that
//! lives in `procontext-fetcher`, `procontext-cache`, `procontext-registry`,
//! and `procontext-config`.

pub mod cache;
pub mod config;
pub mod errors;
pub mod registry;
pub mod tools;

pub use cache::{PageCacheEntry, TocCacheEntry};
pub use config::{
    CacheSettings, Config, FetcherSettings, LogFormat, LogLevel, LoggingSettings, RegistrySettings,
    ServerSettings, Transport,
};
pub use errors::{ErrorCode, ProContextError};
pub use registry::{LibraryMatch, MatchedVia, RegistryEntry, RegistryIndexes, RegistryPackages};
pub use tools::{
    GetLibraryDocsInput, GetLibraryDocsOutput, ReadPageInput, ReadPageOutput, ResolveLibraryInput,
    ResolveLibraryOutput,
};
