//! The configuration tree. Shapes only — layered loading, env overlay, and
//! validation live in `procontext-config`.

use serde::{Deserialize, Serialize};

/// Wire transport the server binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
}

impl Default for Transport {
    fn default() -> Self {
        Self::Stdio
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySettings {
    #[serde(default = "default_registry_url")]
    pub url: String,
    #[serde(default = "default_registry_metadata_url")]
    pub metadata_url: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            metadata_url: default_registry_metadata_url(),
        }
    }
}

fn default_registry_url() -> String {
    "https://procontexthq.github.io/registry/manifest.json".to_string()
}

fn default_registry_metadata_url() -> String {
    "https://procontexthq.github.io/registry/metadata.json".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// `None` means "use the platform user-data dir"; resolved by
    /// `procontext-config` at load time, never left unresolved downstream.
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            db_path: None,
            cleanup_interval_hours: default_cleanup_interval_hours(),
        }
    }
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_cleanup_interval_hours() -> u64 {
    6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetcherSettings {
    #[serde(default = "default_allowlist_depth")]
    pub allowlist_depth: u32,
    #[serde(default = "default_true")]
    pub ssrf_domain_check: bool,
    #[serde(default)]
    pub extra_domains: Vec<String>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            allowlist_depth: default_allowlist_depth(),
            ssrf_domain_check: true,
            extra_domains: Vec::new(),
        }
    }
}

fn default_allowlist_depth() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Json
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
        }
    }
}

/// The full configuration tree, as loaded by `procontext-config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub fetcher: FetcherSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            registry: RegistrySettings::default(),
            cache: CacheSettings::default(),
            fetcher: FetcherSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
