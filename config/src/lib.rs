//! Layered configuration loading: environment variables override a YAML
//! file, which overrides hardcoded defaults. Unknown or wrong-typed keys are
//! rejected — see `procontext_types::config::Config`'s `deny_unknown_fields`.

use std::path::{Path, PathBuf};

use procontext_types::Config;

/// Failure loading or validating configuration. Every variant is a startup
/// failure: the process should print this to stderr and exit non-zero.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build configuration sources: {0}")]
    Build(#[from] config::ConfigError),
    #[error("could not resolve platform user-data directory for cache.db_path")]
    NoDataDir,
    #[error("failed to create cache directory {path}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Locates the first existing YAML config file, searching `./procontext.yaml`
/// then `~/.config/procontext/procontext.yaml`.
fn find_config_file() -> Option<PathBuf> {
    let cwd_candidate = Path::new("./procontext.yaml");
    if cwd_candidate.is_file() {
        return Some(cwd_candidate.to_path_buf());
    }
    let home_candidate = dirs::config_dir().map(|d| d.join("procontext").join("procontext.yaml"));
    home_candidate.filter(|p| p.is_file())
}

/// Load configuration: env (`PROCONTEXT__` prefix, `__` nested delimiter) >
/// YAML file > defaults. Resolves `cache.db_path` to a platform-specific
/// default when unset, and creates its parent directory.
pub fn load() -> Result<Config, ConfigError> {
    load_from(find_config_file().as_deref())
}

/// Same as [`load`] but with an explicit (possibly absent) YAML file path,
/// for tests.
pub fn load_from(yaml_path: Option<&Path>) -> Result<Config, ConfigError> {
    let defaults = Config::default();
    let mut builder = config::Config::builder().add_source(
        config::Config::try_from(&defaults).map_err(ConfigError::Build)?,
    );

    if let Some(path) = yaml_path {
        builder = builder.add_source(
            config::File::from(path).format(config::FileFormat::Yaml),
        );
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PROCONTEXT")
            .separator("__")
            .try_parsing(true),
    );

    let built = builder.build()?;
    let mut cfg: Config = built.try_deserialize()?;

    resolve_db_path(&mut cfg)?;

    Ok(cfg)
}

fn resolve_db_path(cfg: &mut Config) -> Result<(), ConfigError> {
    let path = match &cfg.cache.db_path {
        Some(raw) => PathBuf::from(raw),
        None => dirs::data_dir()
            .ok_or(ConfigError::NoDataDir)?
            .join("procontext")
            .join("cache.db"),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateCacheDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    cfg.cache.db_path = Some(path.to_string_lossy().into_owned());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_load_without_a_yaml_file() {
        let cfg = load_from(None).expect("defaults should always load");
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.cache.db_path.is_some());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procontext.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cache:\n  ttl_hours: 48\n").unwrap();

        let cfg = load_from(Some(&path)).unwrap();
        assert_eq!(cfg.cache.ttl_hours, 48);
    }

    #[test]
    fn env_overrides_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procontext.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cache:\n  ttl_hours: 48\n").unwrap();

        // SAFETY: test-only, single-threaded set/remove of a process-local env var.
        unsafe {
            std::env::set_var("PROCONTEXT__CACHE__TTL_HOURS", "72");
        }
        let cfg = load_from(Some(&path)).unwrap();
        unsafe {
            std::env::remove_var("PROCONTEXT__CACHE__TTL_HOURS");
        }
        assert_eq!(cfg.cache.ttl_hours, 72);
    }

    #[test]
    fn unknown_yaml_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procontext.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "bogus_top_level: 1\n").unwrap();

        assert!(load_from(Some(&path)).is_err());
    }

    #[test]
    fn wrong_typed_yaml_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procontext.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cache:\n  ttl_hours: \"not-a-number\"\n").unwrap();

        assert!(load_from(Some(&path)).is_err());
    }

    #[test]
    fn db_path_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("cache.db");
        let yaml_path = dir.path().join("procontext.yaml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "cache:\n  db_path: \"{}\"\n", db_path.display()).unwrap();

        let cfg = load_from(Some(&yaml_path)).unwrap();
        assert_eq!(cfg.cache.db_path.as_deref(), Some(db_path.to_str().unwrap()));
        assert!(db_path.parent().unwrap().is_dir());
    }
}
