//! Configuration loading and storage directory resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the log files.
    pub data_dir: PathBuf,

    /// Editor command used by `stl edit`, overriding `$EDITOR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            editor: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `<config dir>/stl/config.toml`, the given
    /// file, then `STL_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("STL_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for stl.
///
/// On Linux: `~/.config/stl`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stl"))
}

/// `~/.stl`, used when it exists and the config directory does not.
fn legacy_data_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".stl"))
}

fn default_data_dir() -> PathBuf {
    match (dirs_config_path(), legacy_data_path()) {
        (Some(preferred), Some(legacy)) if !preferred.is_dir() && legacy.is_dir() => legacy,
        (Some(preferred), _) => preferred,
        (None, Some(legacy)) => legacy,
        (None, None) => PathBuf::from(".stl"),
    }
}

/// Returns the storage root to use.
///
/// An explicitly given directory must exist already; the configured one is
/// created if needed.
pub fn resolve_root(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("invalid directory {}", dir.display()))?;
        if !dir.is_dir() {
            bail!("could not find {}", dir.display());
        }
        return Ok(dir);
    }

    let dir = &config.data_dir;
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        tracing::debug!(dir = %dir.display(), "created storage directory");
    }
    Ok(dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirs_config_path_ends_with_stl() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "stl");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "data_dir = \"/srv/logs\"\neditor = \"nano\"\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/logs"));
        assert_eq!(config.editor.as_deref(), Some("nano"));
    }

    #[test]
    fn explicit_root_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        let err = resolve_root(Some(&missing), &Config::default()).unwrap_err();
        assert_eq!(err.to_string(), format!("could not find {}", missing.display()));

        let found = resolve_root(Some(temp.path()), &Config::default()).unwrap();
        assert!(found.is_absolute());
    }

    #[test]
    fn configured_root_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().join("a").join("b"),
            editor: None,
        };
        let root = resolve_root(None, &config).unwrap();
        assert_eq!(root, config.data_dir);
        assert!(root.is_dir());
    }
}
