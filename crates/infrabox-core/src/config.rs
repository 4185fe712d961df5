//! `infrabox.toml` project configuration.
//!
//! ```toml
//! environments_dir = "environments"
//! templates_dir = "templates"        # optional; built-in templates otherwise
//! driver = "terraform"               # or "mock"
//! terraform_bin = "terraform"
//!
//! [defaults]
//! name_prefix = "Acme"
//! network_cidr = "10.10.0.0/16"
//! subnet_cidr = "10.10.1.0/24"
//! ```

use infrabox_schema::ParamDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE: &str = "infrabox.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub environments_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub driver: String,
    pub terraform_bin: String,
    pub defaults: ParamDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environments_dir: PathBuf::from("environments"),
            templates_dir: None,
            driver: "terraform".to_owned(),
            terraform_bin: "terraform".to_owned(),
            defaults: ParamDefaults::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `<root>/infrabox.toml` if present,
    /// else the defaults. Relative paths are resolved against `root`.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = root.join(CONFIG_FILE);
                if candidate.is_file() {
                    debug!("using config {}", candidate.display());
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.resolved(root))
    }

    #[must_use]
    pub fn resolved(mut self, root: &Path) -> Self {
        if self.environments_dir.is_relative() {
            self.environments_dir = root.join(&self.environments_dir);
        }
        if let Some(dir) = self.templates_dir.take() {
            self.templates_dir = Some(if dir.is_relative() { root.join(dir) } else { dir });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.environments_dir, dir.path().join("environments"));
        assert_eq!(config.driver, "terraform");
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn file_overrides_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
environments_dir = "envs"
templates_dir = "/opt/infrabox/templates"
driver = "mock"

[defaults]
name_prefix = "Acme"
network_cidr = "10.10.0.0/16"
"#,
        )
        .unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.environments_dir, dir.path().join("envs"));
        assert_eq!(
            config.templates_dir.as_deref(),
            Some(Path::new("/opt/infrabox/templates"))
        );
        assert_eq!(config.driver, "mock");
        assert_eq!(config.terraform_bin, "terraform");
        assert_eq!(config.defaults.name_prefix, "Acme");
        assert_eq!(config.defaults.network_cidr.to_string(), "10.10.0.0/16");
        assert_eq!(config.defaults.location, "westeurope");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "enviroments_dir = \"typo\"\n").unwrap();
        let err = Config::discover(dir.path(), Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
