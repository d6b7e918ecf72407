use crate::error::ConfigError;
use crate::state::DEFAULT_LOCALE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file [`HostConfig::read_from_dir`] looks for.
pub const CONFIG_FILE: &str = "i18n.toml";

/// Host settings read from `i18n.toml`.
///
/// ```toml
/// default_locale = "en"
/// locales_dir = "locales"
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HostConfig {
    /// Locale the host starts in.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Directory of runtime locale files, relative to the config file's directory.
    /// Keys found there override bundled keys.
    #[serde(default)]
    pub locales_dir: Option<PathBuf>,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            locales_dir: None,
        }
    }
}

impl HostConfig {
    /// Reads the configuration from a path.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs_err::read_to_string(path)?;
        let config: HostConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// Reads `i18n.toml` from `dir`.
    pub fn read_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        Self::read_from_path(dir.as_ref().join(CONFIG_FILE))
    }

    /// Resolves `locales_dir` against `base_dir`. Absolute paths are returned unchanged.
    pub fn locales_dir_from_base(&self, base_dir: &Path) -> Option<PathBuf> {
        self.locales_dir.as_ref().map(|dir| base_dir.join(dir))
    }
}
