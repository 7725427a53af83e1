//! Configuration for the gateway.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the default data directory.
pub const ENV_DATA_DIR: &str = "PREFS_GATEWAY_DATA_DIR";

/// Gateway configuration.
///
/// The config is usually loaded from a TOML file with [`Self::load`].
///
/// The struct also implements [`Default`] which creates a config suitable
/// for local development and testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Authority identifier the gateway registers at startup.
    pub authority: String,
    /// Directory holding one database file per namespace.
    ///
    /// If unset, [`Self::data_dir`] resolves a platform default.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load the config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let s = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().to_string_lossy()))?;
        let config: Config = toml::from_str(&s)?;
        Ok(config)
    }

    /// Resolve the directory holding the namespace databases.
    ///
    /// Precedence: the `data_dir` config field, then the
    /// [`ENV_DATA_DIR`] environment variable, then the platform data
    /// directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        if let Some(val) = env::var_os(ENV_DATA_DIR) {
            return Ok(PathBuf::from(val));
        }
        let path = dirs_next::data_dir().ok_or_else(|| {
            anyhow!("operating environment provides no directory for application data")
        })?;
        Ok(path.join("prefs-gateway"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authority: "prefs.gateway.local".to_string(),
            data_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_roundtrip() -> testresult::TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "authority = \"prefs.example\"\ndata_dir = \"/tmp/prefs\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.authority, "prefs.example");
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/prefs")));
        assert_eq!(config.data_dir()?, PathBuf::from("/tmp/prefs"));
        Ok(())
    }
}
