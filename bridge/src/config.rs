//! `offload.toml` support.
//!
//! ```toml
//! node = "/opt/node/bin/node"
//!
//! [defaults]
//! cwd = "/srv/jobs"
//! execArgv = ["--no-warnings"]
//! stderr = true
//!
//! [defaults.resourceLimits]
//! maxOldGenerationSizeMb = 256
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use offload_types::SpawnOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid offload config: {0}")]
    Invalid(#[from] toml::de::Error),
}

impl ConfigError {
    /// The file involved, when the config came from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffloadConfig {
    /// Node executable. Resolved from `PATH` when unset.
    pub node: Option<PathBuf>,
    /// Spawn options for [`crate::Offload::call`].
    pub defaults: SpawnOptions,
}

impl OffloadConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read offload config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse offload config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
