//! Options forwarded to the isolate when a unit is spawned.
//!
//! Neither the synthesizer nor the bridge interprets these; the isolate
//! backend translates them into whatever its host understands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Per-invocation spawn configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnOptions {
    /// Full environment of the unit. `None` inherits the caller's environment.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
    /// Arguments visible to the unit (`process.argv` after the executable).
    #[serde(default)]
    pub argv: Vec<String>,
    /// Extra flags for the host runtime itself.
    #[serde(default, alias = "execArgv")]
    pub exec_argv: Vec<String>,
    /// Working directory; relative dependency sources resolve against it.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Capture the unit's stdout instead of forwarding it to ours.
    #[serde(default)]
    pub stdout: bool,
    /// Capture the unit's stderr instead of forwarding it to ours.
    #[serde(default)]
    pub stderr: bool,
    #[serde(default, alias = "resourceLimits")]
    pub resource_limits: ResourceLimits,
}

/// Heap and stack limits for the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, alias = "maxOldGenerationSizeMb")]
    pub max_old_generation_size_mb: Option<u64>,
    #[serde(default, alias = "maxYoungGenerationSizeMb")]
    pub max_young_generation_size_mb: Option<u64>,
    #[serde(default, alias = "stackSizeMb")]
    pub stack_size_mb: Option<u64>,
}

impl ResourceLimits {
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }
}

impl SpawnOptions {
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the inherited environment with exactly `vars`.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn capture_output(mut self) -> Self {
        self.stdout = true;
        self.stderr = true;
        self
    }
}
