use std::path::Path;

use anyhow::Context;
use canopy_compare::MaskSyntax;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "canopy.toml";

/// Settings read from `canopy.toml`. Command-line flags take precedence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Marker strings used when reading mask documents.
    pub syntax: MaskSyntax,
    /// Default output format.
    pub output: OutputFormat,
    /// Whether to color text output.
    pub color: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            syntax: MaskSyntax::default(),
            output: OutputFormat::Text,
            color: true,
        }
    }
}

impl CliConfig {
    /// Load `explicit` if given, else `canopy.toml` if it exists, else the
    /// defaults. An explicit path that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
