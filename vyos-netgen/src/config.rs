use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use vyos_config_core::DuplicatePolicy;

/// Generator settings read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub templates_dir: Option<PathBuf>,
    pub strict_paths: bool,
    pub firewall: CounterSettings,
    pub nat: NatSettings,
}

/// Start and step of a rule number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CounterSettings {
    pub rule_start: u32,
    pub rule_step: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NatSettings {
    pub rule_start: u32,
    pub rule_step: u32,
    pub inbound_interface: String,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            rule_start: 1000,
            rule_step: 10,
        }
    }
}

impl Default for NatSettings {
    fn default() -> Self {
        Self {
            rule_start: 100,
            rule_step: 10,
            inbound_interface: "eth0".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.strict_paths {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::Warn
        }
    }

    pub fn nat_counter(&self) -> CounterSettings {
        CounterSettings {
            rule_start: self.nat.rule_start,
            rule_step: self.nat.rule_step,
        }
    }
}

/// Errors returned when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load a configuration file. Keys it omits keep their defaults, and a
/// relative `templates_dir` is resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut config = parse_config(&raw, path.display().to_string())?;
    if let (Some(dir), Some(base)) = (config.templates_dir.as_mut(), path.parent()) {
        if dir.is_relative() {
            *dir = base.join(&*dir);
        }
    }
    Ok(config)
}

/// Built-in configuration.
pub fn default_config() -> GeneratorConfig {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
    parse_config(embedded, "embedded config".to_string()).unwrap_or_default()
}

/// Load `path` when given, otherwise the embedded defaults. Returns the
/// configuration and a label naming where it came from.
pub fn resolve_config(path: Option<&Path>) -> Result<(GeneratorConfig, String), ConfigLoadError> {
    match path {
        Some(path) => Ok((load_config(path)?, format!("file:{}", path.display()))),
        None => Ok((default_config(), "embedded".to_string())),
    }
}

fn parse_config(raw: &str, path: String) -> Result<GeneratorConfig, ConfigLoadError> {
    toml::from_str(raw).map_err(|source| ConfigLoadError::Parse { path, source })
}
