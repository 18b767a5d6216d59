use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerSection,
    pub persistence: PersistenceSection,
    pub disk: DiskSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerSection {
    pub sample_interval_secs: u64,
    pub save_interval_secs: u64,
    /// When set, the buffer evicts its oldest observation once this many are
    /// held. Unset means the log grows for the lifetime of the process.
    pub max_samples: Option<usize>,
}

impl Default for SamplerSection {
    fn default() -> Self {
        SamplerSection {
            sample_interval_secs: 1,
            save_interval_secs: 10,
            max_samples: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    pub path: PathBuf,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        PersistenceSection {
            path: PathBuf::from("monitor.csv"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiskSection {
    /// Filesystem path whose containing mount is measured for disk usage.
    pub path: PathBuf,
}

impl Default for DiskSection {
    fn default() -> Self {
        DiskSection {
            path: PathBuf::from("/"),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("resmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
