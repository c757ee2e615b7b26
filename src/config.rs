//! Dashboard configuration
//!
//! Values come from CLI flags, then environment variables (a `.env` file is
//! loaded by the binary), then the defaults below. Dataset names resolve
//! against the directory of the running executable unless a data directory
//! is given explicitly.

use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREDICTIONS_FILE: &str = "predictions_2026.csv";
pub const DEFAULT_DRIVERS_FILE: &str = "country_shap_nowcast.csv";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_TOP_DRIVERS: usize = 7;

pub const ENV_DATA_DIR: &str = "STUNTING_DATA_DIR";
pub const ENV_PREDICTIONS_FILE: &str = "STUNTING_PREDICTIONS_FILE";
pub const ENV_DRIVERS_FILE: &str = "STUNTING_DRIVERS_FILE";
pub const ENV_BIND_ADDR: &str = "STUNTING_BIND_ADDR";
pub const ENV_TOP_DRIVERS: &str = "STUNTING_TOP_DRIVERS";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardConfig {
    /// Folder holding both CSV files
    pub data_dir: PathBuf,
    pub predictions_file: String,
    pub drivers_file: String,
    pub bind_addr: String,
    /// How many drivers the detail panel lists
    pub top_drivers: usize,
}

impl DashboardConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            predictions_file: DEFAULT_PREDICTIONS_FILE.to_string(),
            drivers_file: DEFAULT_DRIVERS_FILE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            top_drivers: DEFAULT_TOP_DRIVERS,
        }
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(ENV_DATA_DIR) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => app_dir()?,
        };

        let mut config = Self::new(data_dir);
        if let Some(name) = lookup(ENV_PREDICTIONS_FILE).filter(|v| !v.trim().is_empty()) {
            config.predictions_file = name;
        }
        if let Some(name) = lookup(ENV_DRIVERS_FILE).filter(|v| !v.trim().is_empty()) {
            config.drivers_file = name;
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|v| !v.trim().is_empty()) {
            config.bind_addr = addr;
        }
        if let Some(raw) = lookup(ENV_TOP_DRIVERS) {
            config.top_drivers = parse_top_drivers(&raw)?;
        }
        Ok(config)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.resolve(&self.predictions_file)
    }

    pub fn drivers_path(&self) -> PathBuf {
        self.resolve(&self.drivers_file)
    }

    /// Join a dataset name onto the data directory. Absolute names are kept.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.data_dir.join(candidate)
        }
    }
}

pub fn parse_top_drivers(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DashboardError::Config(format!(
            "{} must be a positive integer, got '{}'",
            ENV_TOP_DRIVERS, raw
        ))),
    }
}

/// Directory of the running executable.
pub fn app_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| DashboardError::Config(format!("executable {} has no parent directory", exe.display())))
}
