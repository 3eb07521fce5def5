//! Configuration for a binning run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatorConfig;
use crate::error::{BinningError, Result};
use crate::grid::{GridKind, ALLOWED_ROW_COUNTS};
use crate::period::DataPeriod;
use crate::sample_pointer::MAX_SUPER_SAMPLING;

/// Grid selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid layout family.
    #[serde(default)]
    pub kind: GridKind,

    /// Row count. Total rows for regular and equal-area grids, rows per
    /// hemisphere for reduced Gaussian grids.
    pub rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            kind: GridKind::ReducedGaussian,
            rows: 128,
        }
    }
}

impl GridConfig {
    /// Validate the grid selection without loading any tables.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.kind {
            GridKind::ReducedGaussian => {
                if !ALLOWED_ROW_COUNTS.contains(&self.rows) {
                    return Err(format!(
                        "reduced Gaussian rows must be one of {:?}, got {}",
                        ALLOWED_ROW_COUNTS, self.rows
                    ));
                }
            }
            GridKind::Regular | GridKind::EqualArea => {
                if self.rows < 2 || self.rows % 2 != 0 {
                    return Err(format!("grid rows must be even and >= 2, got {}", self.rows));
                }
            }
        }
        Ok(())
    }
}

/// Configuration for a binning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Target grid.
    pub grid: GridConfig,

    /// Names of the sample planes, in the order passes supply them.
    pub variables: Vec<String>,

    /// Aggregators applied to every bin, in output order.
    pub aggregators: Vec<AggregatorConfig>,

    /// Sub-samples per pixel edge. 1 disables super-sampling.
    pub super_sampling: u32,

    /// Only observations inside this period are binned.
    pub data_period: Option<DataPeriod>,

    /// Bin passes and merge bin shards on the rayon thread pool.
    pub parallel: bool,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            variables: Vec::new(),
            aggregators: Vec::new(),
            super_sampling: 1,
            data_period: None,
            parallel: true,
        }
    }
}

impl BinningConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Apply overrides from environment variables.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BINNING_GRID_KIND") {
            if let Some(kind) = GridKind::from_str(&val) {
                self.grid.kind = kind;
            }
        }

        if let Ok(val) = std::env::var("BINNING_GRID_ROWS") {
            if let Ok(rows) = val.parse() {
                self.grid.rows = rows;
            }
        }

        if let Ok(val) = std::env::var("BINNING_SUPER_SAMPLING") {
            if let Ok(s) = val.parse() {
                self.super_sampling = s;
            }
        }

        if let Ok(val) = std::env::var("BINNING_PARALLEL") {
            self.parallel = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate().map_err(BinningError::Config)?;

        if !(1..=MAX_SUPER_SAMPLING).contains(&self.super_sampling) {
            return Err(BinningError::config(format!(
                "super_sampling must be in 1..={}, got {}",
                MAX_SUPER_SAMPLING, self.super_sampling
            )));
        }

        if self.aggregators.is_empty() {
            return Err(BinningError::config("at least one aggregator is required"));
        }

        for (i, name) in self.variables.iter().enumerate() {
            if self.variables[..i].contains(name) {
                return Err(BinningError::config(format!("duplicate variable '{}'", name)));
            }
        }

        if let Some(period) = &self.data_period {
            period.validate()?;
        }

        Ok(())
    }
}
