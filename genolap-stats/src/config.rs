use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{GenolapStatsError, Result};
use crate::records::StatColumn;
use genolap_overlaprs::MAX_REFERENCE_SETS;

/// Parameters of one overlap statistics run.
///
/// # Example
/// ```toml
/// minibatch_count = 10
/// minibatch_size = 200
/// worker_count = 8
/// seed = 42
///
/// [multiple_overlap]
/// enabled = true
/// max_combinations = 5
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub minibatch_count: usize,
    pub minibatch_size: usize,
    /// 0 means one worker per available core.
    pub worker_count: usize,
    pub seed: u64,
    pub use_markov: bool,
    pub sort_by: Option<StatColumn>,
    pub show_progress: bool,
    pub multiple_overlap: MultipleOverlapConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MultipleOverlapConfig {
    pub enabled: bool,
    /// Number of sets in a reported combination, the query included.
    pub target_combi_size: Option<usize>,
    /// Number of combinations kept by MODL.
    pub max_combinations: Option<usize>,
    /// Abundances below this fraction of the largest one are raised to it
    /// before MODL weighting.
    pub modl_min_ratio: f64,
    pub custom_combinations: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            minibatch_count: 10,
            minibatch_size: 20,
            worker_count: 1,
            seed: 42,
            use_markov: false,
            sort_by: None,
            show_progress: true,
            multiple_overlap: MultipleOverlapConfig::default(),
        }
    }
}

impl Default for MultipleOverlapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_combi_size: None,
            max_combinations: None,
            modl_min_ratio: 1e-4,
            custom_combinations: None,
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Total number of shuffles per simulation.
    pub fn shuffle_count(&self) -> usize {
        self.minibatch_count * self.minibatch_size
    }

    ///
    /// Check the parameters against the number of reference sets, before any
    /// simulation starts. Options that are set but have no effect are
    /// reported as warnings.
    ///
    pub fn validate(&self, reference_count: usize) -> Result<()> {
        if self.minibatch_count == 0 || self.minibatch_size == 0 {
            return Err(GenolapStatsError::Config(format!(
                "minibatch count and size must be at least 1 (got {} x {})",
                self.minibatch_count, self.minibatch_size
            )));
        }

        if reference_count == 0 {
            return Err(GenolapStatsError::Config(
                "at least one reference set is required".to_string(),
            ));
        }

        let mo = &self.multiple_overlap;
        if !mo.enabled {
            if mo.custom_combinations.is_some() {
                return Err(GenolapStatsError::Config(
                    "custom combinations require the multiple overlap mode".to_string(),
                ));
            }
            if mo.target_combi_size.is_some() || mo.max_combinations.is_some() {
                warn!(
                    "Combination size and MODL options are ignored outside of the multiple overlap mode"
                );
            }
            return Ok(());
        }

        if reference_count > MAX_REFERENCE_SETS {
            return Err(GenolapStatsError::Config(format!(
                "the multiple overlap mode supports at most {} reference sets, got {}",
                MAX_REFERENCE_SETS, reference_count
            )));
        }

        if mo.custom_combinations.is_some() {
            if mo.target_combi_size.is_some() || mo.max_combinations.is_some() {
                warn!(
                    "Custom combinations were given: combination size and MODL options are ignored"
                );
            }
            return Ok(());
        }

        if let Some(size) = mo.target_combi_size {
            if size < 2 || size > reference_count + 1 {
                return Err(GenolapStatsError::Config(format!(
                    "combination size must be between 2 and {} (query included), got {}",
                    reference_count + 1,
                    size
                )));
            }
        }

        if mo.max_combinations == Some(0) {
            return Err(GenolapStatsError::Config(
                "the number of MODL combinations must be at least 1".to_string(),
            ));
        }

        if !(mo.modl_min_ratio > 0.0 && mo.modl_min_ratio <= 1.0) {
            return Err(GenolapStatsError::Config(format!(
                "MODL minimum ratio must be in (0, 1], got {}",
                mo.modl_min_ratio
            )));
        }

        Ok(())
    }
}
