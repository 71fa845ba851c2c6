//! # Run Configuration
//!
//! The deployment glue of the reference workflow (a hardcoded file list and
//! filesystem path in a `main` driver) is replaced here by explicit,
//! serializable configuration: `SelectionConfig` holds the statistical knobs
//! for one selection run, and `BatchConfig` bundles a list of input panels
//! with an output directory so a whole cohort sweep is a single value that
//! can be loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Statistical settings for a single feature-selection run.
///
/// The defaults reproduce the reference analysis: target column `PE`, a
/// half-open alpha grid `[1e-5, 10)` stepped by 500 (a deliberately
/// preserved, degenerate grid), an importance cutoff of 0.001, an 80/20
/// stratified holdout and 5-fold cross-validation, both seeded with 42.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Name of the column holding the comorbidity outcome.
    pub target_column: String,
    /// Smallest candidate regularization strength.
    pub alpha_min: f64,
    /// Exclusive upper bound of the candidate grid.
    pub alpha_max: f64,
    /// Step between consecutive candidate strengths.
    pub alpha_step: f64,
    /// Features whose absolute coefficient exceeds this value are reported.
    pub importance_threshold: f64,
    /// Fraction of rows held out of training, stratified on the target.
    pub holdout_fraction: f64,
    /// Number of cross-validation folds used to score each candidate alpha.
    pub cv_folds: usize,
    /// Iteration cap for the coordinate-descent solver.
    pub max_iterations: usize,
    /// Seed for the holdout split and the fold shuffle.
    pub seed: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_column: "PE".to_string(),
            alpha_min: 1e-5,
            alpha_max: 10.0,
            alpha_step: 500.0,
            importance_threshold: 0.001,
            holdout_fraction: 0.2,
            cv_folds: 5,
            max_iterations: 10_000,
            seed: 42,
        }
    }
}

impl SelectionConfig {
    /// Rejects settings no run could honor. Grid bounds are validated where
    /// the grid is built, since emptiness depends on all three values at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(ConfigError::InvalidHoldoutFraction(self.holdout_fraction));
        }
        if self.cv_folds < 2 {
            return Err(ConfigError::InvalidFoldCount(self.cv_folds));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterationCap);
        }
        Ok(())
    }
}

/// A full batch sweep: which panels to process and where artifacts land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Input CSV panels, processed sequentially and independently.
    pub inputs: Vec<PathBuf>,
    /// Directory the importance plot and table are written to.
    pub output_dir: PathBuf,
    /// Statistical settings shared by every run in the batch.
    #[serde(default)]
    pub selection: SelectionConfig,
}

impl BatchConfig {
    /// Loads a batch description from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: BatchConfig = toml::from_str(&text)?;
        if config.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        Ok(config)
    }
}

/// Errors raised while assembling or validating a run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the batch configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse the batch configuration as TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("The batch configuration lists no input files.")]
    NoInputs,
    #[error("Holdout fraction must lie strictly between 0 and 1, got {0}.")]
    InvalidHoldoutFraction(f64),
    #[error("Cross-validation needs at least 2 folds, got {0}.")]
    InvalidFoldCount(usize),
    #[error("The solver iteration cap must be at least 1.")]
    InvalidIterationCap,
}
