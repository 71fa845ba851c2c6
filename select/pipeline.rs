//! # The Selection Pipeline
//!
//! One panel flows through a straight line: load, stratified holdout split,
//! cross-validated grid search on the training subset, final refit, rank,
//! emit. `run_selection` executes that line for a single file;
//! `run_batch` drives it over a whole cohort, isolating each file's
//! failures so one broken panel never blocks the rest of the sweep.

use crate::config::{BatchConfig, ConfigError, SelectionConfig};
use crate::data::{self, DataError};
use crate::lasso::{Lasso, LassoError};
use crate::plot::{self, PlotError};
use crate::report::{self, FeatureImportance, ReportError};
use crate::search::{self, SearchError};
use crate::split::{self, KFold, SplitError};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can end a single panel's run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Lasso(#[from] LassoError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },
    #[error("Input path '{0}' has no usable file name.")]
    BadInputName(String),
}

/// Summary of one completed selection run.
#[derive(Debug)]
pub struct SelectionReport {
    pub input: PathBuf,
    /// The outcome column actually used.
    pub resolved_target: String,
    /// Whether the last-column fallback fired for the target.
    pub target_fell_back: bool,
    /// Rows reserved by the stratified holdout, untouched by training.
    pub holdout_rows: usize,
    pub best_alpha: f64,
    pub best_cv_score: f64,
    /// Whether the final refit converged within the iteration cap.
    pub converged: bool,
    pub important_features: Vec<FeatureImportance>,
    pub plot_path: PathBuf,
    pub table_path: PathBuf,
}

/// Runs the full selection procedure for one input panel, writing the
/// importance chart and table into `output_dir`.
pub fn run_selection(
    input: &Path,
    output_dir: &Path,
    config: &SelectionConfig,
) -> Result<SelectionReport, PipelineError> {
    config.validate()?;

    let basename = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| PipelineError::BadInputName(input.display().to_string()))?;

    std::fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
        path: output_dir.display().to_string(),
        source,
    })?;

    let dataset = data::load_selection_data(input, &config.target_column)?;
    log::info!(
        "Loaded {} samples x {} features (target '{}').",
        dataset.x.nrows(),
        dataset.x.ncols(),
        dataset.target.resolved
    );

    let holdout = split::stratified_split(dataset.y.view(), config.holdout_fraction, config.seed)?;
    let (x_train, y_train) =
        split::take_rows(dataset.x.view(), dataset.y.view(), &holdout.train_indices);

    let grid = search::alpha_grid(config.alpha_min, config.alpha_max, config.alpha_step)?;
    let folds = KFold::new(config.cv_folds, config.seed);
    let search_result = search::grid_search_alpha(
        x_train.view(),
        y_train.view(),
        &grid,
        &folds,
        config.max_iterations,
    )?;
    log::info!("Best alpha: {}", search_result.best_alpha);

    // Final model: best alpha, refit on the full training subset. The
    // holdout stays untouched.
    let final_fit = Lasso::new(search_result.best_alpha)
        .with_max_iterations(config.max_iterations)
        .fit(x_train.view(), y_train.view())?;

    let magnitudes = report::importance_magnitudes(final_fit.coefficients.view());
    let important_features = report::rank_features(
        &dataset.feature_names,
        final_fit.coefficients.view(),
        config.importance_threshold,
    )?;

    let plot_path = output_dir.join(format!("{basename}_feature_importance.png"));
    let table_path = output_dir.join(format!("{basename}_feature_importance.csv"));

    let title = format!("Lasso Feature Importance – {basename}");
    plot::plot_feature_importance(&plot_path, &title, &dataset.feature_names, &magnitudes)?;
    log::info!("Plot saved: {}", plot_path.display());

    report::write_importance_csv(&table_path, &important_features)?;
    log::info!("Table saved: {}", table_path.display());

    Ok(SelectionReport {
        input: input.to_path_buf(),
        resolved_target: dataset.target.resolved,
        target_fell_back: dataset.target.fell_back,
        holdout_rows: holdout.test_indices.len(),
        best_alpha: search_result.best_alpha,
        best_cv_score: search_result.best_score,
        converged: final_fit.converged,
        important_features,
        plot_path,
        table_path,
    })
}

/// Outcome of a batch sweep: which panels succeeded and which failed.
#[derive(Debug)]
pub struct BatchOutcome {
    pub succeeded: Vec<SelectionReport>,
    pub failed: Vec<(PathBuf, PipelineError)>,
}

/// Processes every input panel sequentially. Each file's run is fully
/// independent: a fatal error is recorded against that file and the sweep
/// moves on.
pub fn run_batch(config: &BatchConfig) -> BatchOutcome {
    let progress = ProgressBar::new(config.inputs.len() as u64);
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for input in &config.inputs {
        match run_selection(input, &config.output_dir, &config.selection) {
            Ok(report) => succeeded.push(report),
            Err(error) => {
                log::error!("Selection failed for '{}': {error}", input.display());
                failed.push((input.clone(), error));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    BatchOutcome { succeeded, failed }
}
