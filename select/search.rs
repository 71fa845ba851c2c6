//! # Hyperparameter Grid Search
//!
//! Builds the candidate alpha grid as a half-open arange over
//! `[alpha_min, alpha_max)` and scores every candidate by k-fold
//! cross-validated mean R^2 on the training subset. Candidates are
//! evaluated in parallel with rayon; the call still blocks until the whole
//! search completes and exposes no concurrency to the caller.
//!
//! The reference analysis steps a tiny range by 500, which collapses the
//! grid to a single candidate. That configuration is preserved verbatim:
//! suspiciously small grids are logged, never repaired.

use crate::lasso::{Lasso, LassoError};
use crate::split::{KFold, SplitError, take_rows};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use thiserror::Error;

/// Errors raised while building or searching the grid.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Grid step must be positive, got {0}.")]
    NonPositiveStep(f64),
    #[error(
        "The hyperparameter grid is empty: no candidates in [{alpha_min}, {alpha_max}) at step {alpha_step}."
    )]
    EmptyGrid {
        alpha_min: f64,
        alpha_max: f64,
        alpha_step: f64,
    },
    #[error("Grid search was invoked with no candidate alphas.")]
    NoCandidates,
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Lasso(#[from] LassoError),
}

/// Enumerates `alpha_min + k * alpha_step` for `k = 0, 1, ...` while the
/// value stays strictly below `alpha_max`.
pub fn alpha_grid(
    alpha_min: f64,
    alpha_max: f64,
    alpha_step: f64,
) -> Result<Vec<f64>, SearchError> {
    if alpha_step <= 0.0 {
        return Err(SearchError::NonPositiveStep(alpha_step));
    }

    let mut grid = Vec::new();
    let mut index = 0usize;
    loop {
        let value = alpha_min + alpha_step * index as f64;
        if value >= alpha_max {
            break;
        }
        grid.push(value);
        index += 1;
    }

    if grid.is_empty() {
        return Err(SearchError::EmptyGrid {
            alpha_min,
            alpha_max,
            alpha_step,
        });
    }
    if grid.len() < 3 {
        log::warn!(
            "Alpha grid over [{alpha_min}, {alpha_max}) at step {alpha_step} holds only {} candidate(s); the step may be misconfigured.",
            grid.len()
        );
    }
    Ok(grid)
}

/// Outcome of a cross-validated grid search.
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// The first candidate attaining the best mean score.
    pub best_alpha: f64,
    /// Mean cross-validation R^2 of the best candidate.
    pub best_score: f64,
    /// All candidates, in grid order.
    pub alphas: Vec<f64>,
    /// Mean cross-validation R^2 per candidate, aligned with `alphas`.
    pub mean_scores: Vec<f64>,
}

/// Scores every candidate alpha by mean R^2 across the folds and picks the
/// best one. Ties resolve to the first candidate encountered in grid order.
pub fn grid_search_alpha(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    grid: &[f64],
    folds: &KFold,
    max_iterations: usize,
) -> Result<GridSearchResult, SearchError> {
    if grid.is_empty() {
        return Err(SearchError::NoCandidates);
    }
    let splits = folds.split(x.nrows())?;

    // Materialize each fold once; every candidate shares the same views.
    type FoldData = (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>);
    let fold_data: Vec<FoldData> = splits
        .iter()
        .map(|(train, validation)| {
            let (x_train, y_train) = take_rows(x, y, train);
            let (x_validation, y_validation) = take_rows(x, y, validation);
            (x_train, y_train, x_validation, y_validation)
        })
        .collect();

    let mean_scores: Vec<f64> = grid
        .par_iter()
        .map(|&alpha| -> Result<f64, SearchError> {
            let model = Lasso::new(alpha).with_max_iterations(max_iterations);
            let mut total = 0.0;
            for (x_train, y_train, x_validation, y_validation) in &fold_data {
                let fit = model.fit(x_train.view(), y_train.view())?;
                total += fit.score(x_validation.view(), y_validation.view());
            }
            Ok(total / fold_data.len() as f64)
        })
        .collect::<Result<Vec<f64>, SearchError>>()?;

    let mut best_index = 0;
    for (index, score) in mean_scores.iter().enumerate() {
        if *score > mean_scores[best_index] {
            best_index = index;
        }
    }

    log::info!(
        "Grid search over {} candidate(s): best alpha {} (mean CV R^2 {:.6}).",
        grid.len(),
        grid[best_index],
        mean_scores[best_index]
    );

    Ok(GridSearchResult {
        best_alpha: grid[best_index],
        best_score: mean_scores[best_index],
        alphas: grid.to_vec(),
        mean_scores,
    })
}
