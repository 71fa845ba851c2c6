//! # Panel Loading and Validation Module
//!
//! This module is the exclusive entry point for user-provided SNP panels.
//! It reads a comma-separated table (header row naming the columns, rows
//! holding per-sample genotype dosages plus one outcome column), resolves
//! the target column, and converts everything into the `ndarray` structures
//! consumed by the statistical core.
//!
//! - Missing genotype policy: an absent or unparsable cell means the effect
//!   allele was not observed, so missing values impute to 0.0 rather than
//!   erroring out. A column that holds no numeric data at all is still a
//!   user-input error.
//! - Target fallback: when the requested outcome column is not present, the
//!   last column of the table is substituted. The substitution is recorded
//!   on the returned data and logged, never silent.

use ndarray::{Array1, Array2, ShapeBuilder};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// How the outcome column was chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
    /// The column name the caller asked for.
    pub requested: String,
    /// The column actually used as the outcome.
    pub resolved: String,
    /// Whether the last-column fallback fired.
    pub fell_back: bool,
}

/// A validated panel ready for model selection.
#[derive(Debug)]
pub struct SelectionData {
    /// Genotype dosages, shape `[n_samples, n_features]`, missing cells
    /// already imputed to zero.
    pub x: Array2<f64>,
    /// The outcome vector, position-aligned with the rows of `x`.
    pub y: Array1<f64>,
    /// Feature names in original column order (the target is excluded).
    pub feature_names: Vec<String>,
    /// The outcome column that was used, and whether it was a fallback.
    pub target: TargetResolution,
}

/// A comprehensive error type for all panel loading failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    Polars(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("The input file '{0}' was not found or is not a regular file.")]
    InputNotFound(String),
    #[error(
        "The column '{column_name}' holds no numeric data and cannot be used. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        found_type: String,
    },
    #[error(
        "Infinite values were found in column '{0}'. Genotype and outcome data must be finite."
    )]
    InfiniteValuesFound(String),
    #[error(
        "The input file has {found} column(s); at least two (one feature and the target) are required."
    )]
    TooFewColumns { found: usize },
    #[error("The input file contains a header but no data rows.")]
    EmptyTable,
}

/// Loads and validates one panel, resolving the target column.
pub fn load_selection_data(
    path: &Path,
    target_column: &str,
) -> Result<SelectionData, DataError> {
    internal::load(path, target_column)
}

/// Internal module for the loading and conversion logic.
mod internal {
    use super::*;

    pub(super) fn load(path: &Path, target_column: &str) -> Result<SelectionData, DataError> {
        if !path.is_file() {
            return Err(DataError::InputNotFound(path.display().to_string()));
        }

        log::info!("Loading panel from '{}'", path.display());

        let df = CsvReader::new(File::open(path)?)
            .with_options(CsvReadOptions::default().with_has_header(true))
            .finish()?;

        let column_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        if column_names.len() < 2 {
            return Err(DataError::TooFewColumns {
                found: column_names.len(),
            });
        }
        if df.height() == 0 {
            return Err(DataError::EmptyTable);
        }
        log::debug!(
            "Panel shape: {} rows x {} columns",
            df.height(),
            column_names.len()
        );

        let target = resolve_target(&column_names, target_column);
        if target.fell_back {
            log::warn!(
                "Target column '{}' not found; falling back to last column '{}'.",
                target.requested,
                target.resolved
            );
        }

        let feature_names: Vec<String> = column_names
            .iter()
            .filter(|name| **name != target.resolved)
            .cloned()
            .collect();

        let y = Array1::from_vec(extract_numeric_column(&df, &target.resolved)?);

        let n_rows = df.height();
        let n_features = feature_names.len();
        let mut buffer = Vec::with_capacity(n_rows * n_features);
        for name in &feature_names {
            let mut column = extract_numeric_column(&df, name)?;
            buffer.append(&mut column);
        }
        let x = Array2::from_shape_vec((n_rows, n_features).f(), buffer)
            .expect("feature columns all share the table's row count");

        Ok(SelectionData {
            x,
            y,
            feature_names,
            target,
        })
    }

    /// Picks the outcome column: the requested name when present, otherwise
    /// the last column of the table.
    pub(super) fn resolve_target(columns: &[String], requested: &str) -> TargetResolution {
        match columns.iter().find(|c| c.as_str() == requested) {
            Some(found) => TargetResolution {
                requested: requested.to_string(),
                resolved: found.clone(),
                fell_back: false,
            },
            None => TargetResolution {
                requested: requested.to_string(),
                // The caller has already verified the table is non-empty.
                resolved: columns
                    .last()
                    .expect("column list is non-empty")
                    .clone(),
                fell_back: true,
            },
        }
    }

    /// Extracts one column as `f64`, imputing missing and unparsable cells
    /// to zero. NaN means "no effect allele observed"; infinity is a data
    /// defect and rejected outright.
    pub(super) fn extract_numeric_column(
        df: &DataFrame,
        column_name: &str,
    ) -> Result<Vec<f64>, DataError> {
        let series = df.column(column_name)?;

        let casted = match series.cast(&DataType::Float64) {
            Ok(casted) => casted,
            Err(_) => {
                return Err(DataError::ColumnWrongType {
                    column_name: column_name.to_string(),
                    found_type: format!("{:?}", series.dtype()),
                });
            }
        };

        // A text column where every cell failed the cast carries no signal;
        // distinguish that from a column that was simply all-missing.
        if casted.null_count() == casted.len() && series.null_count() < series.len() {
            return Err(DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                found_type: format!("{:?}", series.dtype()),
            });
        }

        let chunked = casted.f64()?.rechunk();
        let mut imputed = 0usize;
        let mut values = Vec::with_capacity(chunked.len());
        for cell in chunked.into_iter() {
            match cell {
                Some(value) if value.is_nan() => {
                    imputed += 1;
                    values.push(0.0);
                }
                Some(value) if value.is_infinite() => {
                    return Err(DataError::InfiniteValuesFound(column_name.to_string()));
                }
                Some(value) => values.push(value),
                None => {
                    imputed += 1;
                    values.push(0.0);
                }
            }
        }
        if imputed > 0 {
            log::debug!("Imputed {imputed} missing value(s) in column '{column_name}' to 0.");
        }
        Ok(values)
    }
}
