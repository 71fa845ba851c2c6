//! # Feature Importance Ranking and Table Output
//!
//! Importance is the absolute value of a fitted coefficient. The reported
//! table keeps only features strictly above the caller's threshold, sorted
//! descending; ties keep their original column order (the sort is stable).
//! The table is written as a two-column `Feature,Importance` CSV with no
//! index column.

use itertools::Itertools;
use ndarray::ArrayView1;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;

/// One reported feature with its importance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
}

/// Errors raised while ranking or persisting the importance table.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write the importance table: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error while writing the importance table: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "Coefficient count ({coefficients}) does not match feature-name count ({names})."
    )]
    NameMismatch { coefficients: usize, names: usize },
}

/// Absolute coefficient magnitudes in original column order, unfiltered.
/// This is the series the bar chart plots.
pub fn importance_magnitudes(coefficients: ArrayView1<f64>) -> Vec<f64> {
    coefficients.iter().map(|c| c.abs()).collect()
}

/// Pairs every coefficient with its feature name, filters to importances
/// strictly above `threshold` and sorts descending (stable on ties).
pub fn rank_features(
    feature_names: &[String],
    coefficients: ArrayView1<f64>,
    threshold: f64,
) -> Result<Vec<FeatureImportance>, ReportError> {
    if coefficients.len() != feature_names.len() {
        return Err(ReportError::NameMismatch {
            coefficients: coefficients.len(),
            names: feature_names.len(),
        });
    }

    let ranked = feature_names
        .iter()
        .zip(coefficients.iter())
        .map(|(name, coefficient)| FeatureImportance {
            feature: name.clone(),
            importance: coefficient.abs(),
        })
        .filter(|entry| entry.importance > threshold)
        .sorted_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
        })
        .collect();
    Ok(ranked)
}

/// Writes the ranked table as `Feature,Importance` CSV. An empty ranking
/// still produces the header row.
pub fn write_importance_csv(
    path: &Path,
    entries: &[FeatureImportance],
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    if entries.is_empty() {
        writer.write_record(["Feature", "Importance"])?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::fs;
    use tempfile::tempdir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_magnitudes_preserve_column_order() {
        let coefficients = array![-0.5, 0.0, 0.25];
        assert_eq!(
            importance_magnitudes(coefficients.view()),
            vec![0.5, 0.0, 0.25]
        );
    }

    #[test]
    fn test_rank_filters_strictly_above_threshold() {
        let feature_names = names(&["snp1", "snp2", "snp3", "snp4"]);
        let coefficients = array![0.001, -0.5, 0.0005, 0.25];

        let ranked =
            rank_features(&feature_names, coefficients.view(), 0.001).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].feature, "snp2");
        assert_abs_diff_eq!(ranked[0].importance, 0.5, epsilon = 1e-12);
        assert_eq!(ranked[1].feature, "snp4");
        // A value exactly at the threshold is excluded.
        assert!(ranked.iter().all(|entry| entry.feature != "snp1"));
    }

    #[test]
    fn test_zero_threshold_keeps_positive_and_drops_exact_zeros() {
        let feature_names = names(&["snp1", "snp2", "snp3"]);
        let coefficients = array![0.0, 1e-9, -0.2];

        let ranked = rank_features(&feature_names, coefficients.view(), 0.0).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].feature, "snp3");
        assert_eq!(ranked[1].feature, "snp2");
    }

    #[test]
    fn test_rank_is_descending_with_stable_ties() {
        let feature_names = names(&["snp1", "snp2", "snp3", "snp4"]);
        let coefficients = array![0.3, -0.7, 0.3, 0.9];

        let ranked = rank_features(&feature_names, coefficients.view(), 0.0).unwrap();
        let order: Vec<&str> = ranked
            .iter()
            .map(|entry| entry.feature.as_str())
            .collect();
        // snp1 and snp3 tie at 0.3 and keep their original column order.
        assert_eq!(order, vec!["snp4", "snp2", "snp1", "snp3"]);
        for window in ranked.windows(2) {
            assert!(window[0].importance >= window[1].importance);
        }
    }

    #[test]
    fn test_rank_rejects_mismatched_lengths() {
        let feature_names = names(&["snp1", "snp2"]);
        let coefficients = array![0.1, 0.2, 0.3];
        assert!(matches!(
            rank_features(&feature_names, coefficients.view(), 0.0),
            Err(ReportError::NameMismatch {
                coefficients: 3,
                names: 2
            })
        ));
    }

    #[test]
    fn test_csv_output_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panel_feature_importance.csv");
        let entries = vec![
            FeatureImportance {
                feature: "snp2".to_string(),
                importance: 0.5,
            },
            FeatureImportance {
                feature: "snp1".to_string(),
                importance: 0.25,
            },
        ];

        write_importance_csv(&path, &entries).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Feature,Importance\nsnp2,0.5\nsnp1,0.25\n");
    }

    #[test]
    fn test_empty_table_still_gets_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_feature_importance.csv");

        write_importance_csv(&path, &[]).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Feature,Importance\n");
    }
}
