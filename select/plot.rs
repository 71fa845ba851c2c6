//! # Importance Bar Chart
//!
//! Renders one vertical bar per feature, in original column order, with
//! rotated x-axis labels so dense SNP panels stay legible. The chart always
//! shows every feature, unfiltered; the threshold only affects the CSV
//! table.

use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 600;

/// Errors raised while rendering the chart.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to render the importance chart: {0}")]
    Render(String),
    #[error(
        "Feature count ({features}) does not match importance count ({importances})."
    )]
    NameMismatch { features: usize, importances: usize },
    #[error("Cannot plot an empty feature set.")]
    NoFeatures,
}

/// Draws the per-feature importance bar chart to `path` as a PNG.
pub fn plot_feature_importance(
    path: &Path,
    title: &str,
    feature_names: &[String],
    importances: &[f64],
) -> Result<(), PlotError> {
    if feature_names.len() != importances.len() {
        return Err(PlotError::NameMismatch {
            features: feature_names.len(),
            importances: importances.len(),
        });
    }
    if feature_names.is_empty() {
        return Err(PlotError::NoFeatures);
    }

    let max_importance = importances.iter().copied().fold(0.0f64, f64::max);
    // Headroom above the tallest bar; an all-zero fit still gets an axis.
    let y_max = if max_importance > 0.0 {
        max_importance * 1.05
    } else {
        1.0
    };

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(120)
        .y_label_area_size(60)
        .build_cartesian_2d((0..feature_names.len()).into_segmented(), 0.0..y_max)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Features")
        .y_desc("Importance")
        .x_labels(feature_names.len())
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_label_formatter(&|segment| match segment {
            SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => feature_names
                .get(*index)
                .cloned()
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(2)
                .data(
                    importances
                        .iter()
                        .enumerate()
                        .map(|(index, &value)| (index, value)),
                ),
        )
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}

fn render_error(error: impl std::fmt::Display) -> PlotError {
    PlotError::Render(error.to_string())
}
