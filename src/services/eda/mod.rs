pub mod categories;
pub mod correlation;
pub mod missing;
pub mod profiler;
pub mod quality;
pub mod types;

pub use categories::top_categories;
pub use correlation::correlation_matrix;
pub use missing::missing_table;
pub use profiler::summarize_dataset;
pub use quality::{compute_quality_flags, compute_quality_flags_default};
pub use types::*;

use crate::error::AppError;
use crate::services::dataset::Dataset;

/// Runs every analysis over `dataset`.
///
/// The four leaf passes only read the dataset and run on the rayon pool;
/// the quality flags are derived from the summary and missing table once
/// they are done.
pub fn analyze(dataset: &Dataset, options: &AnalysisOptions) -> Result<Analysis, AppError> {
    let start = std::time::Instant::now();
    tracing::info!(
        "Starting analysis of {} rows x {} columns",
        dataset.row_count(),
        dataset.column_count()
    );

    let ((summary, missing), (correlation, categories)) = rayon::join(
        || {
            rayon::join(
                || summarize_dataset(dataset, options.example_values),
                || missing_table(dataset),
            )
        },
        || {
            rayon::join(
                || correlation_matrix(dataset),
                || top_categories(dataset, options.max_category_columns, options.top_k),
            )
        },
    );
    let summary = summary?;
    let correlation = correlation?;
    let categories = categories?;

    let quality = compute_quality_flags(&summary, &missing, &options.thresholds);

    tracing::info!(
        "Analysis completed in {:?}: quality score {:.2}, {} numeric column(s) correlated, {} category table(s)",
        start.elapsed(),
        quality.quality_score,
        correlation.columns.len(),
        categories.len()
    );

    Ok(Analysis {
        summary,
        missing,
        correlation,
        categories,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn analyze_bundles_every_output() {
        let df = df!(
            "age" => &[Some(10i64), Some(20), Some(30), None],
            "height" => &[140i64, 150, 160, 170],
            "city" => &[Some("A"), Some("B"), Some("A"), None],
        )
        .unwrap();
        let options = AnalysisOptions {
            top_k: 2,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&df.into(), &options).unwrap();

        assert_eq!(analysis.summary.row_count, 4);
        assert_eq!(analysis.missing.len(), 3);
        assert_eq!(analysis.correlation.columns, vec!["age", "height"]);
        assert_eq!(analysis.categories.get("city").unwrap().rows.len(), 2);
        assert!(analysis.quality.too_few_rows);
    }

    #[test]
    fn analysis_serializes_to_json() {
        let df = df!("v" => &[Some(1.0f64), None]).unwrap();
        let analysis = analyze(&df.into(), &AnalysisOptions::default()).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();

        assert_eq!(json["summary"]["columns"][0]["std"]["absent"], "single_sample");
        assert_eq!(json["summary"]["columns"][0]["mean"]["present"], 1.0);
        assert_eq!(json["missing"][0]["missing_share"], 0.5);
        assert!(json["categories"].as_array().unwrap().is_empty());
    }
}
