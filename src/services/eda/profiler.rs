use std::collections::HashSet;

use rayon::prelude::*;
use smallvec::SmallVec;

use super::types::*;
use crate::error::AppError;
use crate::services::dataset::{ColumnView, Dataset};

/// Per-column descriptive statistics, in input column order.
pub fn summarize_dataset(
    dataset: &Dataset,
    example_values: usize,
) -> Result<DatasetSummary, AppError> {
    let row_count = dataset.row_count();
    let views: Vec<ColumnView<'_>> = dataset.columns().collect();

    let columns = views
        .par_iter()
        .map(|view| summarize_column(view, row_count, example_values))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        "Profiled {} columns over {} rows",
        columns.len(),
        row_count
    );

    Ok(DatasetSummary {
        row_count,
        column_count: dataset.column_count(),
        columns,
    })
}

fn summarize_column(
    view: &ColumnView<'_>,
    row_count: usize,
    example_values: usize,
) -> Result<ColumnSummary, AppError> {
    let non_null = view.non_null_count();
    let missing = row_count - non_null;
    let missing_share = if row_count > 0 {
        missing as f64 / row_count as f64
    } else {
        0.0
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut examples = SmallVec::<[String; SAMPLE_SIZE]>::new();
    for value in view.text_values()?.into_iter().flatten() {
        if seen.contains(&value) {
            continue;
        }
        if examples.len() < example_values {
            examples.push(value.clone());
        }
        seen.insert(value);
    }

    let is_numeric = view.is_numeric();
    let (min, max, mean, std) = match view.numeric_values()? {
        Some(values) => numeric_stats(values.into_iter().flatten()),
        None => {
            let absent = Stat::Absent(AbsentReason::NotNumeric);
            (absent, absent, absent, absent)
        }
    };

    Ok(ColumnSummary {
        name: view.name().to_string(),
        dtype: view.dtype_tag(),
        kind: view.kind(),
        non_null,
        missing,
        missing_share,
        unique: seen.len(),
        example_values: examples,
        is_numeric,
        min,
        max,
        mean,
        std,
    })
}

/// min, max, mean and sample standard deviation (ddof = 1).
fn numeric_stats(values: impl Iterator<Item = f64>) -> (Stat, Stat, Stat, Stat) {
    let values: Vec<f64> = values.collect();
    let n = values.len();
    if n == 0 {
        let absent = Stat::Absent(AbsentReason::NoValues);
        return (absent, absent, absent, absent);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / n as f64;

    let std = if n < 2 {
        Stat::Absent(AbsentReason::SingleSample)
    } else {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Stat::Present((sum_sq / (n - 1) as f64).sqrt())
    };

    (Stat::Present(min), Stat::Present(max), Stat::Present(mean), std)
}
