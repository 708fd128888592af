use super::types::*;

const FEW_ROWS_PENALTY: f64 = 0.2;
const MANY_COLUMNS_PENALTY: f64 = 0.1;
const CONSTANT_PENALTY: f64 = 0.1;
const HIGH_CARDINALITY_PENALTY: f64 = 0.1;
const LOW_VARIANCE_PENALTY: f64 = 0.05;
const CRITICAL_MISSING_PENALTY: f64 = 0.05;

pub fn compute_quality_flags_default(
    summary: &DatasetSummary,
    missing: &MissingTable,
) -> QualityFlags {
    compute_quality_flags(summary, missing, &QualityThresholds::default())
}

/// Heuristic data-quality flags and a composite score in `[0, 1]`.
///
/// Every rule is evaluated on its own and every penalty applies on its own,
/// so several issues together can drive the score down to zero.
pub fn compute_quality_flags(
    summary: &DatasetSummary,
    missing: &MissingTable,
    thresholds: &QualityThresholds,
) -> QualityFlags {
    let too_few_rows = summary.row_count < thresholds.min_rows;
    let too_many_columns = summary.column_count > thresholds.max_columns;

    let max_missing_share = missing.max_share().unwrap_or(0.0);
    let too_many_missing = max_missing_share > thresholds.max_missing_share;

    let constant_columns = names_where(summary, |c| c.unique == 1);
    let high_cardinality_columns = names_where(summary, |c| {
        c.kind == ColumnKind::Text && c.unique > thresholds.high_cardinality
    });
    let low_variance_columns = names_where(summary, |c| {
        c.is_numeric && c.std.value().is_some_and(|std| std < thresholds.low_variance)
    });
    let critical_missing_columns = names_where(summary, |c| {
        c.missing_share > thresholds.critical_missing_share
    });

    let has_constant_columns = !constant_columns.is_empty();
    let has_high_cardinality_categoricals = !high_cardinality_columns.is_empty();
    let has_low_variance_columns = !low_variance_columns.is_empty();
    let has_critical_missing_columns = !critical_missing_columns.is_empty();

    let penalties = [
        (too_few_rows, FEW_ROWS_PENALTY),
        (too_many_columns, MANY_COLUMNS_PENALTY),
        (has_constant_columns, CONSTANT_PENALTY),
        (has_high_cardinality_categoricals, HIGH_CARDINALITY_PENALTY),
        (has_low_variance_columns, LOW_VARIANCE_PENALTY),
        (has_critical_missing_columns, CRITICAL_MISSING_PENALTY),
    ];
    let score = penalties
        .iter()
        .filter(|(applies, _)| *applies)
        .fold(1.0 - max_missing_share, |score, (_, penalty)| score - penalty);

    QualityFlags {
        too_few_rows,
        too_many_columns,
        max_missing_share,
        too_many_missing,
        has_constant_columns,
        constant_columns,
        has_high_cardinality_categoricals,
        high_cardinality_columns,
        has_low_variance_columns,
        low_variance_columns,
        has_critical_missing_columns,
        critical_missing_columns,
        quality_score: score.clamp(0.0, 1.0),
    }
}

fn names_where(summary: &DatasetSummary, pred: impl Fn(&ColumnSummary) -> bool) -> Vec<String> {
    summary
        .columns
        .iter()
        .filter(|c| pred(*c))
        .map(|c| c.name.clone())
        .collect()
}
