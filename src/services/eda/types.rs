use polars::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;

pub const SAMPLE_SIZE: usize = 3;

/// Capability class of a column's declared dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer and float dtypes.
    Numeric,
    /// String and categorical dtypes, i.e. unordered textual values.
    Text,
    /// Everything else (boolean, temporal, nested, all-null).
    Other,
}

/// Why an optional statistic has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    NotNumeric,
    NoValues,
    SingleSample,
}

/// A numeric statistic that may legitimately be undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Present(f64),
    Absent(AbsentReason),
}

impl Stat {
    pub fn value(&self) -> Option<f64> {
        match self {
            Stat::Present(v) => Some(*v),
            Stat::Absent(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub missing: usize,
    pub missing_share: f64,
    pub unique: usize,
    pub example_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub is_numeric: bool,
    pub min: Stat,
    pub max: Stat,
    pub mean: Stat,
    pub std: Stat,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Flattened one-row-per-column view, used for printing and `summary.csv`.
    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        let cols = &self.columns;
        DataFrame::new(vec![
            Series::new("name", cols.iter().map(|c| c.name.clone()).collect::<Vec<_>>()),
            Series::new("dtype", cols.iter().map(|c| c.dtype.clone()).collect::<Vec<_>>()),
            Series::new("non_null", cols.iter().map(|c| c.non_null as u64).collect::<Vec<_>>()),
            Series::new("missing", cols.iter().map(|c| c.missing as u64).collect::<Vec<_>>()),
            Series::new("missing_share", cols.iter().map(|c| c.missing_share).collect::<Vec<_>>()),
            Series::new("unique", cols.iter().map(|c| c.unique as u64).collect::<Vec<_>>()),
            Series::new("is_numeric", cols.iter().map(|c| c.is_numeric).collect::<Vec<_>>()),
            Series::new("min", cols.iter().map(|c| c.min.value()).collect::<Vec<_>>()),
            Series::new("max", cols.iter().map(|c| c.max.value()).collect::<Vec<_>>()),
            Series::new("mean", cols.iter().map(|c| c.mean.value()).collect::<Vec<_>>()),
            Series::new("std", cols.iter().map(|c| c.std.value()).collect::<Vec<_>>()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing_count: usize,
    pub missing_share: f64,
}

/// Missing-value counts sorted by share, highest first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MissingTable {
    pub entries: Vec<MissingEntry>,
}

impl MissingTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, column: &str) -> Option<&MissingEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    pub fn max_share(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.missing_share)
            .fold(None, |acc, share| Some(acc.map_or(share, |m: f64| m.max(share))))
    }

    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        DataFrame::new(vec![
            Series::new("column", self.entries.iter().map(|e| e.column.clone()).collect::<Vec<_>>()),
            Series::new("missing_count", self.entries.iter().map(|e| e.missing_count as u64).collect::<Vec<_>>()),
            Series::new("missing_share", self.entries.iter().map(|e| e.missing_share).collect::<Vec<_>>()),
        ])
    }
}

/// Square Pearson matrix over the numeric columns, in column order.
///
/// `None` marks a coefficient that is undefined for the pair (fewer than two
/// shared rows, or no variance in one of the columns).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        let mut series = Vec::with_capacity(self.columns.len() + 1);
        series.push(Series::new("column", self.columns.clone()));
        for (j, name) in self.columns.iter().enumerate() {
            let col: Vec<Option<f64>> = self.values.iter().map(|row| row[j]).collect();
            series.push(Series::new(name, col));
        }
        DataFrame::new(series)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub value: String,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTable {
    pub column: String,
    pub rows: Vec<CategoryRow>,
}

impl CategoryTable {
    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        DataFrame::new(vec![
            Series::new("value", self.rows.iter().map(|r| r.value.clone()).collect::<Vec<_>>()),
            Series::new("count", self.rows.iter().map(|r| r.count as u64).collect::<Vec<_>>()),
            Series::new("share", self.rows.iter().map(|r| r.share).collect::<Vec<_>>()),
        ])
    }
}

/// Frequency tables keyed by column, in column order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CategoryTables {
    pub tables: Vec<CategoryTable>,
}

impl CategoryTables {
    pub fn get(&self, column: &str) -> Option<&CategoryTable> {
        self.tables.iter().find(|t| t.column == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTable> {
        self.tables.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityThresholds {
    pub min_rows: usize,
    pub max_columns: usize,
    pub max_missing_share: f64,
    pub high_cardinality: usize,
    pub low_variance: f64,
    pub critical_missing_share: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_rows: 100,
            max_columns: 100,
            max_missing_share: 0.5,
            high_cardinality: 50,
            low_variance: 1e-6,
            critical_missing_share: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityFlags {
    pub too_few_rows: bool,
    pub too_many_columns: bool,
    pub max_missing_share: f64,
    pub too_many_missing: bool,
    pub has_constant_columns: bool,
    pub constant_columns: Vec<String>,
    pub has_high_cardinality_categoricals: bool,
    pub high_cardinality_columns: Vec<String>,
    pub has_low_variance_columns: bool,
    pub low_variance_columns: Vec<String>,
    pub has_critical_missing_columns: bool,
    pub critical_missing_columns: Vec<String>,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisOptions {
    pub example_values: usize,
    pub max_category_columns: usize,
    pub top_k: usize,
    pub thresholds: QualityThresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            example_values: SAMPLE_SIZE,
            max_category_columns: 5,
            top_k: 5,
            thresholds: QualityThresholds::default(),
        }
    }
}

/// Everything computed for one dataset in one run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub summary: DatasetSummary,
    pub missing: MissingTable,
    pub correlation: CorrelationMatrix,
    pub categories: CategoryTables,
    pub quality: QualityFlags,
}
