//! Read-only dataset snapshot shared by every analysis pass.

use polars::prelude::*;

use crate::error::AppError;
use crate::services::eda::types::ColumnKind;

/// One loaded table. Analyses only ever borrow it, so the four leaf passes
/// can run side by side over the same frame.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn columns(&self) -> impl Iterator<Item = ColumnView<'_>> {
        self.frame.get_columns().iter().map(ColumnView::new)
    }
}

impl From<DataFrame> for Dataset {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

/// Borrowed view of a single column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    series: &'a Series,
}

impl<'a> ColumnView<'a> {
    fn new(series: &'a Series) -> Self {
        Self { series }
    }

    pub fn name(&self) -> &'a str {
        self.series.name()
    }

    /// Declared dtype as polars prints it, e.g. `i64`, `f64`, `str`.
    pub fn dtype_tag(&self) -> String {
        self.series.dtype().to_string()
    }

    pub fn kind(&self) -> ColumnKind {
        classify(self.series.dtype())
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn null_count(&self) -> usize {
        self.series.null_count()
    }

    /// Float NaN cells. Other dtypes cannot hold NaN.
    pub fn nan_count(&self) -> usize {
        self.nan_mask()
            .map_or(0, |mask| mask.iter().filter(|is_nan| **is_nan).count())
    }

    /// Nulls plus NaNs: both mean "no value" to every analysis.
    pub fn missing_count(&self) -> usize {
        self.null_count() + self.nan_count()
    }

    pub fn non_null_count(&self) -> usize {
        self.series.len() - self.missing_count()
    }

    /// Cells rendered as text; `None` marks a missing cell.
    pub fn text_values(&self) -> Result<Vec<Option<String>>, AppError> {
        let casted = self.series.cast(&DataType::String)?;
        let mut values: Vec<Option<String>> = casted
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        if let Some(mask) = self.nan_mask() {
            for (value, is_nan) in values.iter_mut().zip(mask) {
                if is_nan {
                    *value = None;
                }
            }
        }
        Ok(values)
    }

    /// Cells as `f64`, or `None` for non-numeric columns. NaN comes back as a
    /// missing cell.
    pub fn numeric_values(&self) -> Result<Option<Vec<Option<f64>>>, AppError> {
        if !self.is_numeric() {
            return Ok(None);
        }
        let casted = self.series.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(Some(values))
    }

    fn nan_mask(&self) -> Option<Vec<bool>> {
        match self.series.dtype() {
            DataType::Float32 => self
                .series
                .f32()
                .ok()
                .map(|ca| ca.into_iter().map(|v| v.is_some_and(f32::is_nan)).collect()),
            DataType::Float64 => self
                .series
                .f64()
                .ok()
                .map(|ca| ca.into_iter().map(|v| v.is_some_and(f64::is_nan)).collect()),
            _ => None,
        }
    }
}

pub fn classify(dtype: &DataType) -> ColumnKind {
    match dtype {
        DataType::String | DataType::Categorical(..) => ColumnKind::Text,
        dt if dt.is_numeric() => ColumnKind::Numeric,
        _ => ColumnKind::Other,
    }
}
