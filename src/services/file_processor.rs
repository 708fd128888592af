use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;
use reqwest::Client;

use crate::error::AppError;
use crate::services::dataset::Dataset;

/// Cell texts read as missing, the usual NA spellings of spreadsheet and
/// dataframe tools. Empty fields are always missing.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Text encodings the CSV reader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Invalid sequences are replaced instead of failing the load.
    LossyUtf8,
}

impl FromStr for Encoding {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "lossy" | "lossy-utf8" | "lossy-utf-8" => Ok(Encoding::LossyUtf8),
            other => Err(AppError::InvalidInput(format!(
                "unsupported encoding '{}', expected utf-8 or lossy-utf8",
                other
            ))),
        }
    }
}

impl From<Encoding> for CsvEncoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Utf8 => CsvEncoding::Utf8,
            Encoding::LossyUtf8 => CsvEncoding::LossyUtf8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub separator: u8,
    pub encoding: Encoding,
    /// Keep only the first rows; `None` loads everything.
    pub max_rows: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            encoding: Encoding::Utf8,
            max_rows: None,
        }
    }
}

impl LoadOptions {
    /// Parses a single-byte separator such as `,`, `;` or `\t`.
    pub fn parse_separator(sep: &str) -> Result<u8, AppError> {
        let sep = if sep == "\\t" { "\t" } else { sep };
        match sep.as_bytes() {
            [b] => Ok(*b),
            _ => Err(AppError::InvalidInput(format!(
                "separator must be a single ASCII character, got '{}'",
                sep
            ))),
        }
    }

    /// Treats 0 as "no limit".
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = (max_rows > 0).then_some(max_rows);
        self
    }
}

/// Loads a dataset from disk. `.xlsx` files read their first worksheet,
/// everything else is parsed as delimited text.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<Dataset, AppError> {
    if !path.exists() {
        return Err(AppError::InvalidInput(format!(
            "file '{}' not found",
            path.display()
        )));
    }

    let start = std::time::Instant::now();
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    let dataset = if is_xlsx {
        let data = std::fs::read(path)?;
        load_xlsx_bytes(Bytes::from(data), options.max_rows)?
    } else {
        let reader = CsvReader::from_path(path).map_err(|e| {
            AppError::InvalidInput(format!("failed to open '{}': {}", path.display(), e))
        })?;
        read_csv(reader, options)?
    };

    tracing::info!(
        "Loaded {} in {:?}: {} rows x {} columns",
        path.display(),
        start.elapsed(),
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

pub fn load_csv_bytes(data: Bytes, options: &LoadOptions) -> Result<Dataset, AppError> {
    read_csv(CsvReader::new(Cursor::new(data)), options)
}

fn read_csv<R: MmapBytesReader>(
    reader: CsvReader<'_, R>,
    options: &LoadOptions,
) -> Result<Dataset, AppError> {
    let df = reader
        .has_header(true)
        .with_separator(options.separator)
        .with_encoding(options.encoding.into())
        .with_n_rows(options.max_rows)
        .with_null_values(Some(NullValues::AllColumns(
            NA_TOKENS.iter().map(|t| t.to_string()).collect(),
        )))
        .finish()
        .map_err(|e| {
            tracing::error!("Failed to read CSV: {}", e);
            AppError::InvalidInput(format!("failed to read CSV: {}", e))
        })?;
    Ok(Dataset::new(df))
}

/// Reads the first worksheet of an XLSX workbook. The first row holds the
/// column names.
pub fn load_xlsx_bytes(data: Bytes, max_rows: Option<usize>) -> Result<Dataset, AppError> {
    let cursor = Cursor::new(data);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::FileProcessingError(format!("Failed to open Excel file: {}", e))
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::FileProcessingError("No sheets found in workbook".to_string()))?;
    tracing::debug!("Reading worksheet {}", sheet_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::FileProcessingError(format!("Failed to read worksheet: {}", e)))?;
    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();

    let mut existing_names = HashSet::new();
    let headers = rows
        .first()
        .map(|row| {
            row.iter()
                .map(|cell| clean_column_name(&cell.to_string(), &mut existing_names))
                .collect::<Vec<_>>()
        })
        .ok_or_else(|| AppError::FileProcessingError(format!("Sheet {} is empty", sheet_name)))?;

    let limit = max_rows.unwrap_or(usize::MAX);
    let body: Vec<&[Data]> = rows.iter().skip(1).take(limit).map(Vec::as_slice).collect();
    create_dataframe(&body, &headers).map(Dataset::new)
}

fn create_dataframe(rows: &[&[Data]], headers: &[String]) -> Result<DataFrame, AppError> {
    let mut columns = Vec::with_capacity(headers.len());
    let empty = Data::Empty;

    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<&Data> = rows
            .iter()
            .map(|row| row.get(col_idx).unwrap_or(&empty))
            .collect();

        let series = match detect_column_type(&values) {
            CellType::Numeric => {
                let nums: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Float(f) => Some(*f),
                        Data::Int(i) => Some(*i as f64),
                        _ => None,
                    })
                    .collect();
                Series::new(header, nums)
            }
            CellType::Boolean => {
                let flags: Vec<Option<bool>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Series::new(header, flags)
            }
            CellType::Text => {
                let strings: Vec<Option<String>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Empty | Data::Error(_) => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                Series::new(header, strings)
            }
        };

        columns.push(series);
    }

    DataFrame::new(columns)
        .map_err(|e| AppError::FileProcessingError(format!("Failed to create DataFrame: {}", e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Numeric,
    Boolean,
    Text,
}

/// Majority vote over the non-empty cells.
fn detect_column_type(values: &[&Data]) -> CellType {
    let mut numeric_count = 0;
    let mut bool_count = 0;
    let mut total_count = 0;

    for value in values.iter().filter(|v| !matches!(v, Data::Empty)) {
        total_count += 1;
        match value {
            Data::Float(_) | Data::Int(_) => numeric_count += 1,
            Data::Bool(_) => bool_count += 1,
            _ => {}
        }
    }

    if total_count == 0 {
        return CellType::Text;
    }

    let numeric_ratio = numeric_count as f64 / total_count as f64;
    let bool_ratio = bool_count as f64 / total_count as f64;

    if numeric_ratio > 0.5 {
        CellType::Numeric
    } else if bool_ratio > 0.5 {
        CellType::Boolean
    } else {
        CellType::Text
    }
}

/// Makes a header usable as a column name and unique within the sheet.
pub fn clean_column_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let trimmed = name.trim();
    let base = if trimmed.is_empty() {
        "column".to_string()
    } else {
        trimmed.to_string()
    };

    let mut cleaned = base.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base, counter);
        counter += 1;
    }

    cleaned
}

/// Downloads a dataset file, refusing anything larger than `max_size` bytes.
pub async fn load_file_from_url(url: &str, max_size: usize) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::HttpError(format!(
            "Failed to fetch file. Status: {}",
            response.status()
        )));
    }

    if let Some(len) = response.content_length() {
        if len as usize > max_size {
            return Err(AppError::InvalidInput(format!(
                "file is {} bytes, limit is {}",
                len, max_size
            )));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to read response bytes: {}", e)))?;

    if bytes.len() > max_size {
        return Err(AppError::InvalidInput(format!(
            "file is {} bytes, limit is {}",
            bytes.len(),
            max_size
        )));
    }
    Ok(bytes)
}
