use std::sync::Arc;

use axum::{extract::State, http::Method, routing::post, Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    services::{
        eda::{self, Analysis, AnalysisOptions},
        file_processor::{self, LoadOptions},
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/datasets/analyze", post(analyze_dataset))
        .layer(cors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub fn from_file_type(file_type: &str) -> Result<Self, AppError> {
        let file_type = file_type.to_lowercase();
        if file_type.contains("xlsx") {
            Ok(FileFormat::Xlsx)
        } else if file_type.contains("csv") {
            Ok(FileFormat::Csv)
        } else {
            Err(AppError::InvalidInput(format!(
                "Unsupported file type: {}, expected csv or xlsx",
                file_type
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub file_type: String,
    pub signed_url: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub max_rows: Option<usize>,
}

async fn analyze_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, AppError> {
    let start = std::time::Instant::now();
    let format = FileFormat::from_file_type(&request.file_type)?;
    tracing::info!(
        "Processing file type: {:?}, URL length: {}",
        format,
        request.signed_url.len()
    );

    let download_start = std::time::Instant::now();
    let file_data =
        file_processor::load_file_from_url(&request.signed_url, state.config.max_file_size).await?;
    tracing::info!(
        "File downloaded, size: {}KB, took: {:?}",
        file_data.len() / 1024,
        download_start.elapsed()
    );

    let options = AnalysisOptions {
        top_k: request.top_k.unwrap_or(state.config.analysis.top_k),
        ..state.config.analysis
    };
    let load = LoadOptions::default().with_max_rows(request.max_rows.unwrap_or(0));

    let analysis = tokio::task::spawn_blocking(move || {
        analyze_bytes(file_data, format, &load, &options)
    })
    .await
    .map_err(|e| AppError::Internal(format!("analysis task failed: {}", e)))??;

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(Json(analysis))
}

/// Loads an in-memory file and runs the full analysis on it.
pub fn analyze_bytes(
    data: Bytes,
    format: FileFormat,
    load: &LoadOptions,
    options: &AnalysisOptions,
) -> Result<Analysis, AppError> {
    let dataset = match format {
        FileFormat::Csv => file_processor::load_csv_bytes(data, load)?,
        FileFormat::Xlsx => file_processor::load_xlsx_bytes(data, load.max_rows)?,
    };
    eda::analyze(&dataset, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_file_types() {
        assert_eq!(FileFormat::from_file_type("text/csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_type("XLSX").unwrap(), FileFormat::Xlsx);
        assert!(matches!(
            FileFormat::from_file_type("parquet"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn analyzes_csv_bytes() {
        let csv = "age,height,city\n10,140,A\n20,150,B\n30,160,A\n,170,\n";
        let analysis = analyze_bytes(
            Bytes::from(csv),
            FileFormat::Csv,
            &LoadOptions::default(),
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(analysis.summary.row_count, 4);
        assert_eq!(analysis.missing.get("age").unwrap().missing_count, 1);
        assert!(analysis.categories.contains("city"));
    }

    #[test]
    fn request_limits_are_optional() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{"file_type": "csv", "signed_url": "https://example.com/data.csv"}"#,
        )
        .unwrap();
        assert_eq!(request.top_k, None);
        assert_eq!(request.max_rows, None);
    }
}
