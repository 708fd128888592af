use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::error::AppError;
use crate::services::eda::{Analysis, QualityFlags};
use crate::services::file_processor::clean_column_name;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_.-]+").expect("static regex"));

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub out_dir: PathBuf,
    pub title: String,
    /// Shown as the source file name in `report.md`.
    pub source_name: String,
    pub top_k: usize,
}

/// Paths written by [`write_report`].
#[derive(Debug, Clone, Default)]
pub struct ReportArtifacts {
    pub markdown: PathBuf,
    pub summary: PathBuf,
    pub quality: PathBuf,
    pub missing: Option<PathBuf>,
    pub correlation: Option<PathBuf>,
    pub categories: Vec<PathBuf>,
}

/// Writes the tabular artifacts and `report.md` into `options.out_dir`.
pub fn write_report(analysis: &Analysis, options: &ReportOptions) -> Result<ReportArtifacts, AppError> {
    let out = &options.out_dir;
    fs::create_dir_all(out)?;
    tracing::info!("Writing report to {}", out.display());

    let summary = out.join("summary.csv");
    write_csv(&mut analysis.summary.to_frame()?, &summary)?;

    let missing = if analysis.missing.is_empty() {
        None
    } else {
        let path = out.join("missing.csv");
        write_csv(&mut analysis.missing.to_frame()?, &path)?;
        Some(path)
    };

    let correlation = if analysis.correlation.is_empty() {
        None
    } else {
        let path = out.join("correlation.csv");
        write_csv(&mut analysis.correlation.to_frame()?, &path)?;
        Some(path)
    };

    let mut categories = Vec::new();
    if !analysis.categories.is_empty() {
        let dir = out.join("top_categories");
        fs::create_dir_all(&dir)?;
        // distinct columns can clean to the same stem
        let mut stems = HashSet::new();
        for table in analysis.categories.iter() {
            let stem = clean_column_name(&safe_file_stem(&table.column), &mut stems);
            let path = dir.join(format!("{}.csv", stem));
            write_csv(&mut table.to_frame()?, &path)?;
            categories.push(path);
        }
    }

    let quality = out.join("quality.json");
    fs::write(&quality, serde_json::to_string_pretty(&analysis.quality)?)?;

    let markdown = out.join("report.md");
    fs::write(&markdown, render_markdown(analysis, options))?;

    tracing::info!(
        "Report written: {} category table(s), missing.csv: {}, correlation.csv: {}",
        categories.len(),
        missing.is_some(),
        correlation.is_some()
    );

    Ok(ReportArtifacts {
        markdown,
        summary,
        quality,
        missing,
        correlation,
        categories,
    })
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), AppError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    tracing::debug!("Wrote {} ({} rows)", path.display(), df.height());
    Ok(())
}

/// File-system safe stem for a column name.
pub fn safe_file_stem(name: &str) -> String {
    let stem = UNSAFE_FILE_CHARS.replace_all(name.trim(), "_");
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "column".to_string()
    } else {
        stem.to_string()
    }
}

/// Renders `report.md`.
pub fn render_markdown(analysis: &Analysis, options: &ReportOptions) -> String {
    let summary = &analysis.summary;
    let flags = &analysis.quality;
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# {}\n", options.title);
    let _ = writeln!(md, "Source file: `{}`\n", options.source_name);
    let _ = writeln!(
        md,
        "Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(
        md,
        "Rows: **{}**, columns: **{}**\n",
        summary.row_count, summary.column_count
    );

    md.push_str("## Data quality (heuristics)\n\n");
    md.push_str(&render_quality(flags));

    md.push_str("## Columns\n\nSee `summary.csv`.\n\n");

    md.push_str("## Missing values\n\n");
    if analysis.missing.is_empty() {
        md.push_str("No missing values or the dataset is empty.\n\n");
    } else {
        md.push_str("See `missing.csv`.\n\n");
    }

    md.push_str("## Correlation of numeric columns\n\n");
    if analysis.correlation.is_empty() {
        md.push_str("Not enough numeric columns for correlation.\n\n");
    } else {
        md.push_str("See `correlation.csv`.\n\n");
    }

    md.push_str("## Categorical columns\n\n");
    if analysis.categories.is_empty() {
        md.push_str("No categorical/text columns found.\n\n");
    } else {
        let _ = writeln!(
            md,
            "Top-{} categories per column. See the files in `top_categories/`.\n",
            options.top_k
        );
        for table in analysis.categories.iter() {
            let _ = writeln!(md, "### {}\n", table.column);
            md.push_str("| value | count | share |\n|---|---:|---:|\n");
            for row in &table.rows {
                let _ = writeln!(
                    md,
                    "| {} | {} | {:.2}% |",
                    escape_cell(&row.value),
                    row.count,
                    row.share * 100.0
                );
            }
            md.push('\n');
        }
    }

    md
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn render_quality(flags: &QualityFlags) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- Quality score: **{:.2}**", flags.quality_score);
    let _ = writeln!(
        out,
        "- Max missing share per column: **{:.2}%**",
        flags.max_missing_share * 100.0
    );
    let _ = writeln!(out, "- Too few rows: **{}**", flags.too_few_rows);
    let _ = writeln!(out, "- Too many columns: **{}**", flags.too_many_columns);
    let _ = writeln!(out, "- Too many missing: **{}**", flags.too_many_missing);

    let listed = [
        ("Constant columns", flags.has_constant_columns, &flags.constant_columns),
        (
            "High-cardinality categoricals",
            flags.has_high_cardinality_categoricals,
            &flags.high_cardinality_columns,
        ),
        ("Low-variance numeric columns", flags.has_low_variance_columns, &flags.low_variance_columns),
        (
            "Critically missing columns",
            flags.has_critical_missing_columns,
            &flags.critical_missing_columns,
        ),
    ];
    for (label, flagged, columns) in listed {
        if flagged {
            let _ = writeln!(out, "- {}: **true** ({})", label, columns.join(", "));
        } else {
            let _ = writeln!(out, "- {}: **false**", label);
        }
    }
    out.push('\n');
    out
}
