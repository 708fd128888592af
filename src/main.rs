use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use eda_services::{
    config, logging,
    services::{
        eda::{self, AnalysisOptions},
        file_processor::{self, LoadOptions},
        report::{self, ReportOptions},
    },
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "eda", about = "Exploratory data analysis for CSV and XLSX files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct InputArgs {
    /// Path to the CSV (or XLSX) file.
    path: PathBuf,
    /// Field separator.
    #[arg(long, default_value = ",")]
    sep: String,
    /// File encoding: utf-8 or lossy-utf8.
    #[arg(long, default_value = "utf-8")]
    encoding: String,
}

impl InputArgs {
    fn load_options(&self, max_rows: usize) -> Result<LoadOptions> {
        Ok(LoadOptions {
            separator: LoadOptions::parse_separator(&self.sep)?,
            encoding: self.encoding.parse()?,
            max_rows: None,
        }
        .with_max_rows(max_rows))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print dataset size and a per-column summary.
    Overview {
        #[command(flatten)]
        input: InputArgs,
        /// Emit the summary as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Run the full analysis and write a report directory.
    Report {
        #[command(flatten)]
        input: InputArgs,
        /// Directory for the report.
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
        /// Number of top categories per categorical column.
        #[arg(long)]
        top_k_categories: Option<usize>,
        /// Number of categorical columns to tabulate.
        #[arg(long)]
        max_category_columns: Option<usize>,
        /// Title at the top of report.md.
        #[arg(long, default_value = "EDA report")]
        title: String,
        /// Analyze at most this many rows (0 = no limit).
        #[arg(long, default_value_t = 0)]
        max_rows: usize,
    },
    /// Serve the analysis over HTTP.
    Serve {
        /// Address to listen on; overrides EDA_BIND_ADDR.
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    let cli = Cli::parse();
    match cli.command {
        Command::Overview { input, json } => overview(&input, &config.analysis, json),
        Command::Report {
            input,
            out_dir,
            top_k_categories,
            max_category_columns,
            title,
            max_rows,
        } => {
            let options = AnalysisOptions {
                top_k: top_k_categories.unwrap_or(config.analysis.top_k),
                max_category_columns: max_category_columns
                    .unwrap_or(config.analysis.max_category_columns),
                ..config.analysis
            };
            run_report(&input, out_dir, title, max_rows, &options)
        }
        Command::Serve { addr } => {
            let mut config = config;
            if let Some(addr) = addr {
                config.bind_addr = addr;
            }
            serve(config)
        }
    }
}

fn overview(input: &InputArgs, options: &AnalysisOptions, json: bool) -> Result<()> {
    let dataset = file_processor::load_path(&input.path, &input.load_options(0)?)?;
    let summary = eda::summarize_dataset(&dataset, options.example_values)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Rows: {}", summary.row_count);
    println!("Columns: {}", summary.column_count);
    println!("\nColumns:");
    println!("{}", summary.to_frame()?);
    Ok(())
}

fn run_report(
    input: &InputArgs,
    out_dir: PathBuf,
    title: String,
    max_rows: usize,
    options: &AnalysisOptions,
) -> Result<()> {
    let dataset = file_processor::load_path(&input.path, &input.load_options(max_rows)?)?;
    let analysis = eda::analyze(&dataset, options)?;

    let source_name = input
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.path.display().to_string());
    let artifacts = report::write_report(
        &analysis,
        &ReportOptions {
            out_dir: out_dir.clone(),
            title,
            source_name,
            top_k: options.top_k,
        },
    )?;

    println!("Report generated in: {}", out_dir.display());
    println!("- Markdown: {}", artifacts.markdown.display());
    println!("- Summary: {}", artifacts.summary.display());
    println!("- Quality flags: {}", artifacts.quality.display());
    if let Some(path) = &artifacts.missing {
        println!("- Missing values: {}", path.display());
    }
    if let Some(path) = &artifacts.correlation {
        println!("- Correlation: {}", path.display());
    }
    for path in &artifacts.categories {
        println!("- Top categories: {}", path.display());
    }
    Ok(())
}

fn serve(config: config::Config) -> Result<()> {
    let addr = config.bind_addr;

    // Build our application state
    let state = Arc::new(AppState::new(config));
    let app = eda_services::app(state);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        tracing::info!("listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok::<(), anyhow::Error>(())
    })
}
