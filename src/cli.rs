//! Command-line driver: report file in, chart archive or JSON out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde_json::json;
use thiserror::Error;

use crate::batch::{archive_file_name, BatchPackager, ChartBatch, PackageFormat, PackagingError};
use crate::chart::demo_configs;
use crate::config::{LlmSettings, APP_NAME, DEFAULT_MAX_CHARTS};
use crate::pipeline::llm::{client_from_settings, LlmError, SharedLlmClient};
use crate::pipeline::{AnalysisFormat, PipelineOrchestrator, PipelineRun};
use crate::render::ChartRenderer;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Language model setup failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Packaging failed: {0}")]
    Packaging(#[from] PackagingError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A report file is required unless --demo is given")]
    MissingReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One deflate-compressed archive of PNGs.
    Zip,
    /// A JSON list of base64 images.
    Individual,
}

impl From<OutputFormat> for PackageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Zip => PackageFormat::Zip,
            OutputFormat::Individual => PackageFormat::Individual,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chartsmith", version, about = "Turn report text into rendered charts")]
pub struct Cli {
    /// Plain-text report to chart.
    #[arg(required_unless_present = "demo")]
    pub report: Option<PathBuf>,

    /// Free-text chart request; a request that asks for a chart replaces the recommendations.
    #[arg(long)]
    pub request: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MAX_CHARTS)]
    pub max_charts: usize,

    /// Output directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Zip)]
    pub format: OutputFormat,

    /// Also write a narrative analysis (summary, detailed, insights, json).
    #[arg(long)]
    pub analysis: Option<AnalysisFormat>,

    /// Abandon any single chart render after this many seconds.
    #[arg(long)]
    pub render_timeout_secs: Option<u64>,

    /// Render the built-in sample charts without calling a model.
    #[arg(long)]
    pub demo: bool,
}

pub fn execute(cli: &Cli) -> Result<(), CliError> {
    fs::create_dir_all(&cli.out).map_err(|source| CliError::Io {
        path: cli.out.clone(),
        source,
    })?;

    let mut packager = BatchPackager::new(ChartRenderer::default());
    if let Some(secs) = cli.render_timeout_secs {
        packager = packager.with_render_timeout(Duration::from_secs(secs));
    }

    if cli.demo {
        let batch = packager.package_configs(&demo_configs(), cli.format.into())?;
        return write_batch(&cli.out, &batch);
    }

    let report_path = cli.report.as_ref().ok_or(CliError::MissingReport)?;
    let report = fs::read_to_string(report_path).map_err(|source| CliError::Io {
        path: report_path.clone(),
        source,
    })?;

    let settings = LlmSettings::from_env();
    tracing::info!(
        provider = ?settings.provider,
        model = %settings.model,
        base_url = %settings.base_url,
        "{} v{}",
        APP_NAME,
        crate::config::APP_VERSION
    );
    let llm: SharedLlmClient = Arc::from(client_from_settings(&settings)?);
    let orchestrator = PipelineOrchestrator::new(llm).with_timeout(Some(settings.timeout));

    let request = cli.request.as_deref();
    let run = match cli.analysis {
        Some(format) => {
            let full = orchestrator.run_full(&report, request, cli.max_charts, format);
            match &full.analysis {
                Ok(analysis) => {
                    let ext = if format == AnalysisFormat::Json { "json" } else { "md" };
                    write_file(&cli.out.join(format!("analysis.{ext}")), analysis.text.as_bytes())?;
                }
                Err(e) => tracing::warn!(error = %e, "Analysis not written"),
            }
            tracing::info!(tokens = full.tokens_used, "Total tokens used");
            full.charts
        }
        None => orchestrator.run(&report, request, cli.max_charts),
    };

    write_file(
        &cli.out.join("run.json"),
        &serde_json::to_vec_pretty(&run_summary(&run))?,
    )?;

    let specs = run.chart_specs();
    let batch = match cli.format {
        OutputFormat::Zip => packager.package_zip(&specs)?,
        OutputFormat::Individual => packager.package_individual(&specs),
    };
    write_batch(&cli.out, &batch)
}

fn run_summary(run: &PipelineRun) -> serde_json::Value {
    let configs: Vec<_> = run.charts.iter().map(|c| c.to_config()).collect();
    json!({
        "run_id": run.run_id,
        "extracted_data": run.dataset,
        "recommended_charts": run.recommendations,
        "chart_configs": configs,
        "failures": run.failures,
        "failed_count": run.failed_count(),
        "extraction_error": run.extraction_error,
        "tokens_used": run.tokens_used,
    })
}

fn write_batch(out: &Path, batch: &ChartBatch) -> Result<(), CliError> {
    match &batch.archive_bytes {
        Some(archive) => {
            let name = archive_file_name(chrono::Local::now().naive_local());
            write_file(&out.join(name), archive)?;
        }
        None => {
            let body = json!({
                "count": batch.succeeded.len(),
                "charts": batch.individual_charts(),
                "failures": batch.failures,
            });
            write_file(&out.join("charts.json"), &serde_json::to_vec_pretty(&body)?)?;
        }
    }
    tracing::info!(
        succeeded = batch.succeeded.len(),
        failed = batch.failed_count,
        "Charts written"
    );
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    println!("{}", path.display());
    Ok(())
}
