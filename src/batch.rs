//! Best-effort batch rendering into a zip archive or base64 payloads.
//!
//! A spec that fails to render is counted and attributed, never fatal to the
//! batch; only archive construction itself can fail the whole call.

use std::io::{Cursor, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::chart::{ChartConfig, ChartKind, ChartSpec};
use crate::pipeline::ChartFailure;
use crate::render::{ChartRenderer, RenderError, RenderedChart};

#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of one packaging call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBatch {
    pub succeeded: Vec<RenderedChart>,
    pub failed_count: usize,
    pub failures: Vec<ChartFailure>,
    /// Present for the archive form only.
    pub archive_bytes: Option<Vec<u8>>,
}

impl ChartBatch {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed_count
    }

    /// Transport form of each rendered chart, in input order.
    pub fn individual_charts(&self) -> Vec<IndividualChart> {
        self.succeeded.iter().map(IndividualChart::from).collect()
    }
}

/// One chart as returned to a caller that wants separate images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualChart {
    pub title: String,
    pub chart_type: ChartKind,
    pub image_base64: String,
}

impl From<&RenderedChart> for IndividualChart {
    fn from(chart: &RenderedChart) -> Self {
        Self {
            title: chart.title.clone(),
            chart_type: chart.chart_type,
            image_base64: chart.image_base64(),
        }
    }
}

/// Output shape for [`BatchPackager::package_configs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    Zip,
    Individual,
}

/// Archive member name: 1-based input position and the title with spaces
/// replaced by underscores.
pub fn member_name(position: usize, title: &str) -> String {
    format!("{position}_{}.png", sanitize(title))
}

fn sanitize(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' => '-',
            c => c,
        })
        .collect()
}

/// Download name for an archive built at `now`.
pub fn archive_file_name(now: NaiveDateTime) -> String {
    format!("charts_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// Renders specs in order and packages the successes.
#[derive(Debug, Clone, Default)]
pub struct BatchPackager {
    renderer: ChartRenderer,
    render_timeout: Option<Duration>,
}

struct Rendered {
    /// 0-based input position.
    index: usize,
    chart: RenderedChart,
}

impl BatchPackager {
    pub fn new(renderer: ChartRenderer) -> Self {
        Self {
            renderer,
            render_timeout: None,
        }
    }

    /// Give up on any single render that takes longer than `timeout`.
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = Some(timeout);
        self
    }

    pub fn package_zip(&self, specs: &[ChartSpec]) -> Result<ChartBatch, PackagingError> {
        let items = specs.iter().map(|s| (s.title.clone(), Ok::<_, RenderError>(s)));
        let (rendered, failures) = self.render_all(items);
        build_zip(rendered, failures)
    }

    pub fn package_individual(&self, specs: &[ChartSpec]) -> ChartBatch {
        let items = specs.iter().map(|s| (s.title.clone(), Ok::<_, RenderError>(s)));
        let (rendered, failures) = self.render_all(items);
        batch(rendered, failures, None)
    }

    /// Validate and package wire configs; a config that fails validation is
    /// a failed item like any render error.
    pub fn package_configs(
        &self,
        configs: &[ChartConfig],
        format: PackageFormat,
    ) -> Result<ChartBatch, PackagingError> {
        let specs: Vec<(String, Result<ChartSpec, RenderError>)> = configs
            .iter()
            .map(|c| (c.title.clone(), ChartSpec::from_config(c).map_err(RenderError::from)))
            .collect();
        let items = specs.iter().map(|(title, spec)| (title.clone(), spec.as_ref()));
        let (rendered, failures) = self.render_all(items);
        match format {
            PackageFormat::Zip => build_zip(rendered, failures),
            PackageFormat::Individual => Ok(batch(rendered, failures, None)),
        }
    }

    fn render_all<'a, E: ToString>(
        &self,
        items: impl Iterator<Item = (String, Result<&'a ChartSpec, E>)>,
    ) -> (Vec<Rendered>, Vec<ChartFailure>) {
        let _span = tracing::info_span!("render_batch").entered();
        let mut rendered = Vec::new();
        let mut failures = Vec::new();

        for (index, (title, spec)) in items.enumerate() {
            let result = match spec {
                Ok(spec) => self.render_one(spec).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match result {
                Ok(chart) => rendered.push(Rendered { index, chart }),
                Err(reason) => {
                    tracing::warn!(index, title = %title, error = %reason, "Chart render failed, continuing");
                    failures.push(ChartFailure {
                        index,
                        title,
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            succeeded = rendered.len(),
            failed = failures.len(),
            "Batch rendered"
        );
        (rendered, failures)
    }

    fn render_one(&self, spec: &ChartSpec) -> Result<RenderedChart, RenderError> {
        let Some(timeout) = self.render_timeout else {
            return self.renderer.render(spec);
        };

        let (tx, rx) = mpsc::channel();
        let renderer = self.renderer;
        let owned = spec.clone();
        // A timed-out render is abandoned; its thread drops its own canvas when done.
        thread::spawn(move || {
            let _ = tx.send(renderer.render(&owned));
        });
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(RenderError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(RenderError::Backend("render thread exited without a result".into()))
            }
        }
    }
}

fn batch(rendered: Vec<Rendered>, failures: Vec<ChartFailure>, archive: Option<Vec<u8>>) -> ChartBatch {
    ChartBatch {
        succeeded: rendered.into_iter().map(|r| r.chart).collect(),
        failed_count: failures.len(),
        failures,
        archive_bytes: archive,
    }
}

fn build_zip(rendered: Vec<Rendered>, failures: Vec<ChartFailure>) -> Result<ChartBatch, PackagingError> {
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for item in &rendered {
        zip.start_file(member_name(item.index + 1, &item.chart.title), options)?;
        zip.write_all(&item.chart.image_bytes)?;
    }
    let archive = zip.finish()?.into_inner();

    tracing::debug!(members = rendered.len(), bytes = archive.len(), "Archive built");
    Ok(batch(rendered, failures, Some(archive)))
}
