use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use uuid::Uuid;

use super::analysis::{AnalysisFormat, ReportAnalysis, ReportAnalyzer};
use super::extraction::ExtractionStage;
use super::llm::SharedLlmClient;
use super::synthesis::ChartSpecStage;
use super::types::{ChartFailure, ChartRecommendation, FinancialDataset, PipelineRun, SynthesizedChart};
use super::AnalysisError;

/// Words that mark a request as asking for a chart, in English and Vietnamese.
static CHART_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(chart|graph|plot|biểu\s*đồ|vẽ)").unwrap());

/// True when a free-text request asks for a chart.
pub fn has_chart_intent(request: &str) -> bool {
    CHART_INTENT.is_match(request)
}

/// Chart phase and narrative analysis of one report.
#[derive(Debug)]
pub struct FullRun {
    pub charts: PipelineRun,
    pub analysis: Result<ReportAnalysis, AnalysisError>,
    /// Chart phase plus analysis.
    pub tokens_used: u64,
}

/// Extraction, then bounded spec synthesis, with per-item failures collected.
pub struct PipelineOrchestrator {
    extraction: ExtractionStage,
    synthesis: ChartSpecStage,
    analyzer: ReportAnalyzer,
}

impl PipelineOrchestrator {
    pub fn new(llm: SharedLlmClient) -> Self {
        Self {
            extraction: ExtractionStage::new(llm.clone()),
            synthesis: ChartSpecStage::new(llm.clone()),
            analyzer: ReportAnalyzer::new(llm),
        }
    }

    /// Bound every model call made by this orchestrator.
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self {
            extraction: self.extraction.with_timeout(timeout),
            synthesis: self.synthesis.with_timeout(timeout),
            analyzer: self.analyzer.with_timeout(timeout),
        }
    }

    pub fn run(&self, report_text: &str, user_request: Option<&str>, max_charts: usize) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!("pipeline_run", %run_id, max_charts).entered();

        let mut run = PipelineRun {
            run_id,
            dataset: FinancialDataset::new(),
            recommendations: vec![],
            charts: vec![],
            failures: vec![],
            extraction_error: None,
            tokens_used: 0,
        };

        let (extracted, tokens) = self.extraction.extract_metered(report_text);
        run.tokens_used += tokens;
        let outcome = match extracted {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(%run_id, error = %e, "Extraction failed, skipping chart generation");
                run.extraction_error = Some(e.to_string());
                return run;
            }
        };

        run.dataset = outcome.dataset;
        run.recommendations = by_priority(outcome.recommendations);

        match user_request.filter(|r| has_chart_intent(r)) {
            Some(request) => self.synthesize_requested(&mut run, request),
            None => self.synthesize_recommended(&mut run, max_charts),
        }

        tracing::info!(
            %run_id,
            charts = run.charts.len(),
            failed = run.failed_count(),
            tokens = run.tokens_used,
            "Pipeline run complete"
        );
        run
    }

    /// Chart phase and analysis, each independent of the other's failure.
    pub fn run_full(
        &self,
        report_text: &str,
        user_request: Option<&str>,
        max_charts: usize,
        format: AnalysisFormat,
    ) -> FullRun {
        let charts = self.run(report_text, user_request, max_charts);
        let analysis = self.analyzer.analyze(report_text, format);
        if let Err(e) = &analysis {
            tracing::warn!(run_id = %charts.run_id, error = %e, "Report analysis failed");
        }
        let tokens_used =
            charts.tokens_used + analysis.as_ref().map_or(0, |a| a.tokens_used);
        FullRun {
            charts,
            analysis,
            tokens_used,
        }
    }

    fn synthesize_requested(&self, run: &mut PipelineRun, request: &str) {
        let (result, tokens) = self.synthesis.synthesize_metered(&run.dataset, request);
        run.tokens_used += tokens;
        match result {
            Ok(spec) => run.charts.push(SynthesizedChart {
                spec,
                priority: None,
                description: None,
            }),
            Err(e) => {
                tracing::warn!(run_id = %run.run_id, error = %e, "Requested chart failed");
                run.failures.push(ChartFailure {
                    index: 0,
                    title: request.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn synthesize_recommended(&self, run: &mut PipelineRun, max_charts: usize) {
        let selected: Vec<ChartRecommendation> =
            run.recommendations.iter().take(max_charts).cloned().collect();

        for (index, rec) in selected.into_iter().enumerate() {
            let (result, tokens) = self
                .synthesis
                .synthesize_metered(&run.dataset, &rec.synthesis_request());
            run.tokens_used += tokens;
            match result {
                Ok(spec) => run.charts.push(SynthesizedChart {
                    spec,
                    priority: Some(rec.priority),
                    description: Some(rec.description).filter(|d| !d.is_empty()),
                }),
                Err(e) => {
                    tracing::warn!(
                        run_id = %run.run_id,
                        index,
                        title = %rec.title,
                        error = %e,
                        "Chart synthesis failed, continuing"
                    );
                    run.failures.push(ChartFailure {
                        index,
                        title: rec.title,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Stable sort by ascending priority; ties keep the model's order.
fn by_priority(mut recommendations: Vec<ChartRecommendation>) -> Vec<ChartRecommendation> {
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}
