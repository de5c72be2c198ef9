use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisType, Report, generator};
use crate::error::AppError;
use crate::formatter;
use crate::llm::LlmClient;
use crate::telemetry::metrics::{
    ANALYSIS_REPORTS_COMPLETED, ANALYSIS_RUN_DURATION, REPORT_BLOCKS,
};
use crate::workspace::{DocumentStore, PageStatus};

use super::summary::{self, DEFAULT_PRIORITY_SCORE};

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub page_id: String,
    /// Selective mode: overrides the page's own selected set when present.
    pub analysis_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub project_name: String,
    pub completed: Vec<&'static str>,
    pub failed: Vec<&'static str>,
    pub published_pages: Vec<String>,
    pub recommendation: String,
    pub priority_score: i64,
    pub status: PageStatus,
    pub duration_ms: u64,
}

/// Runs one full intake analysis: fetch project fields, generate and publish
/// each selected analysis sequentially, then the executive summary and final
/// status write-back. Per-type failures are isolated; only the initial
/// project-fields fetch aborts the run.
#[tracing::instrument(
    name = "pipeline analysis_run",
    skip(store, llm),
    fields(
        run.id,
        run.page_id = %request.page_id,
        run.completed = tracing::field::Empty,
        run.failed = tracing::field::Empty,
        run.duration_ms = tracing::field::Empty,
    )
)]
pub async fn run_analysis(
    store: &dyn DocumentStore,
    llm: &LlmClient,
    model: &str,
    company_context: &str,
    request: &AnalysisRequest,
) -> Result<RunOutcome, AppError> {
    let start = Instant::now();
    let run_id = Uuid::new_v4();
    let page_id = request.page_id.as_str();

    let span = tracing::Span::current();
    span.record("run.id", run_id.to_string());

    if let Err(err) = store.update_status(page_id, PageStatus::Analyzing).await {
        tracing::warn!(error = %err, "Failed to set Analyzing status, continuing");
    }

    // The only fatal collaborator call in the run.
    let fields = match store.get_project_fields(page_id).await {
        Ok(fields) => fields,
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch project fields, aborting run");
            if let Err(status_err) = store.update_status(page_id, PageStatus::Error).await {
                tracing::warn!(error = %status_err, "Failed to set Error status");
            }
            return Err(err);
        }
    };

    tracing::info!(
        project = %fields.name,
        description_chars = fields.description.len(),
        "Project fields retrieved"
    );

    let selected = resolve_selection(
        request.analysis_types.as_deref(),
        &fields.selected_analysis_types,
    );

    let mut reports: Vec<Report> = Vec::new();
    let mut completed: Vec<&'static str> = Vec::new();
    let mut failed: Vec<&'static str> = Vec::new();
    let mut published_pages: Vec<String> = Vec::new();

    for analysis_type in selected {
        match generator::generate(
            llm,
            model,
            analysis_type,
            &fields.name,
            &fields.description,
            company_context,
        )
        .await
        {
            Ok(report) => {
                let blocks = formatter::format_report(&report);
                REPORT_BLOCKS.record(blocks.len() as f64, &[]);

                let title = format!("{} — {}", analysis_type.display_name(), fields.name);
                match store.create_report(page_id, &title, &blocks).await {
                    Ok(child_page_id) => published_pages.push(child_page_id),
                    Err(err) => {
                        // Text is still retained for the executive summary.
                        tracing::error!(
                            analysis = analysis_type.display_name(),
                            error = %err,
                            "Publish failed, report kept for summary"
                        );
                    }
                }

                completed.push(analysis_type.display_name());
                reports.push(report);
            }
            Err(err) => {
                tracing::error!(
                    analysis = analysis_type.display_name(),
                    error = %err,
                    "Analysis failed, run continues"
                );
                failed.push(analysis_type.display_name());
            }
        }
    }

    if reports.is_empty() {
        tracing::error!("No analyses succeeded, marking run as errored");
        if let Err(err) = store.update_status(page_id, PageStatus::Error).await {
            tracing::warn!(error = %err, "Failed to set Error status");
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        record_run(&span, &completed, &failed, duration_ms);
        return Ok(RunOutcome {
            run_id,
            project_name: fields.name,
            completed,
            failed,
            published_pages,
            recommendation: String::new(),
            priority_score: DEFAULT_PRIORITY_SCORE,
            status: PageStatus::Error,
            duration_ms,
        });
    }

    let (recommendation, priority_score) = match summary::executive_summary(
        llm,
        model,
        &fields.name,
        &fields.description,
        &reports,
    )
    .await
    {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(error = %err, "Executive summary failed, using fallback");
            (
                summary::fallback_recommendation(&fields.name, reports.len()),
                DEFAULT_PRIORITY_SCORE,
            )
        }
    };

    if let Err(err) = store
        .update_completion(page_id, &recommendation, priority_score)
        .await
    {
        tracing::warn!(error = %err, "Failed to write completion fields");
    }
    if let Err(err) = store.update_status(page_id, PageStatus::Complete).await {
        tracing::warn!(error = %err, "Failed to set Complete status");
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    record_run(&span, &completed, &failed, duration_ms);

    tracing::info!(
        project = %fields.name,
        completed = completed.len(),
        failed = failed.len(),
        duration_ms,
        "Analysis run complete"
    );

    Ok(RunOutcome {
        run_id,
        project_name: fields.name,
        completed,
        failed,
        published_pages,
        recommendation,
        priority_score,
        status: PageStatus::Complete,
        duration_ms,
    })
}

fn record_run(span: &tracing::Span, completed: &[&str], failed: &[&str], duration_ms: u64) {
    ANALYSIS_RUN_DURATION.record(duration_ms as f64 / 1000.0, &[]);
    ANALYSIS_REPORTS_COMPLETED.record(completed.len() as f64, &[]);
    span.record("run.completed", completed.len());
    span.record("run.failed", failed.len());
    span.record("run.duration_ms", duration_ms);
}

/// Resolves the set of analysis types to run: the request override when
/// present, else the page's selection; an empty or unrecognized selection
/// falls back to all known types.
fn resolve_selection(
    override_types: Option<&[String]>,
    page_types: &[String],
) -> Vec<AnalysisType> {
    let source = match override_types {
        Some(types) if !types.is_empty() => types,
        _ => page_types,
    };

    let mut selected: Vec<AnalysisType> = Vec::new();
    for name in source {
        match AnalysisType::from_name(name) {
            Some(ty) if !selected.contains(&ty) => selected.push(ty),
            Some(_) => {}
            None => tracing::warn!(name = %name, "Unknown analysis type ignored"),
        }
    }

    if selected.is_empty() {
        AnalysisType::ALL.to_vec()
    } else {
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::ProjectFields;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn test_resolve_selection_empty_falls_back_to_all() {
        let selected = resolve_selection(None, &[]);
        assert_eq!(selected, AnalysisType::ALL.to_vec());
    }

    #[test]
    fn test_resolve_selection_override_wins() {
        let page = vec!["Market Analysis".to_string()];
        let override_types = vec!["Risk Assessment".to_string()];
        let selected = resolve_selection(Some(&override_types), &page);
        assert_eq!(selected, vec![AnalysisType::Risk]);
    }

    #[test]
    fn test_resolve_selection_empty_override_uses_page() {
        let page = vec!["Financial Overview".to_string()];
        let selected = resolve_selection(Some(&[]), &page);
        assert_eq!(selected, vec![AnalysisType::Financial]);
    }

    #[test]
    fn test_resolve_selection_unknown_names_only_falls_back() {
        let page = vec!["Astrology".to_string(), "Palmistry".to_string()];
        let selected = resolve_selection(None, &page);
        assert_eq!(selected, AnalysisType::ALL.to_vec());
    }

    #[test]
    fn test_resolve_selection_dedupes() {
        let page = vec!["market".to_string(), "Market Analysis".to_string()];
        let selected = resolve_selection(None, &page);
        assert_eq!(selected, vec![AnalysisType::Market]);
    }

    /// In-memory store that records calls and can fail on demand.
    #[derive(Default)]
    struct FakeStore {
        fields: Option<ProjectFields>,
        fail_fields: bool,
        fail_publish: bool,
        statuses: Mutex<Vec<PageStatus>>,
        created: Mutex<Vec<String>>,
        completions: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn get_project_fields(&self, _page_id: &str) -> Result<ProjectFields, AppError> {
            if self.fail_fields {
                return Err(AppError::Workspace("page fetch failed".to_string()));
            }
            Ok(self.fields.clone().unwrap_or_default())
        }

        async fn create_report(
            &self,
            _parent_page_id: &str,
            title: &str,
            _blocks: &[crate::formatter::Block],
        ) -> Result<String, AppError> {
            if self.fail_publish {
                return Err(AppError::Workspace("publish failed".to_string()));
            }
            let mut created = self.created.lock().unwrap();
            created.push(title.to_string());
            Ok(format!("page-{}", created.len()))
        }

        async fn update_status(&self, _page_id: &str, status: PageStatus) -> Result<(), AppError> {
            self.statuses.lock().unwrap().push(status);
            Ok(())
        }

        async fn update_completion(
            &self,
            _page_id: &str,
            recommendation: &str,
            priority_score: i64,
        ) -> Result<(), AppError> {
            self.completions
                .lock()
                .unwrap()
                .push((recommendation.to_string(), priority_score));
            Ok(())
        }
    }

    struct FakeProvider {
        fail: bool,
    }

    #[async_trait]
    impl crate::llm::Provider for FakeProvider {
        async fn generate(
            &self,
            req: &crate::llm::GenerateRequest,
        ) -> anyhow::Result<crate::llm::GenerateResponse> {
            if self.fail {
                anyhow::bail!("simulated provider outage");
            }
            let content = if req.stage == "summary" {
                if req.max_tokens <= 10 {
                    "7".to_string()
                } else {
                    "Recommended for the next quarter.".to_string()
                }
            } else {
                "## Market Opportunity\n- strong growth expected this year".to_string()
            };
            Ok(crate::llm::GenerateResponse {
                content,
                model: req.model.clone(),
                input_tokens: 10,
                output_tokens: 10,
                cost_usd: 0.0,
                finish_reason: "stop".to_string(),
                provider: String::new(),
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn fake_llm(fail: bool) -> LlmClient {
        LlmClient {
            primary: std::sync::Arc::new(FakeProvider { fail }),
            fallback: None,
            primary_provider: "fake".to_string(),
            fallback_provider: String::new(),
            fallback_model: String::new(),
        }
    }

    fn request(types: Option<Vec<&str>>) -> AnalysisRequest {
        AnalysisRequest {
            page_id: "page-123".to_string(),
            analysis_types: types.map(|v| v.into_iter().map(str::to_string).collect()),
        }
    }

    #[tokio::test]
    async fn test_run_completes_selected_analyses() {
        let store = FakeStore {
            fields: Some(ProjectFields {
                name: "Loyalty App".to_string(),
                description: "A mobile loyalty program".to_string(),
                selected_analysis_types: vec![],
            }),
            ..Default::default()
        };
        let llm = fake_llm(false);

        let outcome = run_analysis(
            &store,
            &llm,
            "test-model",
            "Acme Corp",
            &request(Some(vec!["market", "risk"])),
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, PageStatus::Complete);
        assert_eq!(outcome.completed, vec!["Market Analysis", "Risk Assessment"]);
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.published_pages.len(), 2);
        assert_eq!(outcome.priority_score, 7);
        assert_eq!(
            *store.statuses.lock().unwrap(),
            vec![PageStatus::Analyzing, PageStatus::Complete]
        );
        assert_eq!(store.completions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_selection_runs_all_types() {
        let store = FakeStore {
            fields: Some(ProjectFields::default()),
            ..Default::default()
        };
        let llm = fake_llm(false);

        let outcome = run_analysis(&store, &llm, "test-model", "", &request(None))
            .await
            .unwrap();

        assert_eq!(outcome.completed.len(), AnalysisType::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_generators_failing_sets_error_status() {
        let store = FakeStore {
            fields: Some(ProjectFields::default()),
            ..Default::default()
        };
        let llm = fake_llm(true);

        let outcome = run_analysis(&store, &llm, "test-model", "", &request(None))
            .await
            .unwrap();

        assert_eq!(outcome.status, PageStatus::Error);
        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failed.len(), AnalysisType::ALL.len());
        assert!(outcome.published_pages.is_empty());
        // summary skipped entirely
        assert!(store.completions.lock().unwrap().is_empty());
        assert_eq!(
            *store.statuses.lock().unwrap(),
            vec![PageStatus::Analyzing, PageStatus::Error]
        );
    }

    #[tokio::test]
    async fn test_fields_fetch_failure_is_fatal() {
        let store = FakeStore {
            fail_fields: true,
            ..Default::default()
        };
        let llm = fake_llm(false);

        let result = run_analysis(&store, &llm, "test-model", "", &request(None)).await;

        assert!(result.is_err());
        // Error status still attempted best-effort
        assert_eq!(
            *store.statuses.lock().unwrap(),
            vec![PageStatus::Analyzing, PageStatus::Error]
        );
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_report_for_summary() {
        let store = FakeStore {
            fields: Some(ProjectFields::default()),
            fail_publish: true,
            ..Default::default()
        };
        let llm = fake_llm(false);

        let outcome = run_analysis(
            &store,
            &llm,
            "test-model",
            "",
            &request(Some(vec!["market"])),
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, PageStatus::Complete);
        assert_eq!(outcome.completed, vec!["Market Analysis"]);
        assert!(outcome.published_pages.is_empty());
        // the retained report still fed the summary
        assert_eq!(store.completions.lock().unwrap().len(), 1);
    }
}
