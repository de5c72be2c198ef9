use chrono::Utc;

use crate::error::AppError;
use crate::llm::{GenerateRequest, LlmClient};

use super::prompts::{SYSTEM_PROMPT, build_prompt};
use super::{AnalysisType, Report};

/// Runs one analysis generator: fills the category template and delegates to
/// the LLM. Failures surface as `AppError::Llm`; callers decide whether the
/// run continues.
#[tracing::instrument(
    name = "analysis generate",
    skip(llm, description),
    fields(
        analysis.type = analysis_type.stage(),
        analysis.chars = tracing::field::Empty,
    )
)]
pub async fn generate(
    llm: &LlmClient,
    model: &str,
    analysis_type: AnalysisType,
    project_name: &str,
    description: &str,
    company_context: &str,
) -> Result<Report, AppError> {
    let prompt = build_prompt(analysis_type, project_name, description, company_context);

    let resp = llm
        .generate(&GenerateRequest {
            model: model.to_string(),
            system: SYSTEM_PROMPT.to_string(),
            prompt,
            temperature: 0.3,
            max_tokens: 1500,
            stage: analysis_type.stage().to_string(),
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    tracing::Span::current().record("analysis.chars", resp.content.len());

    Ok(Report {
        project_name: project_name.to_string(),
        analysis_type,
        raw_text: resp.content,
        generated_at: Utc::now(),
    })
}
