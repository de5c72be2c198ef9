use axum::{Json, extract::State};
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::{AnalysisRequest, run_analysis};

#[derive(Debug, Deserialize)]
pub struct CreateAnalysisBody {
    pub page_id: String,
    pub analysis_types: Option<Vec<String>>,
}

pub async fn create_analysis(
    State(state): State<AppState>,
    Json(body): Json<CreateAnalysisBody>,
) -> AppResult<Json<serde_json::Value>> {
    if body.page_id.trim().is_empty() {
        return Err(AppError::Validation("page_id must not be empty".into()));
    }

    let request = AnalysisRequest {
        page_id: body.page_id,
        analysis_types: body.analysis_types,
    };

    let outcome = run_analysis(
        state.workspace.as_ref(),
        &state.llm_client,
        &state.config.llm_model,
        &state.config.company_context,
        &request,
    )
    .await?;

    Ok(Json(serde_json::to_value(outcome).unwrap_or_default()))
}
