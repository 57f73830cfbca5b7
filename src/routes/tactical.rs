use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{CounselorError, CounselorResult};
use crate::llm::CompletionRequest;
use crate::prompt::build_tactical_prompt;
use crate::rate_limit::user_subject;
use crate::state::AppState;

const DEFAULT_LOGS: i64 = 20;
const MAX_LOGS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Moderate,
    High,
    Critical,
}

/// The model's analysis, validated into shape. Missing lists default to
/// empty; a missing summary or threat level is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticalAnalysis {
    pub summary: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(alias = "threatLevel")]
    pub threat_level: ThreatLevel,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: TacticalAnalysis,
    pub logs_analyzed: usize,
}

pub async fn handle_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    request: Option<Json<AnalysisRequest>>,
) -> CounselorResult<Json<AnalysisResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit.unwrap_or(DEFAULT_LOGS).clamp(1, MAX_LOGS);

    let logs = state.database.list_war_logs(&user.user_id, limit).await?;
    if logs.is_empty() {
        return Err(CounselorError::ValidationError(
            "No war logs to analyze yet".to_string(),
        ));
    }

    state
        .rate_limiter
        .check(&user_subject(&user.user_id))
        .await?
        .into_result()?;

    let profile = state.database.get_profile(&user.user_id).await?;
    let messages = build_tactical_prompt(profile.as_ref(), &logs);
    let raw = state
        .llm
        .complete(CompletionRequest::new(messages).with_temperature(0.4).json())
        .await?;

    let analysis = parse_analysis(&raw)?;
    info!(
        "Tactical analysis for {} over {} logs ({:?})",
        user.user_id,
        logs.len(),
        analysis.threat_level
    );

    Ok(Json(AnalysisResponse {
        analysis,
        logs_analyzed: logs.len(),
    }))
}

pub fn parse_analysis(raw: &str) -> CounselorResult<TacticalAnalysis> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| {
        warn!("Model returned malformed analysis: {}", e);
        CounselorError::LlmError(format!("Malformed analysis: {}", e))
    })
}

/// Models sometimes wrap JSON in a ```json fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
