use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::database::models::{HabitNudge, IntensityMode};
use crate::error::{CounselorError, CounselorResult};
use crate::llm::CompletionRequest;
use crate::prompt::build_nudge_prompt;
use crate::rate_limit::user_subject;
use crate::routes::{optional_text, required_text};
use crate::state::AppState;

const NUDGE_MAX_TOKENS: u32 = 120;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeRequest {
    pub habit: Option<String>,
    #[serde(default)]
    pub missed_days: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NudgeResponse {
    pub message: String,
    pub nudge: HabitNudge,
}

pub async fn handle_nudge(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<NudgeRequest>,
) -> CounselorResult<Json<NudgeResponse>> {
    let habit = required_text(request.habit.as_deref(), "habit")?;
    let missed_days = request.missed_days.unwrap_or(1);
    if missed_days < 1 {
        return Err(CounselorError::ValidationError(
            "missedDays must be at least 1".to_string(),
        ));
    }

    state
        .rate_limiter
        .check(&user_subject(&user.user_id))
        .await?
        .into_result()?;

    let account = state.database.get_user(&user.user_id).await?;
    let codename = account.as_ref().and_then(|a| a.codename.clone());
    let intensity = account
        .as_ref()
        .map(|a| a.intensity())
        .unwrap_or(IntensityMode::Standard);

    let messages = build_nudge_prompt(
        habit,
        missed_days,
        optional_text(request.reason.as_deref()),
        codename.as_deref(),
        intensity,
    );
    let message = state
        .llm
        .complete(CompletionRequest::new(messages).with_max_tokens(NUDGE_MAX_TOKENS))
        .await?
        .trim()
        .to_string();

    if message.is_empty() {
        return Err(CounselorError::LlmError("Empty nudge from model".to_string()));
    }

    let nudge = state
        .database
        .create_nudge(&user.user_id, habit, missed_days, &message)
        .await?;
    info!("Nudge {} issued to {} for '{}'", nudge.id, user.user_id, habit);

    Ok(Json(NudgeResponse { message, nudge }))
}
