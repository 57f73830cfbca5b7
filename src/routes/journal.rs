//! Authenticated CRUD for the per-user journal collections.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::database::models::{
    CheckIn, Decision, Goal, Mission, MissionStatus, WarCodeFragment, WarLog,
};
use crate::error::{CounselorError, CounselorResult};
use crate::routes::{optional_text, required_text};
use crate::state::AppState;

const DEFAULT_LOG_LIMIT: i64 = 50;
const TITLE_FROM_DILEMMA_CHARS: usize = 60;

type Created<T> = (StatusCode, Json<T>);

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWarLogRequest {
    pub title: Option<String>,
    #[serde(alias = "content")]
    pub dilemma: Option<String>,
    pub counsel: Option<String>,
    pub outcome: Option<String>,
}

pub async fn list_war_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> CounselorResult<Json<Vec<WarLog>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, 500);
    Ok(Json(state.database.list_war_logs(&user.user_id, limit).await?))
}

pub async fn create_war_log(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateWarLogRequest>,
) -> CounselorResult<Created<WarLog>> {
    let dilemma = required_text(request.dilemma.as_deref(), "dilemma")?;
    let title = match optional_text(request.title.as_deref()) {
        Some(title) => title.to_string(),
        None => dilemma.chars().take(TITLE_FROM_DILEMMA_CHARS).collect(),
    };

    let log = state
        .database
        .create_war_log(
            &user.user_id,
            &title,
            dilemma,
            optional_text(request.counsel.as_deref()),
            optional_text(request.outcome.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

#[derive(Debug, Deserialize)]
pub struct CreateFragmentRequest {
    #[serde(alias = "content")]
    pub fragment: Option<String>,
    pub source: Option<String>,
}

pub async fn list_fragments(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<WarCodeFragment>>> {
    Ok(Json(state.database.list_fragments(&user.user_id).await?))
}

pub async fn create_fragment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateFragmentRequest>,
) -> CounselorResult<Created<WarCodeFragment>> {
    let fragment = required_text(request.fragment.as_deref(), "fragment")?;
    let created = state
        .database
        .create_fragment(
            &user.user_id,
            fragment,
            optional_text(request.source.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMissionRequest {
    pub status: MissionStatus,
}

pub async fn list_missions(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<Mission>>> {
    Ok(Json(state.database.list_missions(&user.user_id).await?))
}

pub async fn create_mission(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateMissionRequest>,
) -> CounselorResult<Created<Mission>> {
    let title = required_text(request.title.as_deref(), "title")?;
    let mission = state
        .database
        .create_mission(
            &user.user_id,
            title,
            optional_text(request.description.as_deref()),
            optional_text(request.due_date.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(mission)))
}

pub async fn update_mission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMissionRequest>,
) -> CounselorResult<Json<Mission>> {
    let mission = state
        .database
        .update_mission_status(&user.user_id, id, request.status)
        .await?;
    Ok(Json(mission))
}

pub async fn delete_mission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> CounselorResult<StatusCode> {
    state.database.delete_mission(&user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: Option<String>,
    pub target_date: Option<String>,
}

pub async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<Goal>>> {
    Ok(Json(state.database.list_goals(&user.user_id).await?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateGoalRequest>,
) -> CounselorResult<Created<Goal>> {
    let title = required_text(request.title.as_deref(), "title")?;
    let goal = state
        .database
        .create_goal(
            &user.user_id,
            title,
            optional_text(request.target_date.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

#[derive(Debug, Deserialize)]
pub struct CreateDecisionRequest {
    pub question: Option<String>,
    pub choice: Option<String>,
    pub rationale: Option<String>,
}

pub async fn list_decisions(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<Decision>>> {
    Ok(Json(state.database.list_decisions(&user.user_id).await?))
}

pub async fn create_decision(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateDecisionRequest>,
) -> CounselorResult<Created<Decision>> {
    let question = required_text(request.question.as_deref(), "question")?;
    let decision = state
        .database
        .create_decision(
            &user.user_id,
            question,
            optional_text(request.choice.as_deref()),
            optional_text(request.rationale.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(decision)))
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckInRequest {
    pub mood: Option<i64>,
    pub energy: Option<i64>,
    pub note: Option<String>,
}

pub async fn list_check_ins(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<CheckIn>>> {
    Ok(Json(state.database.list_check_ins(&user.user_id).await?))
}

pub async fn create_check_in(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCheckInRequest>,
) -> CounselorResult<Created<CheckIn>> {
    let mood = scale_value(request.mood, "mood")?;
    let energy = scale_value(request.energy, "energy")?;
    let check_in = state
        .database
        .create_check_in(
            &user.user_id,
            mood,
            energy,
            optional_text(request.note.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// Check-in ratings are on a 1 to 10 scale.
fn scale_value(value: Option<i64>, field: &str) -> CounselorResult<i64> {
    match value {
        Some(v) if (1..=10).contains(&v) => Ok(v),
        Some(v) => Err(CounselorError::ValidationError(format!(
            "{} must be between 1 and 10, got {}",
            field, v
        ))),
        None => Err(CounselorError::missing_field(field)),
    }
}
