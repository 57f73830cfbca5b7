use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::database::models::Ritual;
use crate::error::CounselorResult;
use crate::routes::{optional_text, required_text};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRitualRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `ritualName` is what the dashboard sends; `name` is accepted too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRitualRequest {
    #[serde(alias = "name")]
    pub ritual_name: Option<String>,
}

pub async fn list_rituals(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<Vec<Ritual>>> {
    Ok(Json(state.database.list_rituals(&user.user_id).await?))
}

pub async fn create_ritual(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateRitualRequest>,
) -> CounselorResult<(StatusCode, Json<Ritual>)> {
    let name = required_text(request.name.as_deref(), "name")?;
    let ritual = state
        .database
        .create_ritual(
            &user.user_id,
            name,
            optional_text(request.description.as_deref()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ritual)))
}

pub async fn complete_ritual(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CompleteRitualRequest>,
) -> CounselorResult<Json<Ritual>> {
    let name = required_text(request.ritual_name.as_deref(), "ritualName")?;
    let ritual = state.database.complete_ritual(&user.user_id, name).await?;
    info!(
        "Ritual '{}' completed by {} (streak {})",
        ritual.name, user.user_id, ritual.streak
    );
    Ok(Json(ritual))
}
