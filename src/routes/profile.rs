use std::collections::BTreeMap;

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::database::models::CombatantProfile;
use crate::disc::{self, DiscResult, DiscType, QUESTION_COUNT};
use crate::error::{CounselorError, CounselorResult};
use crate::onboarding::extract::extract_answer;
use crate::onboarding::{stage_for, OnboardingStage, ProfileField};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Option<CombatantProfile>,
    pub onboarding: OnboardingStage,
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> CounselorResult<Json<ProfileView>> {
    let profile = state.database.get_profile(&user.user_id).await?;
    Ok(Json(ProfileView {
        onboarding: stage_for(profile.as_ref()),
        profile,
    }))
}

/// Partial update keyed by column name, e.g. `{"occupation": "welder"}`.
///
/// Values pass through the same extraction as chat answers, so an edit can't
/// store something onboarding would have rejected.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<BTreeMap<String, Value>>,
) -> CounselorResult<Json<ProfileView>> {
    if update.is_empty() {
        return Err(CounselorError::ValidationError(
            "No profile fields supplied".to_string(),
        ));
    }

    let now = Utc::now();
    let mut profile = state
        .database
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| CombatantProfile::empty(&user.user_id, now));

    for (key, value) in &update {
        let field = ProfileField::from_str(key).ok_or_else(|| {
            CounselorError::ValidationError(format!("Unknown profile field '{}'", key))
        })?;

        let raw = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            _ => {
                return Err(CounselorError::ValidationError(format!(
                    "Profile field '{}' must be a string or number",
                    key
                )))
            }
        };

        let answer = extract_answer(field, &raw, true).ok_or_else(|| {
            warn!("Rejected profile value for {} from {}", field, user.user_id);
            CounselorError::ValidationError(format!("Invalid value for '{}'", field))
        })?;
        profile.set_field(field, answer);
    }

    profile.sync_completion();
    profile.updated_at = now;
    state.database.save_profile(&profile).await?;
    info!(
        "Profile updated for {} ({} fields)",
        user.user_id,
        update.len()
    );

    Ok(Json(ProfileView {
        onboarding: stage_for(Some(&profile)),
        profile: Some(profile),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DiscQuizRequest {
    pub answers: Vec<DiscType>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

pub async fn submit_disc_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<DiscQuizRequest>,
) -> CounselorResult<Json<DiscResult>> {
    let result = match request.weights {
        Some(weights) => {
            let weights: [f64; QUESTION_COUNT] = weights.try_into().map_err(|w: Vec<f64>| {
                CounselorError::ValidationError(format!(
                    "DISC quiz needs {} weights, got {}",
                    QUESTION_COUNT,
                    w.len()
                ))
            })?;
            disc::score_weighted(&request.answers, &weights)?
        }
        None => disc::score(&request.answers)?,
    };

    let now = Utc::now();
    let mut profile = state
        .database
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| CombatantProfile::empty(&user.user_id, now));
    profile.disc_type = Some(result.primary_type.as_str().to_string());
    profile.updated_at = now;
    state.database.save_profile(&profile).await?;

    info!(
        "DISC type {} recorded for {}",
        result.primary_type.as_str(),
        user.user_id
    );
    Ok(Json(result))
}
