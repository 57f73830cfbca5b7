use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthUser, Caller};
use crate::database::models::{ChatRecord, CombatantProfile, IntensityMode};
use crate::error::{CounselorError, CounselorResult};
use crate::llm::{ChatMessage, CompletionRequest, Role};
use crate::onboarding::{self, OnboardingStage};
use crate::prompt::{build_chat_prompt, ChatPromptInput, PromptVariant};
use crate::routes::required_text;
use crate::state::AppState;

const WAR_LOG_TITLE_CHARS: usize = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, alias = "message")]
    pub content: Option<String>,
    #[serde(default)]
    pub ruthless: bool,
    /// Client-held profile for anonymous callers.
    #[serde(default)]
    pub profile_data: Option<CombatantProfile>,
    /// Record this exchange as a war log.
    #[serde(default)]
    pub log_decision: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<CombatantProfile>,
    pub onboarding: OnboardingStage,
    pub variant: PromptVariant,
}

pub async fn handle_chat(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<ChatRequest>,
) -> CounselorResult<Json<ChatResponse>> {
    let message = required_text(request.content.as_deref(), "content")?;
    if message.chars().count() > state.config.chat.max_message_chars {
        return Err(CounselorError::ValidationError(format!(
            "Message exceeds {} characters",
            state.config.chat.max_message_chars
        )));
    }

    state
        .rate_limiter
        .check(&caller.rate_limit_subject())
        .await?
        .into_result()?;

    let response = match &caller {
        Caller::User(user) => counsel_user(&state, user, message, &request).await?,
        Caller::Anonymous { .. } => counsel_anonymous(&state, message, &request).await?,
    };
    Ok(Json(response))
}

async fn counsel_user(
    state: &AppState,
    user: &AuthUser,
    message: &str,
    request: &ChatRequest,
) -> CounselorResult<ChatResponse> {
    let now = Utc::now();
    let account = state
        .database
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| CounselorError::NotFound(format!("User {}", user.user_id)))?;

    let stored = state.database.get_profile(&user.user_id).await?;
    let advance = onboarding::advance(stored, &user.user_id, message, now);
    if advance.changed {
        state.database.save_profile(&advance.profile).await?;
    }

    let intensity = profile_intensity(&advance.profile).unwrap_or_else(|| account.intensity());
    let history = replay_messages(
        state
            .database
            .recent_chats(&user.user_id, state.config.chat.history_messages)
            .await?,
    );

    let prompt = build_chat_prompt(&ChatPromptInput {
        profile: Some(&advance.profile),
        event: &advance.event,
        intensity,
        ruthless: request.ruthless,
        history: &history,
        message,
    });

    let reply = state
        .llm
        .complete(CompletionRequest::new(prompt.messages))
        .await?;

    state
        .database
        .append_chat_turn(&user.user_id, message, &reply, now)
        .await?;

    if request.log_decision && prompt.variant == PromptVariant::Conversation {
        let title: String = message.chars().take(WAR_LOG_TITLE_CHARS).collect();
        state
            .database
            .create_war_log(&user.user_id, &title, message, Some(&reply), None)
            .await?;
    }

    info!(
        "Counsel delivered to {} ({:?})",
        user.user_id, prompt.variant
    );

    Ok(ChatResponse {
        reply,
        onboarding: advance.stage(),
        variant: prompt.variant,
        user_profile: Some(advance.profile),
    })
}

/// Same state machine, but the profile round-trips through the client and
/// nothing is stored.
async fn counsel_anonymous(
    state: &AppState,
    message: &str,
    request: &ChatRequest,
) -> CounselorResult<ChatResponse> {
    let advance = onboarding::advance(
        request.profile_data.clone(),
        "anonymous",
        message,
        Utc::now(),
    );
    let intensity = profile_intensity(&advance.profile).unwrap_or_default();

    let prompt = build_chat_prompt(&ChatPromptInput {
        profile: Some(&advance.profile),
        event: &advance.event,
        intensity,
        ruthless: request.ruthless,
        history: &[],
        message,
    });

    let reply = state
        .llm
        .complete(CompletionRequest::new(prompt.messages))
        .await?;

    Ok(ChatResponse {
        reply,
        onboarding: advance.stage(),
        variant: prompt.variant,
        user_profile: Some(advance.profile),
    })
}

fn profile_intensity(profile: &CombatantProfile) -> Option<IntensityMode> {
    profile
        .commitment_level
        .as_deref()
        .and_then(IntensityMode::from_str)
}

fn replay_messages(records: Vec<ChatRecord>) -> Vec<ChatMessage> {
    records
        .into_iter()
        .filter_map(|record| {
            Role::from_str(&record.role).map(|role| ChatMessage {
                role,
                content: record.content,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ChatListQuery {
    pub limit: Option<i64>,
}

pub async fn list_chats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ChatListQuery>,
) -> CounselorResult<Json<Vec<ChatRecord>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let mut chats = state.database.recent_chats(&user.user_id, limit).await?;
    chats.reverse();
    Ok(Json(chats))
}
