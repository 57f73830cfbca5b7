//! HTTP surface. One module per former edge function, plus the profile and
//! journal collections the frontend used to hit directly.

pub mod chat;
pub mod checkout;
pub mod health;
pub mod journal;
pub mod nudge;
pub mod profile;
pub mod rituals;
pub mod tactical;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{CounselorError, CounselorResult};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/status", get(health::status_endpoint))
        .route("/ai-chat", post(chat::handle_chat))
        .route("/chats", get(chat::list_chats))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/profile/disc", post(profile::submit_disc_quiz))
        .route(
            "/rituals",
            get(rituals::list_rituals)
                .post(rituals::create_ritual)
                .patch(rituals::complete_ritual),
        )
        .route(
            "/war-logs",
            get(journal::list_war_logs).post(journal::create_war_log),
        )
        .route(
            "/war-code-fragments",
            get(journal::list_fragments).post(journal::create_fragment),
        )
        .route(
            "/missions",
            get(journal::list_missions).post(journal::create_mission),
        )
        .route(
            "/missions/:id",
            patch(journal::update_mission).delete(journal::delete_mission),
        )
        .route("/goals", get(journal::list_goals).post(journal::create_goal))
        .route(
            "/decisions",
            get(journal::list_decisions).post(journal::create_decision),
        )
        .route(
            "/check-ins",
            get(journal::list_check_ins).post(journal::create_check_in),
        )
        .route("/hdd-nudge", post(nudge::handle_nudge))
        .route("/tactical-analysis", post(tactical::handle_analysis))
        .route("/create-checkout", post(checkout::create_checkout))
        .route(
            "/handle-checkout-success",
            post(checkout::handle_checkout_success),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

/// Trimmed, non-empty required text field.
pub(crate) fn required_text<'a>(value: Option<&'a str>, field: &str) -> CounselorResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CounselorError::missing_field(field))
}

/// Trimmed optional text; blank becomes `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
