use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{AuthUser, Caller};
use crate::billing::{validate_session_id, CheckoutProvider, CheckoutRequest, CheckoutSession};
use crate::error::{CounselorError, CounselorResult};
use crate::routes::{optional_text, required_text};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub price_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSuccessRequest {
    #[serde(alias = "session_id")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub status: &'static str,
    pub user_id: String,
}

fn provider(state: &AppState) -> CounselorResult<&Arc<dyn CheckoutProvider>> {
    state
        .checkout
        .as_ref()
        .ok_or_else(|| CounselorError::ConfigError("Checkout is not configured".to_string()))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    request: Option<Json<CreateCheckoutRequest>>,
) -> CounselorResult<Json<CheckoutSession>> {
    let checkout = provider(&state)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let stripe = &state.config.stripe;

    let price_id = optional_text(request.price_id.as_deref())
        .unwrap_or(stripe.price_id.as_str())
        .to_string();
    if price_id.is_empty() {
        return Err(CounselorError::ConfigError("No price configured".to_string()));
    }

    let session = checkout
        .create_session(CheckoutRequest {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            price_id,
            success_url: stripe.success_url.clone(),
            cancel_url: stripe.cancel_url.clone(),
        })
        .await?;
    Ok(Json(session))
}

/// Provision the subscription once the provider confirms payment.
///
/// The session is looked up server-side; nothing in the request body is
/// trusted beyond the session id.
pub async fn handle_checkout_success(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CheckoutSuccessRequest>,
) -> CounselorResult<Json<SubscriptionStatus>> {
    let checkout = provider(&state)?;
    let session_id = validate_session_id(required_text(request.session_id.as_deref(), "sessionId")?)?;

    let completed = checkout.retrieve_session(session_id).await?;
    if !completed.paid {
        warn!("Checkout session {} is not paid", session_id);
        return Err(CounselorError::ValidationError(
            "Checkout session has not been paid".to_string(),
        ));
    }

    let user_id = match (&completed.user_id, &completed.customer_email) {
        (Some(user_id), _) => user_id.clone(),
        (None, Some(email)) => state
            .database
            .get_user_by_email(email)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| CounselorError::NotFound(format!("User with email {}", email)))?,
        (None, None) => {
            return Err(CounselorError::CheckoutError(format!(
                "Session {} carries no user reference",
                session_id
            )))
        }
    };

    if let Some(caller) = caller.user() {
        if caller.user_id != user_id {
            warn!(
                "Checkout session {} belongs to {}, not {}",
                session_id, user_id, caller.user_id
            );
            return Err(CounselorError::Unauthorized(
                "Checkout session belongs to another user".to_string(),
            ));
        }
    }

    state
        .database
        .activate_subscription(&user_id, completed.customer_id.as_deref())
        .await?;
    info!("Checkout {} provisioned for {}", session_id, user_id);

    Ok(Json(SubscriptionStatus {
        status: "active",
        user_id,
    }))
}
