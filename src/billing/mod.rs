//! Subscription checkout.

pub mod stripe;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CounselorError, CounselorResult};

pub use stripe::StripeClient;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub email: Option<String>,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
}

/// State of a finished checkout as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub paid: bool,
    /// Our user id, echoed back from `client_reference_id`.
    pub user_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
}

static SESSION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^cs_[A-Za-z0-9_]+$").expect("session id pattern is valid"));

/// Session ids end up in a provider URL path, so only the provider's own
/// `cs_…` shape is accepted.
pub fn validate_session_id(session_id: &str) -> CounselorResult<&str> {
    if SESSION_ID.is_match(session_id) {
        Ok(session_id)
    } else {
        Err(CounselorError::ValidationError(
            "sessionId is not a checkout session id".to_string(),
        ))
    }
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest) -> CounselorResult<CheckoutSession>;

    async fn retrieve_session(&self, session_id: &str) -> CounselorResult<CompletedCheckout>;
}
