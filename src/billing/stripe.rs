//! Stripe Checkout Sessions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{validate_session_id, CheckoutProvider, CheckoutRequest, CheckoutSession, CompletedCheckout};
use crate::config::StripeConfig;
use crate::error::{CounselorError, CounselorResult};

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    client_reference_id: Option<String>,
    customer: Option<String>,
    customer_details: Option<CustomerDetails>,
    customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> CounselorResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| CounselorError::CheckoutError(format!("Invalid response: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        warn!("Stripe returned {}: {}", status, message);
        Err(CounselorError::CheckoutError(message))
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_session(&self, request: CheckoutRequest) -> CounselorResult<CheckoutSession> {
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("line_items[0][price]", request.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", request.success_url.as_str()),
            ("cancel_url", request.cancel_url.as_str()),
            ("client_reference_id", request.user_id.as_str()),
        ];
        if let Some(email) = request.email.as_deref() {
            form.push(("customer_email", email));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;

        let session: SessionObject = Self::parse(response).await?;
        info!("Created checkout session {} for {}", session.id, request.user_id);
        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> CounselorResult<CompletedCheckout> {
        let session_id = validate_session_id(session_id)?;
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        let session: SessionObject = Self::parse(response).await?;
        Ok(CompletedCheckout {
            paid: session.payment_status.as_deref() == Some("paid"),
            user_id: session.client_reference_id,
            customer_id: session.customer,
            customer_email: session
                .customer_details
                .and_then(|details| details.email)
                .or(session.customer_email),
            session_id: session.id,
        })
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
