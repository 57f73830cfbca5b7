use std::sync::Arc;

use crate::billing::{CheckoutProvider, StripeClient};
use crate::config::AppConfig;
use crate::database::Database;
use crate::error::CounselorResult;
use crate::llm::{CompletionProvider, OpenAiClient};
use crate::rate_limit::RateLimiter;

/// Shared, immutable handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Database,
    pub rate_limiter: RateLimiter,
    pub llm: Arc<dyn CompletionProvider>,
    /// `None` when no payment provider is configured.
    pub checkout: Option<Arc<dyn CheckoutProvider>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        database: Database,
        llm: Arc<dyn CompletionProvider>,
        checkout: Option<Arc<dyn CheckoutProvider>>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(database.clone(), &config.rate_limit);
        Self {
            config: Arc::new(config),
            database,
            rate_limiter,
            llm,
            checkout,
        }
    }

    /// Wire the real OpenAI and Stripe clients from configuration.
    pub fn from_config(config: AppConfig, database: Database) -> CounselorResult<Self> {
        let llm: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(&config.openai)?);
        let checkout: Option<Arc<dyn CheckoutProvider>> = if config.checkout_enabled() {
            Some(Arc::new(StripeClient::new(&config.stripe)))
        } else {
            None
        };
        Ok(Self::new(config, database, llm, checkout))
    }
}
