//! Service configuration.
//!
//! Layered as: built-in defaults, an optional TOML file, `COUNSELOR__*`
//! environment variables, then the bare variable names the hosted functions
//! used (`DATABASE_URL`, `SUPABASE_JWT_SECRET`, `OPENAI_API_KEY`,
//! `STRIPE_SECRET_KEY`).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::info;

use crate::error::{CounselorError, CounselorResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub openai: OpenAiConfig,
    pub stripe: StripeConfig,
    pub rate_limit: RateLimitConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Key anonymous callers on `X-Forwarded-For`/`X-Real-IP`. Only enable
    /// behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret the identity provider signs access tokens with.
    pub jwt_secret: String,
    pub jwt_audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Empty disables the checkout routes.
    pub secret_key: String,
    pub base_url: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Stored messages replayed into each prompt.
    pub history_messages: i64,
    pub max_message_chars: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                trust_proxy: false,
            },
            database: DatabaseConfig {
                url: "sqlite://warfare_counselor.db".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                jwt_audience: "authenticated".to_string(),
            },
            openai: OpenAiConfig {
                api_key: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
                max_tokens: 600,
            },
            stripe: StripeConfig {
                secret_key: String::new(),
                base_url: "https://api.stripe.com/v1".to_string(),
                price_id: String::new(),
                success_url: "http://localhost:5173/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                    .to_string(),
                cancel_url: "http://localhost:5173/pricing".to_string(),
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                max_requests: 3,
                window_secs: 60,
            },
            chat: ChatConfig {
                history_messages: 10,
                max_message_chars: 4000,
            },
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> CounselorResult<Self> {
        let defaults = config::Config::try_from(&AppConfig::default()).map_err(config_error)?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!("Loading configuration file {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("COUNSELOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())
            .and_then(|b| b.set_override_option("auth.jwt_secret", env::var("SUPABASE_JWT_SECRET").ok()))
            .and_then(|b| b.set_override_option("openai.api_key", env::var("OPENAI_API_KEY").ok()))
            .and_then(|b| b.set_override_option("stripe.secret_key", env::var("STRIPE_SECRET_KEY").ok()))
            .map_err(config_error)?
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }

    /// Checked before serving; `migrate` runs without the API secrets.
    pub fn validate(&self) -> CounselorResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(CounselorError::ConfigError(
                "auth.jwt_secret must be set".to_string(),
            ));
        }
        if self.openai.api_key.trim().is_empty() {
            return Err(CounselorError::ConfigError(
                "openai.api_key must be set".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(CounselorError::ConfigError(
                "rate_limit.max_requests and rate_limit.window_secs must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(CounselorError::ConfigError(
                "database.max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn checkout_enabled(&self) -> bool {
        !self.stripe.secret_key.trim().is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn config_error(err: config::ConfigError) -> CounselorError {
    CounselorError::ConfigError(err.to_string())
}
