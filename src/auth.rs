//! Bearer token authentication.
//!
//! Access tokens are HS256 JWTs issued by the identity provider. The
//! provider's public "anon" key is itself a JWT without a subject; it is
//! treated as no authentication at all.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{CounselorError, CounselorResult};
use crate::rate_limit::{anonymous_subject, user_subject};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Decode a bearer token. `Ok(None)` is the provider's public anon key.
pub fn resolve_token(config: &AuthConfig, token: &str) -> CounselorResult<Option<AuthUser>> {
    // The anon key carries no audience, so the audience is checked by hand.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| CounselorError::Unauthorized(format!("Invalid token: {}", e)))?;

    let claims = data.claims;
    if claims.role.as_deref() == Some("anon") {
        return Ok(None);
    }
    if claims.aud.as_deref() != Some(config.jwt_audience.as_str()) {
        return Err(CounselorError::Unauthorized("Invalid token audience".to_string()));
    }

    let sub = claims
        .sub
        .ok_or_else(|| CounselorError::Unauthorized("Token has no subject".to_string()))?;
    let user_id = Uuid::parse_str(&sub)
        .map_err(|_| CounselorError::Unauthorized("Token subject is not a user id".to_string()))?;

    Ok(Some(AuthUser {
        user_id: user_id.to_string(),
        email: claims.email,
    }))
}

pub fn verify_token(config: &AuthConfig, token: &str) -> CounselorResult<AuthUser> {
    resolve_token(config, token)?
        .ok_or_else(|| CounselorError::Unauthorized("Anonymous token".to_string()))
}

/// Mint an access token. Used by tests and local tooling.
pub fn issue_token(
    config: &AuthConfig,
    user_id: &str,
    email: Option<&str>,
    ttl: Duration,
) -> CounselorResult<String> {
    let claims = Claims {
        sub: Some(user_id.to_string()),
        email: email.map(str::to_string),
        role: Some("authenticated".to_string()),
        aud: Some(config.jwt_audience.clone()),
        exp: (Utc::now() + ttl).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| CounselorError::ConfigError(format!("Failed to sign token: {}", e)))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = CounselorError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(CounselorError::missing_token)?;
        let user = verify_token(&state.config.auth, token)?;
        state
            .database
            .ensure_user(&user.user_id, user.email.as_deref())
            .await?;
        Ok(user)
    }
}

/// Either a verified user or an anonymous caller identified by address.
#[derive(Debug, Clone)]
pub enum Caller {
    User(AuthUser),
    Anonymous { client_address: String },
}

impl Caller {
    pub fn rate_limit_subject(&self) -> String {
        match self {
            Caller::User(user) => user_subject(&user.user_id),
            Caller::Anonymous { client_address } => anonymous_subject(client_address),
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Caller::User(user) => Some(user),
            Caller::Anonymous { .. } => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = CounselorError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(&parts.headers) {
            match resolve_token(&state.config.auth, token) {
                Ok(Some(user)) => {
                    state
                        .database
                        .ensure_user(&user.user_id, user.email.as_deref())
                        .await?;
                    return Ok(Caller::User(user));
                }
                Ok(None) => debug!("Anon key presented, treating caller as anonymous"),
                Err(e) => {
                    warn!("Rejected bearer token: {}", e);
                    return Err(e);
                }
            }
        }

        let client_address = client_address(parts, state.config.server.trust_proxy);
        if client_address == "unknown" {
            warn!("Anonymous request without a client address");
        }
        Ok(Caller::Anonymous { client_address })
    }
}

/// The socket peer, or with `trust_proxy` the first `X-Forwarded-For` hop
/// then `X-Real-IP` ahead of it.
fn client_address(parts: &Parts, trust_proxy: bool) -> String {
    let peer = || {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    if !trust_proxy {
        return peer().unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let real_ip = || {
        parts
            .headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(str::to_string)
        .or_else(peer)
        .unwrap_or_else(|| "unknown".to_string())
}
