use axum::{extract::State, response::Json};

use crate::state::AppState;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "warfare-counselor",
        "timestamp": chrono::Utc::now()
    }))
}

pub async fn status_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut status = serde_json::json!({
        "status": "healthy",
        "service": "warfare-counselor",
        "timestamp": chrono::Utc::now(),
        "features": {
            "llm_provider": state.llm.provider_id(),
            "checkout": state.checkout.is_some(),
            "rate_limit": state.config.rate_limit.enabled,
        }
    });

    if state.database.ping().await.is_ok() {
        status["database"] = serde_json::json!({ "status": "healthy" });
    } else {
        status["status"] = serde_json::json!("degraded");
        status["database"] = serde_json::json!({ "status": "error" });
    }

    Json(status)
}
