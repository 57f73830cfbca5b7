use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;
use warfare_counselor::auth::{issue_token, Claims};
use warfare_counselor::billing::CheckoutProvider;

mod common;
use common::*;

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app(test_config(), ScriptedProvider::default()).await;
    let response = send(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn test_status_reports_features() {
    let app = spawn_app(test_config(), ScriptedProvider::default()).await;
    let response = send(&app.router, Method::GET, "/status", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["database"]["status"], "healthy");
    assert_eq!(response.body["features"]["llm_provider"], "scripted");
    assert_eq!(response.body["features"]["checkout"], false);
}

#[tokio::test]
async fn test_chat_requires_message() {
    let app = spawn_app(test_config(), ScriptedProvider::default()).await;
    let response = send(&app.router, Method::POST, "/ai-chat", None, Some(json!({}))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("content"));
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn test_onboarding_over_chat() {
    let config = unlimited_config();
    let (user_id, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::new(&["Who are you?", "How old?"])).await;

    let first = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        Some(&token),
        Some(json!({ "content": "hello?" })),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["reply"], "Who are you?");
    assert_eq!(first.body["variant"]["variant"], "first_contact");
    assert_eq!(first.body["onboarding"]["stage"], "collecting");
    assert_eq!(first.body["onboarding"]["field"], "codename");

    let second = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        Some(&token),
        Some(json!({ "message": "Reaper" })),
    )
    .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["userProfile"]["codename"], "Reaper");
    assert_eq!(second.body["variant"]["variant"], "onboarding");
    assert_eq!(second.body["variant"]["field"], "age");
    assert!(app.llm.last_system_prompt().contains("question 2 of 12"));

    let user = app.state.database.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.codename.as_deref(), Some("Reaper"));
    assert!(!user.onboarding_complete);

    // Both exchanges are stored; the second prompt replays the first.
    let chats = app.state.database.recent_chats(&user_id, 10).await.unwrap();
    assert_eq!(chats.len(), 4);
    let second_request = &app.llm.requests()[1];
    assert!(second_request
        .messages
        .iter()
        .any(|m| m.content == "Who are you?"));
}

#[tokio::test]
async fn test_anonymous_chat_round_trips_profile() {
    let app = spawn_app(unlimited_config(), ScriptedProvider::default()).await;

    let response = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        None,
        Some(json!({
            "content": "34",
            "profileData": { "codename": "Ghost" }
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userProfile"]["codename"], "Ghost");
    assert_eq!(response.body["userProfile"]["age"], 34);
    assert_eq!(response.body["onboarding"]["field"], "physical_condition");
}

#[tokio::test]
async fn test_chat_rate_limited_after_three_requests() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    for _ in 0..3 {
        let ok = send(
            &app.router,
            Method::POST,
            "/ai-chat",
            Some(&token),
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(ok.status, StatusCode::OK);
    }

    let limited = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        Some(&token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.body["waitTime"].as_u64().unwrap() > 0);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
    assert_eq!(app.llm.requests().len(), 3);
}

#[tokio::test]
async fn test_llm_failure_is_server_error() {
    let app = spawn_app(unlimited_config(), ScriptedProvider::failing()).await;
    let response = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        None,
        Some(json!({ "content": "hello" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_collections_require_auth() {
    let app = spawn_app(test_config(), ScriptedProvider::default()).await;

    for uri in ["/rituals", "/war-logs", "/profile", "/missions", "/chats"] {
        let response = send(&app.router, Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let bad = send(&app.router, Method::GET, "/rituals", Some("not.a.jwt"), None).await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ritual_lifecycle() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let created = send(
        &app.router,
        Method::POST,
        "/rituals",
        Some(&token),
        Some(json!({ "name": "Cold shower", "description": "5 minutes" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["streak"], 0);

    let completed = send(
        &app.router,
        Method::PATCH,
        "/rituals",
        Some(&token),
        Some(json!({ "ritualName": "Cold shower" })),
    )
    .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.body["streak"], 1);
    assert!(completed.body["last_completed_at"].is_string());

    let missing = send(
        &app.router,
        Method::PATCH,
        "/rituals",
        Some(&token),
        Some(json!({ "ritualName": "Ice bath" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_war_log_title_defaults_to_dilemma() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let created = send(
        &app.router,
        Method::POST,
        "/war-logs",
        Some(&token),
        Some(json!({ "content": "Quit the job or stay?" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "Quit the job or stay?");

    let listed = send(&app.router, Method::GET, "/war-logs", Some(&token), None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mission_status_and_delete() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let (_, other_token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let created = send(
        &app.router,
        Method::POST,
        "/missions",
        Some(&token),
        Some(json!({ "title": "Run a marathon", "dueDate": "2027-04-01" })),
    )
    .await;
    let id = created.body["id"].as_i64().unwrap();
    let uri = format!("/missions/{}", id);

    let foreign = send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&other_token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let updated = send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(updated.body["status"], "completed");

    let deleted = send(&app.router, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_check_in_scale_validated() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let bad = send(
        &app.router,
        Method::POST,
        "/check-ins",
        Some(&token),
        Some(json!({ "mood": 11, "energy": 5 })),
    )
    .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let good = send(
        &app.router,
        Method::POST,
        "/check-ins",
        Some(&token),
        Some(json!({ "mood": 7, "energy": 4, "note": "slept badly" })),
    )
    .await;
    assert_eq!(good.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_profile_update_validates_values() {
    let config = test_config();
    let (user_id, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let updated = send(
        &app.router,
        Method::PUT,
        "/profile",
        Some(&token),
        Some(json!({ "codename": "Viper", "age": 31, "commitment_level": "push me hard" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["profile"]["age"], 31);
    assert_eq!(updated.body["profile"]["commitment_level"], "intense");
    assert_eq!(updated.body["onboarding"]["field"], "physical_condition");

    let user = app.state.database.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.intensity_mode, "intense");

    let bad_age = send(
        &app.router,
        Method::PUT,
        "/profile",
        Some(&token),
        Some(json!({ "age": 7 })),
    )
    .await;
    assert_eq!(bad_age.status, StatusCode::BAD_REQUEST);

    let unknown = send(
        &app.router,
        Method::PUT,
        "/profile",
        Some(&token),
        Some(json!({ "favourite_colour": "red" })),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disc_quiz_stored_on_profile() {
    let config = test_config();
    let (user_id, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let response = send(
        &app.router,
        Method::POST,
        "/profile/disc",
        Some(&token),
        Some(json!({ "answers": ["D", "D", "D", "D", "D"] })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["primaryType"], "D");
    assert_eq!(response.body["scores"]["D"], 100);
    assert!(response.body.get("secondaryType").is_none());

    let profile = app.state.database.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(profile.disc_type.as_deref(), Some("D"));

    let short = send(
        &app.router,
        Method::POST,
        "/profile/disc",
        Some(&token),
        Some(json!({ "answers": ["D", "I"] })),
    )
    .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nudge_is_persisted() {
    let config = unlimited_config();
    let (user_id, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::new(&["  Two days lost. Reclaim today.  "])).await;

    let response = send(
        &app.router,
        Method::POST,
        "/hdd-nudge",
        Some(&token),
        Some(json!({ "habit": "Cold shower", "missedDays": 2 })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Two days lost. Reclaim today.");
    assert_eq!(response.body["nudge"]["missed_days"], 2);
    assert_eq!(response.body["nudge"]["user_id"], user_id.as_str());
}

#[tokio::test]
async fn test_tactical_analysis() {
    let config = unlimited_config();
    let (user_id, token) = new_user(&config);
    let analysis = r#"{"summary":"Drifting.","patterns":["late nights"],"strengths":[],"weaknesses":["focus"],"recommendations":["sleep"],"threat_level":"moderate"}"#;
    let app = spawn_app(config, ScriptedProvider::new(&[analysis])).await;

    let empty = send(&app.router, Method::POST, "/tactical-analysis", Some(&token), None).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    app.state
        .database
        .create_war_log(&user_id, "Job", "Quit or stay", None, None)
        .await
        .unwrap();

    let response = send(
        &app.router,
        Method::POST,
        "/tactical-analysis",
        Some(&token),
        Some(json!({ "limit": 5 })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["analysis"]["threat_level"], "moderate");
    assert_eq!(response.body["logsAnalyzed"], 1);
    assert!(app.llm.requests()[0].json_mode);
}

#[tokio::test]
async fn test_checkout_unconfigured() {
    let config = test_config();
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let response = send(&app.router, Method::POST, "/create-checkout", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_checkout_flow_activates_subscription() {
    let config = test_config();
    let (user_id, token) = new_user(&config);
    let checkout = Arc::new(FakeCheckout::paid_for(&user_id));
    let provider: Arc<dyn CheckoutProvider> = checkout.clone();
    let app = spawn_app_with_checkout(config, ScriptedProvider::default(), Some(provider)).await;

    let session = send(&app.router, Method::POST, "/create-checkout", Some(&token), None).await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.body["sessionId"], "cs_test_1");
    assert_eq!(checkout.created.lock().unwrap()[0].price_id, "price_default");

    let success = send(
        &app.router,
        Method::POST,
        "/handle-checkout-success",
        Some(&token),
        Some(json!({ "sessionId": "cs_test_1" })),
    )
    .await;
    assert_eq!(success.status, StatusCode::OK);
    assert_eq!(success.body["status"], "active");

    let user = app.state.database.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.subscription_status, "active");
    assert_eq!(user.stripe_customer_id.as_deref(), Some("cus_123"));
}

#[tokio::test]
async fn test_checkout_success_for_another_user_rejected() {
    let config = test_config();
    let (owner_id, _) = new_user(&config);
    let (_, intruder_token) = new_user(&config);
    let provider: Arc<dyn CheckoutProvider> = Arc::new(FakeCheckout::paid_for(&owner_id));
    let app = spawn_app_with_checkout(config, ScriptedProvider::default(), Some(provider)).await;

    let response = send(
        &app.router,
        Method::POST,
        "/handle-checkout-success",
        Some(&intruder_token),
        Some(json!({ "sessionId": "cs_test_1" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_limit_ignores_spoofed_forwarded_for() {
    let app = spawn_app(test_config(), ScriptedProvider::default()).await;
    let chat = || Some(json!({ "content": "hello" }));

    for i in 0..3 {
        let forwarded = format!("198.51.100.{}", i);
        let ok = send_from(
            &app.router,
            Method::POST,
            "/ai-chat",
            None,
            chat(),
            "192.0.2.50:52000",
            Some(&forwarded),
        )
        .await;
        assert_eq!(ok.status, StatusCode::OK);
    }

    let limited = send_from(
        &app.router,
        Method::POST,
        "/ai-chat",
        None,
        chat(),
        "192.0.2.50:52001",
        Some("198.51.100.99"),
    )
    .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let other_peer = send_from(
        &app.router,
        Method::POST,
        "/ai-chat",
        None,
        chat(),
        "192.0.2.51:52000",
        Some("198.51.100.0"),
    )
    .await;
    assert_eq!(other_peer.status, StatusCode::OK);
    assert_eq!(app.llm.requests().len(), 4);
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    let mut config = test_config();
    config.server.trust_proxy = true;
    let app = spawn_app(config, ScriptedProvider::default()).await;
    let chat = || Some(json!({ "content": "hello" }));

    for forwarded in ["198.51.100.1", "198.51.100.2", "198.51.100.3", "198.51.100.4"] {
        let ok = send_from(
            &app.router,
            Method::POST,
            "/ai-chat",
            None,
            chat(),
            "10.0.0.2:443",
            Some(forwarded),
        )
        .await;
        assert_eq!(ok.status, StatusCode::OK);
    }

    for _ in 0..2 {
        let ok = send_from(
            &app.router,
            Method::POST,
            "/ai-chat",
            None,
            chat(),
            "10.0.0.2:443",
            Some("198.51.100.1"),
        )
        .await;
        assert_eq!(ok.status, StatusCode::OK);
    }
    let limited = send_from(
        &app.router,
        Method::POST,
        "/ai-chat",
        None,
        chat(),
        "10.0.0.2:443",
        Some("198.51.100.1, 10.0.0.2"),
    )
    .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_expired_token_on_chat_is_unauthorized() {
    let config = unlimited_config();
    let token = issue_token(
        &config.auth,
        &Uuid::new_v4().to_string(),
        None,
        Duration::hours(-2),
    )
    .unwrap();
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let response = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        Some(&token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn test_anon_key_on_chat_is_anonymous() {
    let config = unlimited_config();
    let anon_key = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: None,
            email: None,
            role: Some("anon".to_string()),
            aud: None,
            exp: (Utc::now() + Duration::days(365)).timestamp(),
        },
        &EncodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
    )
    .unwrap();
    let app = spawn_app(config, ScriptedProvider::default()).await;

    let response = send(
        &app.router,
        Method::POST,
        "/ai-chat",
        Some(&anon_key),
        Some(json!({
            "content": "34",
            "profileData": { "codename": "Ghost" }
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userProfile"]["age"], 34);

    let collections = send(&app.router, Method::GET, "/rituals", Some(&anon_key), None).await;
    assert_eq!(collections.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accounts_sharing_an_email_both_served() {
    let config = test_config();
    let tokens: Vec<String> = (0..2)
        .map(|_| {
            issue_token(
                &config.auth,
                &Uuid::new_v4().to_string(),
                Some("shared@example.com"),
                Duration::hours(1),
            )
            .unwrap()
        })
        .collect();
    let app = spawn_app(config, ScriptedProvider::default()).await;

    for token in &tokens {
        for _ in 0..2 {
            let response = send(&app.router, Method::GET, "/rituals", Some(token), None).await;
            assert_eq!(response.status, StatusCode::OK);
        }
    }
}

#[tokio::test]
async fn test_checkout_success_rejects_malformed_session_id() {
    let config = test_config();
    let (user_id, token) = new_user(&config);
    let provider: Arc<dyn CheckoutProvider> = Arc::new(FakeCheckout::paid_for(&user_id));
    let app = spawn_app_with_checkout(config, ScriptedProvider::default(), Some(provider)).await;

    let response = send(
        &app.router,
        Method::POST,
        "/handle-checkout-success",
        Some(&token),
        Some(json!({ "sessionId": "../customers" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let user = app.state.database.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.subscription_status, "inactive");
}

#[tokio::test]
async fn test_prompt_replays_configured_message_count() {
    let mut config = unlimited_config();
    config.chat.history_messages = 2;
    let (_, token) = new_user(&config);
    let app = spawn_app(config, ScriptedProvider::default()).await;

    for content in ["Reaper", "29", "Fit", "Every morning"] {
        let response = send(
            &app.router,
            Method::POST,
            "/ai-chat",
            Some(&token),
            Some(json!({ "content": content })),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // System prompt, one stored exchange, then the new message.
    let last = app.llm.requests().pop().unwrap();
    assert_eq!(last.messages.len(), 4);
    assert_eq!(last.messages[3].content, "Every morning");
}
