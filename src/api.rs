//! REST API server for the banking assistant
//!
//! Exposes the chain driver over HTTP so a chat front-end can post turns and
//! render the transcript.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::category::Category;
use crate::driver::{ChainDriver, TurnOutcome};
use crate::store::SessionStore;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub outcome: TurnOutcome,
    pub category: Option<Category>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub driver: Arc<ChainDriver>,
    pub sessions: Arc<SessionStore>,
}

/// =============================
/// Helpers - Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Parse a client-supplied session id; free-form ids map to a stable UUID
fn resolve_session_id(value: Option<&str>) -> Uuid {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)),
        _ => Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(req.session_id.as_deref());
    info!(session_id = %session_id, "Received chat turn");

    let session = state.sessions.get_or_create(session_id).await;
    let mut session = session.lock().await;
    let reply = state.driver.respond(&mut session, &req.message).await;

    info!(session_id = %session_id, outcome = ?reply.outcome, "Chat turn completed");

    (
        StatusCode::OK,
        Json(ApiResponse::success(ChatResponse {
            session_id,
            reply: reply.text,
            outcome: reply.outcome,
            category: reply.category,
        })),
    )
}

/// =============================
/// Session Endpoints
/// =============================

async fn get_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(Some(&id));

    match state.sessions.get(session_id).await {
        Some(session) => {
            let snapshot = session.lock().await.clone();
            (StatusCode::OK, Json(ApiResponse::success(snapshot)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Session {} not found", session_id))),
        ),
    }
}

async fn delete_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(Some(&id));

    if state.sessions.remove(session_id).await {
        info!(session_id = %session_id, "Session removed");
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "session_id": session_id }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Session {} not found", session_id))),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(driver: Arc<ChainDriver>, sessions: Arc<SessionStore>) -> Router {
    let state = ApiState { driver, sessions };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    driver: Arc<ChainDriver>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(driver, Arc::new(SessionStore::new()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{CategoryStrategy, PromptChainProcessor};
    use crate::session::GREETING;
    use crate::testing::ScriptedModel;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn make_app(replies: Vec<std::result::Result<&str, &str>>) -> (Router, Arc<SessionStore>) {
        let model = ScriptedModel::new(replies);
        let driver = Arc::new(ChainDriver::new(
            PromptChainProcessor::new(model, CategoryStrategy::Direct),
            true,
        ));
        let sessions = Arc::new(SessionStore::new());
        (create_router(driver, sessions.clone()), sessions)
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_chat(payload: Value) -> Request<Body> {
        Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[test]
    fn test_resolve_session_id() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_session_id(Some(&id.to_string())), id);
        assert_eq!(
            resolve_session_id(Some("browser-tab-7")),
            resolve_session_id(Some("browser-tab-7"))
        );
        assert_ne!(resolve_session_id(None), resolve_session_id(None));
        assert_eq!(resolve_session_id(Some("abc")).get_version_num(), 4);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = make_app(vec![]);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_chat_turn_creates_session() {
        let extraction = json!({
            "status": "needs_info",
            "extracted_data": {"issue": "lost card"},
            "response_to_user": "Which card?"
        })
        .to_string();
        let (app, sessions) = make_app(vec![
            Ok("Customer lost a card"),
            Ok("Card Services"),
            Ok(extraction.as_str()),
        ]);

        let resp = app
            .oneshot(post_chat(json!({"session_id": "tab-1", "message": "I lost my card"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["reply"], json!("Which card?"));
        assert_eq!(body["data"]["outcome"], json!("needs_info"));
        assert_eq!(body["data"]["category"], json!("Card Services"));

        let id = resolve_session_id(Some("tab-1"));
        assert_eq!(body["data"]["session_id"], json!(id.to_string()));

        let session = sessions.get(id).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.collected_data().get("issue"), Some(&json!("lost card")));
    }

    #[tokio::test]
    async fn test_blank_message() {
        let (app, _) = make_app(vec![]);
        let resp = app.oneshot(post_chat(json!({"message": "  "}))).await.unwrap();

        let body = body_json(resp).await;
        assert_eq!(body["data"]["reply"], json!("Please enter a message."));
        assert_eq!(body["data"]["outcome"], json!("empty_input"));
    }

    #[tokio::test]
    async fn test_model_failure_is_reply_text() {
        let (app, _) = make_app(vec![Err("connection refused")]);
        let resp = app
            .oneshot(post_chat(json!({"message": "help"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert!(body["data"]["reply"].as_str().unwrap().starts_with("Error:"));
        assert_eq!(body["data"]["outcome"], json!("failed"));
    }

    #[tokio::test]
    async fn test_get_and_delete_session() {
        let (app, sessions) = make_app(vec![]);
        let id = Uuid::new_v4();
        sessions.get_or_create(id).await;

        let resp = app
            .clone()
            .oneshot(
                Request::get(format!("/api/sessions/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["transcript"][0]["text"], json!(GREETING));

        let resp = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/sessions/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::get(format!("/api/sessions/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
