//! HTTP gateway for Switchyard.
//!
//! Exposes the runtime surface — chat, timeline, reset, health — as a
//! small JSON API for UI and CLI collaborators. Built on Axum.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use switchyard_config::AppConfig;
use switchyard_runtime::Runtime;
use switchyard_telemetry::LogEvent;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

type SharedRuntime = Arc<Runtime>;

/// Build the gateway router over a shared runtime.
pub fn build_router(runtime: SharedRuntime) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/reset", post(reset_handler))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(runtime)
}

/// Bind and serve the gateway until the process exits.
pub async fn serve(
    config: &AppConfig,
    runtime: SharedRuntime,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(listener, build_router(runtime)).await?;
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    agents: usize,
}

async fn health_handler(State(runtime): State<SharedRuntime>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        agents: runtime.agents().len(),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    hint: &'static str,
}

async fn chat_handler(
    State(runtime): State<SharedRuntime>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    match runtime.handle(&request.message).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            error!(error = %e, "Request handling failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "The request could not be completed.".into(),
                    hint: "Reset the runtime and try again.",
                }),
            ))
        }
    }
}

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

async fn logs_handler(
    State(runtime): State<SharedRuntime>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<LogEvent>> {
    let events = match query.limit {
        Some(limit) => runtime.tail(limit),
        None => runtime.logs(),
    };
    Json(events)
}

#[derive(Serialize)]
struct ResetResponse {
    cleared: bool,
}

async fn reset_handler(State(runtime): State<SharedRuntime>) -> Json<ResetResponse> {
    runtime.reset();
    Json(ResetResponse { cleared: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use switchyard_core::engine::{Engine, EngineReply, EngineRequest};
    use switchyard_core::error::EngineError;
    use tower::ServiceExt;

    struct ScriptedEngine {
        replies: Mutex<std::collections::VecDeque<&'static str>>,
    }

    #[async_trait]
    impl Engine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: EngineRequest) -> Result<EngineReply, EngineError> {
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| EngineError::Empty("script exhausted".into()))?;
            Ok(EngineReply {
                content: serde_json::json!(text),
                tool_uses: vec![],
            })
        }
    }

    async fn test_runtime(replies: Vec<&'static str>) -> SharedRuntime {
        let mut config = AppConfig::default();
        config.engine.api_key = Some("test".into());
        let engine = Arc::new(ScriptedEngine {
            replies: Mutex::new(replies.into()),
        });
        Arc::new(
            Runtime::assemble(&config, engine, BTreeMap::new())
                .await
                .unwrap(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_agent_count() {
        let router = build_router(test_runtime(vec![]).await);
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["agents"], 0);
    }

    #[tokio::test]
    async fn chat_returns_the_merged_reply() {
        let router = build_router(test_runtime(vec!["routed answer"]).await);
        let response = router
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["reply"], "routed answer");
    }

    #[tokio::test]
    async fn chat_failure_suggests_a_reset() {
        // Empty script: the engine fails on the first turn.
        let router = build_router(test_runtime(vec![]).await);
        let response = router
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert!(json["hint"].as_str().unwrap().contains("Reset"));
    }

    #[tokio::test]
    async fn logs_respect_the_limit_parameter() {
        let runtime = test_runtime(vec!["one", "two"]).await;
        runtime.handle("first").await.unwrap();
        runtime.handle("second").await.unwrap();

        let router = build_router(runtime);
        let response = router
            .oneshot(
                Request::get("/api/logs?limit=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        let events = json.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["agent"], "Orchestrator");
        assert_eq!(events[0]["stage"], "output");
    }

    #[tokio::test]
    async fn reset_clears_the_timeline() {
        let runtime = test_runtime(vec!["one"]).await;
        runtime.handle("hello").await.unwrap();
        assert!(!runtime.logs().is_empty());

        let router = build_router(runtime.clone());
        let response = router
            .oneshot(Request::post("/api/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(runtime.logs().is_empty());
    }
}
