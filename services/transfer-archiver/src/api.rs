use crate::config::ApiConfig;
use crate::invocation::{handle_invocation, InvocationEvent, InvocationResponse};
use crate::processor::EventProcessor;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<EventProcessor>,
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/invoke", post(invoke))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "transfer-archiver"
    }))
}

/// Process one CloudWatch Logs subscription event
async fn invoke(
    State(state): State<AppState>,
    Json(event): Json<InvocationEvent>,
) -> (StatusCode, Json<InvocationResponse>) {
    let response = handle_invocation(&state.processor, &event).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

/// Start the invocation API server
pub async fn start_api_server(state: AppState, config: &ApiConfig) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting transfer archiver API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::Archiver;
    use crate::batch_decoder::encode_batch;
    use crate::config::ArchiveConfig;
    use crate::object_store::testing::InMemoryObjectStore;

    fn state(store: Arc<InMemoryObjectStore>) -> AppState {
        AppState {
            processor: Arc::new(EventProcessor::new(Archiver::new(
                store,
                &ArchiveConfig::default(),
            ))),
        }
    }

    #[tokio::test]
    async fn test_invoke_mirrors_status_code() {
        let store = Arc::new(InMemoryObjectStore::default());

        let (status, Json(body)) =
            invoke(State(state(store.clone())), Json(InvocationEvent::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status_code, 400);

        let data = encode_batch(r#"{"logEvents": [{"message": "{}"}]}"#);
        let (status, Json(body)) =
            invoke(State(state(store)), Json(InvocationEvent::new(data))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.body, "processed 1 log events");
    }
}
