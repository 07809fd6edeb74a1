//! HTTP service: `POST /analyze` streams an answer as server-sent events.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use color_eyre::eyre::{Result, eyre};
use futures::stream;
use serde::Deserialize;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use webqa_core::{Pipeline, SilentProgress, present};
use webqa_shared::{PipelineRequest, ServerConfig, WebQaError};

/// Inbound `POST /analyze` body.
#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    url: String,
    question: String,
}

/// Build the service router.
pub(crate) fn router(pipeline: Pipeline, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .with_state(pipeline)
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub(crate) async fn serve(pipeline: Pipeline, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("failed to bind {addr}: {e}"))?;

    info!(%addr, "webqa service listening");
    println!("Serving on http://{addr}");

    axum::serve(listener, router(pipeline, &config.allowed_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("webqa service stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    State(pipeline): State<Pipeline>,
    body: std::result::Result<Json<AnalyzeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    let request = match PipelineRequest::new(&body.url, body.question) {
        Ok(request) => request,
        Err(e) => return error_response(status_for(&e), e.to_string()),
    };

    match pipeline.analyze(&request, &SilentProgress).await {
        Ok(analysis) => {
            let events = present(analysis.state.final_answer, analysis.metrics)
                .map(|event| Event::default().json_data(event));
            Sse::new(stream::iter(events))
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        Err(e) => {
            error!(error = %e, url = %request.url, "analysis failed");
            error_response(status_for(&e), e.to_string())
        }
    }
}

/// 422 for malformed requests, 500 for everything else.
fn status_for(err: &WebQaError) -> StatusCode {
    if err.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Any origin when `allowed_origins` is empty, otherwise exactly those.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
