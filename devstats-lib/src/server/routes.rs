use super::AppState;
use super::og::OgCard;
use crate::stats::ErrorResult;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

const LOG_TARGET: &str = "    routes";

/// `GET /` and `GET /api`
pub async fn daily_stats(State(state): State<Arc<AppState>>) -> Response {
    let now = state.now();

    match state.aggregator().compute_stats(now).await {
        Ok(stats) => {
            log::info!(
                target: LOG_TARGET,
                "served stats for '{}': {} commits, {}",
                stats.username,
                stats.total_commits,
                stats.time_coded
            );
            Json(stats).into_response()
        }
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not compute daily stats: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResult::new(e.to_string()))).into_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GreetingParams {
    name: Option<String>,
}

/// `GET /og?name=`
pub async fn og_greeting(State(state): State<Arc<AppState>>, Query(params): Query<GreetingParams>) -> Response {
    render(&state, &OgCard::greeting(params.name.as_deref())).await
}

#[derive(Debug, Deserialize)]
pub struct CardParams {
    title: Option<String>,
    description: Option<String>,
}

/// `GET /openportal/og?title=&description=`
pub async fn og_card(State(state): State<Arc<AppState>>, Query(params): Query<CardParams>) -> Response {
    render(&state, &OgCard::new(params.title.as_deref(), params.description.as_deref())).await
}

async fn render(state: &AppState, card: &OgCard) -> Response {
    match state.renderer().render(card).await {
        Ok(bytes) => (
            [
                (CONTENT_TYPE, HeaderValue::from_static("image/webp")),
                (CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            log::error!(target: LOG_TARGET, "OG image generation failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate image").into_response()
        }
    }
}

/// Anything not routed.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResult::new("Not Found"))).into_response()
}
