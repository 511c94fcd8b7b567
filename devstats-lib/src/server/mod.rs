//! HTTP surface
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /`, `GET /api` | today's [`StatsResult`](crate::stats::StatsResult) as JSON |
//! | `GET /health` | liveness probe |
//! | `GET /og` | greeting preview image |
//! | `GET /openportal/og` | title and description preview image |
//! | `OPTIONS *` | CORS preflight |
//!
//! Every route sits behind the [`Cors`] middleware. All shared state is
//! read-only after startup except the renderer's logo cache, which is
//! initialized at most once.

mod cors;
pub mod og;
mod routes;

pub use cors::{Cors, CorsPolicy};
pub use og::{OgCard, Renderer};

use crate::Result;
use crate::config::Config;
use crate::stats::Aggregator;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use std::sync::Arc;
use tokio::net::TcpListener;

const LOG_TARGET: &str = "    server";

/// Source of the current instant.
pub type Clock = fn() -> DateTime<Utc>;

/// Everything a request handler needs.
#[derive(Debug)]
pub struct AppState {
    aggregator: Aggregator,
    renderer: Renderer,
    clock: Clock,
}

impl AppState {
    #[must_use]
    pub fn new(aggregator: Aggregator, renderer: Renderer) -> Self {
        Self {
            aggregator,
            renderer,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, typically with a fixed instant.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>, cors: Cors) -> Router {
    Router::new()
        .route("/", get(routes::daily_stats))
        .route("/api", get(routes::daily_stats))
        .route("/health", get(routes::health))
        .route("/og", get(routes::og_greeting))
        .route("/openportal/og", get(routes::og_card))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(from_fn_with_state(Arc::new(cors), cors::enforce))
}

/// Build the router for a loaded configuration.
pub fn app(aggregator: Aggregator, config: &Config) -> Result<Router> {
    let renderer = Renderer::new(config.logo_url.clone(), config.upstream_timeout)?;
    let state = Arc::new(AppState::new(aggregator, renderer));
    Ok(router(state, Cors::new(config.cors_policy, config.allowed_origins.iter().cloned())))
}

/// Serve `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!(target: LOG_TARGET, "listening on http://{addr}");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_app_err("serving HTTP")?;

    log::info!(target: LOG_TARGET, "shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!(target: LOG_TARGET, "Could not listen for Ctrl-C: {e}");
        core::future::pending::<()>().await;
    }
}
