use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::load_config;
use crate::store::{Registry, SessionStore};


/// Cookie name used by the demo routes.
pub const SESSION_NAME: &str = "session-key";

#[derive(Clone)]
struct AppState {
    store: Arc<SessionStore>,
}

fn build_router(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/", get(counter_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { store })
}

/// GET /: bump and return the per-session visit counter.
async fn counter_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match increment_counter(&state.store, headers).await {
        Ok((count, response_headers)) => {
            (StatusCode::OK, response_headers, format!("counter: {}\n", count)).into_response()
        }
        Err(e) => {
            error!("session error: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "session error\n").into_response()
        }
    }
}

async fn increment_counter(store: &SessionStore, request: HeaderMap) -> Result<(i64, HeaderMap)> {
    let mut registry = Registry::new(request);
    let session = store.get(&mut registry, SESSION_NAME).await?;
    let count = session.get::<i64>("counter").unwrap_or(0) + 1;
    session.insert("counter", &count)?;

    let mut response = HeaderMap::new();
    registry.save_all(store, &mut response).await?;
    Ok((count, response))
}

/// GET /logout: delete the session and clear its cookie.
async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = async {
        let mut session = state.store.new_session(&headers, SESSION_NAME).await?;
        session.options.max_age = -1;
        let mut response = HeaderMap::new();
        state.store.save(&mut response, &mut session).await?;
        Ok::<_, crate::errors::SessionError>(response)
    }
    .await;

    match result {
        Ok(response_headers) => (StatusCode::OK, response_headers, "logged out\n").into_response(),
        Err(e) => {
            error!("session error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "session error\n").into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

pub async fn serve(config_path: &Path, listen: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let client = super::open_client(&config.database)?;
    let store = Arc::new(
        config
            .build_store(client)
            .await
            .context("Failed to build session store")?,
    );
    store.start_cleanup(config.sweep_interval()?).await;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("session demo listening on {}", listen);

    axum::serve(listener, build_router(store.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await
        .context("HTTP server error")?;

    store.close().await;
    Ok(())
}
