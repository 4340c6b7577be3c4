//! Bridge HTTP server: routing, auth check, request handling, startup and shutdown.

use crate::config::{self, Config};
use crate::error::BridgeError;
use crate::exec::ScriptRunner;
use crate::reminder::{add_reminder, ReminderRequest};
use crate::token::{self, AuthToken};
use anyhow::{Context, Result};
use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Header carrying the per-run token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// The only routed path.
pub const REMINDER_PATH: &str = "/reminder";

/// Largest request body read after the token check. Bigger bodies are a validation failure.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const PREFLIGHT_METHODS: &str = "POST, OPTIONS";
const PREFLIGHT_HEADERS: &str = "Content-Type, X-Auth-Token";

/// Shared state for request handlers. Read-only after startup.
#[derive(Clone)]
pub struct BridgeState {
    pub token: Arc<AuthToken>,
    pub runner: Arc<dyn ScriptRunner>,
    /// List used when a request has no listName.
    pub default_list: Arc<str>,
    /// Value of `Access-Control-Allow-Origin` on preflight responses.
    pub allowed_origin: HeaderValue,
}

/// Build the router: `POST /reminder`, preflight on any path, 404 for everything else.
pub fn router(state: BridgeState) -> Router {
    Router::new()
        .route(REMINDER_PATH, post(create_reminder).fallback(fallback))
        .fallback(fallback)
        .with_state(state)
}

/// POST /reminder — auth, read and decode the body, validate, run the script, map the outcome.
/// The body is taken raw so nothing is buffered before the token is checked.
async fn create_reminder(State(state): State<BridgeState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    match handle_reminder(&state, &parts.headers, body).await {
        Ok(list) => {
            log::info!("reminder created in list {:?}", list);
            (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
        }
        Err(e) => {
            match &e {
                BridgeError::Unauthorized | BridgeError::NotFound => {
                    log::debug!("rejected request: {}", e)
                }
                BridgeError::MalformedRequest | BridgeError::Validation(_) => {
                    log::warn!("bad reminder request: {}", e)
                }
                BridgeError::Downstream(msg) => log::warn!("reminder script failed: {}", msg),
            }
            e.into_response()
        }
    }
}

async fn handle_reminder(
    state: &BridgeState,
    headers: &HeaderMap,
    body: Body,
) -> Result<String, BridgeError> {
    authorize(&state.token, headers)?;
    let body = body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        log::debug!("reading request body: {}", e);
        BridgeError::Validation(format!(
            "Request body too large (max {} bytes)",
            MAX_BODY_BYTES
        ))
    })?;
    let request = ReminderRequest::from_body(&body)?;
    let reminder = request.validate(&state.default_list)?;
    let list = reminder.list_name.clone();
    let runner = state.runner.clone();
    // The interpreter blocks until it exits; keep it off the async workers.
    tokio::task::spawn_blocking(move || add_reminder(runner.as_ref(), &reminder))
        .await
        .map_err(|e| BridgeError::Downstream(format!("script task failed: {}", e)))??;
    Ok(list)
}

fn authorize(token: &AuthToken, headers: &HeaderMap) -> Result<(), BridgeError> {
    let provided = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token.matches(provided) {
        Ok(())
    } else {
        Err(BridgeError::Unauthorized)
    }
}

/// OPTIONS anywhere is a preflight; anything else is not routed.
async fn fallback(State(state): State<BridgeState>, method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight(&state.allowed_origin);
    }
    log::debug!("no route for {} request", method);
    BridgeError::NotFound.into_response()
}

fn preflight(origin: &HeaderValue) -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone()),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(PREFLIGHT_METHODS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(PREFLIGHT_HEADERS),
            ),
        ],
    )
        .into_response()
}

/// A bound but not yet serving bridge. The token exists (and was persisted, if possible)
/// before the listener is bound.
pub struct Bridge {
    listener: tokio::net::TcpListener,
    state: BridgeState,
    token_file: Option<PathBuf>,
}

impl Bridge {
    /// Generate the token, write the token file, and bind the loopback listener.
    /// Refuses non-loopback bind addresses. A token-file write failure is logged and ignored.
    pub async fn bind(config: &Config, runner: Arc<dyn ScriptRunner>) -> Result<Self> {
        let bind = config.bridge.bind.trim();
        if !config::is_loopback_bind(bind) {
            anyhow::bail!(
                "refusing to bind bridge to {}: only loopback addresses are allowed",
                bind
            );
        }
        let allowed_origin = HeaderValue::from_str(config.bridge.allowed_origin.trim())
            .with_context(|| {
                format!(
                    "invalid allowedOrigin {:?}",
                    config.bridge.allowed_origin
                )
            })?;

        let token = AuthToken::generate()?;
        let token_path = config::resolve_token_path(config);
        let token_file = match token::write_token_file(&token_path, &token) {
            Ok(()) => {
                log::info!("token written to {}", token_path.display());
                Some(token_path)
            }
            Err(e) => {
                log::warn!(
                    "could not write token file ({:#}); the extension will need manual token setup",
                    e
                );
                None
            }
        };

        let bind_addr = if bind.contains(':') {
            format!("[{}]:{}", bind, config.bridge.port)
        } else {
            format!("{}:{}", bind, config.bridge.port)
        };
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("binding to {}", bind_addr))?;

        let state = BridgeState {
            token: Arc::new(token),
            runner,
            default_list: Arc::from(config.reminders.default_list.as_str()),
            allowed_origin,
        };
        Ok(Self {
            listener,
            state,
            token_file,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("reading listener address")
    }

    pub fn token(&self) -> &AuthToken {
        &self.state.token
    }

    /// Path the token was written to, or None if the write failed.
    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<()> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serve until `signal` completes, then close the listener.
    pub async fn serve_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        log::info!("bridge listening on http://{}{}", addr, REMINDER_PATH);
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(signal)
            .await
            .context("bridge server exited")?;
        log::info!("bridge stopped");
        Ok(())
    }
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, closing listener");
}
