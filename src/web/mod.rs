//! Operator form served over HTTP.
//!
//! Routes:
//! - `GET /`: the page for the current session
//! - `POST /upload`, `/material`, `/rotate`, `/analyze`, `/submit`: form actions,
//!   each answered with a redirect back to `/`
//! - `GET /photo`: rotated preview of the uploaded photo
//! - `GET /health`

mod error;
mod handlers;
pub mod page;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, ImageSection};
use crate::llm_extract::VisionExtractor;
use crate::session::{Session, SessionStore};
use crate::sheets_hub::RowSink;

pub use error::{AppError, AppResult};

const SESSION_COOKIE: &str = "qc_session";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub extractor: Arc<dyn VisionExtractor>,
    pub sink: Arc<dyn RowSink>,
    pub image: ImageSection,
}

/// The caller's session, attached to every request by [`session_layer`].
#[derive(Clone)]
pub struct OperatorSession {
    pub id: Uuid,
    pub session: Arc<Mutex<Session>>,
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let (id, session, created) = state.sessions.open(session_id(req.headers()));
    req.extensions_mut().insert(OperatorSession { id, session });

    let mut response = next.run(req).await;
    if created {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Build the router with all routes and middleware
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/material", post(handlers::select_material))
        .route("/rotate", post(handlers::rotate))
        .route("/photo", get(handlers::photo))
        .route("/analyze", post(handlers::analyze))
        .route("/submit", post(handlers::submit))
        .layer(from_fn_with_state(state.clone(), session_layer))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the form until Ctrl+C / SIGTERM.
pub async fn run_server(config: &Config, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state, config.server.max_upload_bytes());

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    info!(listen = %config.server.listen, "QC scanner listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests;
