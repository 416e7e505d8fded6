// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pull-based pairing page for the Paloma relay.
//!
//! Serves the current pairing challenge as a scannable QR code. The page is
//! strictly pull-based: the connection manager replaces the challenge value
//! through a watch channel and clears it on successful pairing; the page
//! polls itself with a meta refresh until there is nothing left to show.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use paloma_core::{ConnectionState, PalomaError};
use qrcode::render::svg;
use qrcode::QrCode;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Pairing page settings.
#[derive(Debug, Clone)]
pub struct PairServerConfig {
    pub host: String,
    pub port: u16,
}

/// Shared state for the page handlers.
#[derive(Clone)]
struct PairState {
    code: watch::Receiver<Option<String>>,
    state: watch::Receiver<ConnectionState>,
}

/// Builds the pairing page router. Exposed separately for tests.
pub fn router(
    code: watch::Receiver<Option<String>>,
    state: watch::Receiver<ConnectionState>,
) -> Router {
    Router::new()
        .route("/pair", get(pair_page))
        .route("/pair.svg", get(pair_svg))
        .route("/health", get(|| async { "ok" }))
        .with_state(PairState { code, state })
}

/// Binds and serves the pairing page until shutdown.
pub async fn serve(
    config: &PairServerConfig,
    code: watch::Receiver<Option<String>>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
) -> Result<(), PalomaError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PalomaError::Config(format!("failed to bind pairing page to {addr}: {e}")))?;

    info!("pairing page listening on http://{addr}/pair");

    axum::serve(listener, router(code, state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| PalomaError::Internal(format!("pairing page server error: {e}")))?;

    Ok(())
}

/// HTML shell. Auto-refreshes while a challenge is pending or expected.
async fn pair_page(State(state): State<PairState>) -> Html<String> {
    let connection = *state.state.borrow();
    let has_code = state.code.borrow().is_some();

    let body = match (connection, has_code) {
        (ConnectionState::Open, _) => {
            "<p>Paired. This relay is connected; you can close this page.</p>".to_string()
        }
        (_, true) => {
            "<p>Scan this code with the messaging app on your phone:</p>\
             <img src=\"/pair.svg\" alt=\"pairing code\" width=\"280\" height=\"280\">"
                .to_string()
        }
        (other, false) => {
            format!("<p>Waiting for a pairing challenge (session is {other})&hellip;</p>")
        }
    };

    // Refresh until the session is open; afterwards the page is static.
    let refresh = if connection == ConnectionState::Open {
        ""
    } else {
        "<meta http-equiv=\"refresh\" content=\"2\">"
    };

    Html(format!(
        "<!doctype html><html><head><title>Paloma pairing</title>{refresh}</head>\
         <body>{body}</body></html>"
    ))
}

/// QR rendering of the current challenge; 404 when none is live.
async fn pair_svg(State(state): State<PairState>) -> Response {
    let code = state.code.borrow().clone();
    let Some(code) = code else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match QrCode::new(code.as_bytes()) {
        Ok(qr) => {
            let rendered = qr
                .render::<svg::Color>()
                .min_dimensions(280, 280)
                .build();
            ([(header::CONTENT_TYPE, "image/svg+xml")], rendered).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to render pairing code");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
