// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobooth Server — the axum HTTP surface over the print, settings,
// pattern, mail and Drive services, plus the `photobooth` CLI.

pub mod cli;
pub mod drive;
pub mod error;
pub mod mail;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use photobooth_core::AppConfig;
use photobooth_core::error::{PhotoboothError, Result};

use crate::state::AppState;

/// Build the full application router for `state`.
pub fn router(state: AppState) -> Router {
    let uploads = state.config.uploads_dir();
    let cors = cors_layer(&state.config.allowed_origins);
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/", get(|| async { "Backend is running" }))
        // Print
        .route("/api/printers", get(routes::print::list_printers))
        .route("/api/print", post(routes::print::print))
        .route("/api/print/test", post(routes::print::print_test))
        .route("/api/print/reprint", post(routes::print::reprint))
        // Settings
        .route(
            "/api/settings",
            get(routes::settings::get_settings).post(routes::settings::update_settings),
        )
        .route("/api/settings/live", get(routes::settings::live))
        // Patterns
        .route(
            "/api/patterns",
            get(routes::patterns::list_patterns).post(routes::patterns::add_pattern),
        )
        .route("/api/patterns/{id}", delete(routes::patterns::delete_pattern))
        // Uploads and mail
        .route("/upload", post(routes::uploads::upload_image))
        .route("/images", get(routes::uploads::list_images))
        .route("/send-message", post(routes::mail::send_message))
        .route("/send-photo-strip", post(routes::mail::send_photo_strip))
        .route("/saved-emails", get(routes::mail::saved_emails))
        // Drive
        .route("/api/drive/upload", post(routes::drive::upload))
        .route("/api/drive/test", get(routes::drive::test_connection))
        .route(
            "/api/drive/delete/{file_id}",
            delete(routes::drive::delete_file),
        )
        // Static uploads
        .nest_service("/uploads", ServeDir::new(&uploads))
        .fallback_service(ServeDir::new(&uploads))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Run the server until Ctrl+C or SIGTERM.
pub async fn serve(config: AppConfig) -> Result<()> {
    for dir in [
        config.uploads_dir(),
        config.temp_dir(),
        config.catalog_dir(),
        config.saved_emails_dir(),
    ] {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PhotoboothError::Filesystem(format!("create {}: {e}", dir.display()))
        })?;
    }

    let address = format!("0.0.0.0:{}", config.port);
    info!(data_dir = %config.data_dir.display(), "Initializing state...");
    let app = router(AppState::from_config(config));

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
