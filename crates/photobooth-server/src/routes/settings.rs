// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booth settings: plain JSON read/write plus a live WebSocket channel that
// pushes every change to all connected clients.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use photobooth_core::types::Settings;
use photobooth_store::SettingsService;

use crate::error::ApiResult;
use crate::state::AppState;

/// Event name pushed to clients after a change.
pub const SETTINGS_UPDATED: &str = "settings-updated";
/// Event name clients send to change settings.
pub const SETTINGS_UPDATE: &str = "settings-update";

#[derive(Debug, Serialize)]
struct ServerEvent<'a> {
    event: &'static str,
    settings: &'a Settings,
}

#[derive(Debug, Deserialize)]
struct ClientEvent {
    event: String,
    #[serde(default)]
    settings: Value,
}

/// `GET /api/settings`
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Settings>> {
    Ok(Json(state.settings.current().await?))
}

/// `POST /api/settings`: merge a partial update and broadcast the result.
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Settings>> {
    let Json(patch) = payload?;
    let saved = state.settings.update(&patch).await?;
    info!(selected_printer = %saved.selected_printer, "settings updated over HTTP");
    Ok(Json(saved))
}

/// `GET /api/settings/live`
pub async fn live(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state))
}

async fn handle_live_socket(mut socket: WebSocket, state: AppState) {
    let mut updates = state.settings.notifier().subscribe();

    // New clients get the current settings straight away.
    match state.settings.current().await {
        Ok(current) => {
            if send_settings(&mut socket, &current).await.is_err() {
                return;
            }
        }
        Err(e) => warn!(error = %e, "could not load settings for live client"),
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(settings) => {
                    if send_settings(&mut socket, &settings).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live settings client lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = apply_client_event(&state.settings, text.as_str()).await {
                        warn!(error = %e, "rejected live settings update");
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("live settings client disconnected");
}

async fn send_settings(socket: &mut WebSocket, settings: &Settings) -> Result<(), axum::Error> {
    let text = serde_json::to_string(&ServerEvent {
        event: SETTINGS_UPDATED,
        settings,
    })
    .map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}

/// Apply a `settings-update` message from a live client.
///
/// Other event names are ignored.  The saved settings reach every client,
/// the sender included, through the notifier.
async fn apply_client_event(
    service: &SettingsService,
    text: &str,
) -> photobooth_core::error::Result<Option<Settings>> {
    let event: ClientEvent = serde_json::from_str(text)?;
    if event.event != SETTINGS_UPDATE {
        debug!(event = %event.event, "ignoring live client event");
        return Ok(None);
    }
    service.update(&event.settings).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use photobooth_store::{MemorySettingsStore, SettingsNotifier};

    use crate::test_support::{Behaviour, Fixture, get_json, send_json};

    fn service() -> SettingsService {
        SettingsService::new(
            Arc::new(MemorySettingsStore::default()),
            SettingsNotifier::new(),
        )
    }

    #[tokio::test]
    async fn get_returns_defaults() {
        let fx = Fixture::new(&[], &[]);
        let (status, body) = get_json(fx.router(), "/api/settings").await;
        assert_eq!(status, 200);
        assert_eq!(body["framesPerStrip"], 4);
        assert_eq!(body["selectedPrinter"], "HP Deskjet");
    }

    #[tokio::test]
    async fn post_merges_and_broadcasts() {
        let fx = Fixture::new(&[], &[]);
        let mut rx = fx.state.settings.notifier().subscribe();

        let (status, body) = send_json(
            fx.router(),
            "POST",
            "/api/settings",
            json!({ "printCount": 1, "camera": { "type": "dslr" } }),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["printCount"], 1);
        assert_eq!(body["camera"]["type"], "dslr");
        assert_eq!(body["framesPerStrip"], 4);

        let pushed = rx.recv().await.expect("broadcast");
        assert_eq!(pushed.print_count, 1);
    }

    #[tokio::test]
    async fn non_object_update_is_rejected() {
        let fx = Fixture::new(&[], &[]);
        let (status, _) = send_json(fx.router(), "POST", "/api/settings", json!([1, 2])).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn out_of_range_frame_count_is_rejected_and_test_print_still_works() {
        let fx = Fixture::new(&["HP DeskJet 2700 series"], &[Behaviour::Succeed]);
        let (status, body) = send_json(
            fx.router(),
            "POST",
            "/api/settings",
            json!({ "framesPerStrip": 4_000_000_000u32 }),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert_eq!(
            fx.state.settings.current().await.expect("current").frames_per_strip,
            4
        );

        let (status, body) = send_json(fx.router(), "POST", "/api/print/test", json!({})).await;
        assert_eq!(status, 200, "{body}");
    }

    #[tokio::test]
    async fn client_update_event_is_applied() {
        let service = service();
        let mut rx = service.notifier().subscribe();

        let saved = apply_client_event(
            &service,
            r#"{"event":"settings-update","settings":{"numberOfStrips":3}}"#,
        )
        .await
        .expect("apply")
        .expect("applied");

        assert_eq!(saved.number_of_strips, 3);
        assert_eq!(rx.recv().await.expect("broadcast").number_of_strips, 3);
    }

    #[tokio::test]
    async fn other_client_events_are_ignored() {
        let service = service();
        let outcome = apply_client_event(&service, r#"{"event":"ping"}"#)
            .await
            .expect("apply");
        assert!(outcome.is_none());
        assert_eq!(service.current().await.expect("current"), Settings::default());
    }

    #[test]
    fn server_event_shape() {
        let settings = Settings::default();
        let value = serde_json::to_value(ServerEvent {
            event: SETTINGS_UPDATED,
            settings: &settings,
        })
        .expect("serialize");
        assert_eq!(value["event"], "settings-updated");
        assert_eq!(value["settings"]["numberOfStrips"], 2);
    }
}
