// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer listing and print submission endpoints.
//
// A print request is validated before anything touches the filesystem or
// spawns a process.  The decoded page is spooled to a per-attempt file that
// is removed however the attempt ends.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use photobooth_core::error::PhotoboothError;
use photobooth_core::types::{COMPOSITE_STRIP, JobId, PrintRequest, PrintResponse, PrinterReport};
use photobooth_print::discovery::{printer_report, resolve_printer};
use photobooth_print::payload::{decode_png_data_url, fingerprint, png_data_url};
use photobooth_print::{DispatchSuccess, test_page};

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/printers`
pub async fn list_printers(State(state): State<AppState>) -> ApiResult<Json<PrinterReport>> {
    let names = state.printers.list_printers().await?;
    Ok(Json(printer_report(names)))
}

/// `POST /api/print`
#[instrument(skip_all)]
pub async fn print(
    State(state): State<AppState>,
    payload: Result<Json<PrintRequest>, JsonRejection>,
) -> ApiResult<Json<PrintResponse>> {
    let Json(request) = payload?;
    let image_data = request
        .image_data
        .ok_or_else(|| PhotoboothError::InvalidInput("no image data provided".into()))?;
    let bytes = decode_png_data_url(&image_data)?;
    let strip_index = request.strip_index.unwrap_or(COMPOSITE_STRIP);

    let outcome = print_page(&state, &bytes, request.printer_name.as_deref(), strip_index).await?;
    state
        .last_job
        .store(image_data, outcome.printer.clone(), strip_index);

    Ok(Json(PrintResponse {
        success: true,
        message: "Print job sent successfully".into(),
        method: outcome.strategy.into(),
        actual_printer_name: outcome.printer,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterChoice {
    pub printer_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPrintResponse {
    pub success: bool,
    pub message: String,
    pub printer_name: String,
    pub method: String,
}

/// `POST /api/print/test`: print a generated strip layout.
pub async fn print_test(
    State(state): State<AppState>,
    payload: Result<Json<PrinterChoice>, JsonRejection>,
) -> ApiResult<Json<TestPrintResponse>> {
    let Json(choice) = payload?;
    let frames = state.settings.current().await?.frames_per_strip;
    let bytes = render_test_page(frames).await?;

    let outcome = print_page(&state, &bytes, choice.printer_name.as_deref(), 0).await?;
    Ok(Json(TestPrintResponse {
        success: true,
        message: format!("Test print sent to {}", outcome.printer),
        printer_name: outcome.printer,
        method: outcome.strategy.into(),
    }))
}

/// `POST /api/print/reprint`: print the last successful page again.
pub async fn reprint(
    State(state): State<AppState>,
    payload: Result<Json<PrinterChoice>, JsonRejection>,
) -> ApiResult<Json<PrintResponse>> {
    let Json(choice) = payload?;
    let job = state
        .last_job
        .get()
        .ok_or_else(|| PhotoboothError::NotFound("no previous print job".into()))?;
    let bytes = decode_png_data_url(&job.image_data)?;
    let printer = choice.printer_name.unwrap_or(job.printer_name);

    let outcome = print_page(&state, &bytes, Some(&printer), job.strip_index).await?;
    state
        .last_job
        .store(png_data_url(&bytes), outcome.printer.clone(), job.strip_index);

    Ok(Json(PrintResponse {
        success: true,
        message: "Reprint job sent successfully".into(),
        method: outcome.strategy.into(),
        actual_printer_name: outcome.printer,
    }))
}

/// Render the test page off the async workers.
async fn render_test_page(frames: u32) -> Result<Vec<u8>, PhotoboothError> {
    tokio::task::spawn_blocking(move || test_page::png_bytes(frames))
        .await
        .map_err(|e| PhotoboothError::Filesystem(format!("test page rendering aborted: {e}")))?
}

/// Resolve the printer, spool `bytes` and run the strategy chain.
///
/// With no printer named, the booth's selected printer is used.
pub(crate) async fn print_page(
    state: &AppState,
    bytes: &[u8],
    requested: Option<&str>,
    strip_index: i32,
) -> Result<DispatchSuccess, PhotoboothError> {
    let requested = match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_owned(),
        None => state.settings.current().await?.selected_printer,
    };
    let printer = resolve_printer(state.printers.as_ref(), &requested).await?;

    let job = JobId::new();
    info!(
        job_id = %job,
        requested = %requested,
        printer = %printer,
        strip_index,
        page = %&fingerprint(bytes)[..12],
        "printing page"
    );

    let spool_file = state.spool.create(job, strip_index, bytes).await?;
    let outcome = state.dispatcher.print(spool_file.path(), &printer).await;
    spool_file.remove().await;
    outcome
}
