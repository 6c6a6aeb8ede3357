// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP mapping of domain errors.
//
// Every error body carries `success: false` plus the message under both
// `error` and `message`, which is what the booth frontend reads depending on
// the screen.  Printer errors add `availablePrinters` or `details`.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use photobooth_core::error::PhotoboothError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] PhotoboothError),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("invalid JSON body: {}", .0.body_text())]
    Json(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Multipart(_) => StatusCode::BAD_REQUEST,
            // The body limit still surfaces as 413.
            Self::Json(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Domain(e) => match e {
                PhotoboothError::InvalidInput(_) | PhotoboothError::PrinterNotFound { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PhotoboothError::NotFound(_) => StatusCode::NOT_FOUND,
                PhotoboothError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> Value {
        let message = self.to_string();
        let mut body = json!({
            "success": false,
            "error": message,
            "message": message,
        });

        if let Self::Domain(e) = self {
            match e {
                PhotoboothError::PrinterNotFound { available, .. } => {
                    body["availablePrinters"] = json!(available);
                }
                PhotoboothError::AllMethodsFailed {
                    last_error,
                    printer,
                } => {
                    body["error"] = json!("Failed to print");
                    body["details"] = json!({
                        "lastError": last_error,
                        "printerName": printer,
                    });
                }
                _ => {}
            }
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printer_not_found_lists_alternatives() {
        let err = ApiError::from(PhotoboothError::PrinterNotFound {
            requested: "Canon".into(),
            available: vec!["Microsoft Print to PDF".into()],
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body();
        assert_eq!(body["success"], false);
        assert_eq!(body["availablePrinters"][0], "Microsoft Print to PDF");
    }

    #[test]
    fn exhaustion_carries_details() {
        let err = ApiError::from(PhotoboothError::AllMethodsFailed {
            last_error: "exit 1".into(),
            printer: "HP DeskJet 2700 series".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body["details"]["lastError"], "exit 1");
        assert_eq!(body["details"]["printerName"], "HP DeskJet 2700 series");
    }

    #[test]
    fn status_mapping() {
        let status = |e: PhotoboothError| ApiError::from(e).status();
        assert_eq!(status(PhotoboothError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(PhotoboothError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(PhotoboothError::Filesystem("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(PhotoboothError::Mail("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(PhotoboothError::NotConfigured("SMTP")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
