// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contact form and photo-strip delivery by email.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use photobooth_core::error::PhotoboothError;
use photobooth_print::payload::decode_any_data_url;
use photobooth_store::SavedEmail;

use crate::error::ApiResult;
use crate::mail::{MailAttachment, Mailer, OutgoingMail};
use crate::state::AppState;

pub const PHOTO_STRIP_SUBJECT: &str = "Your Photo Strip 🎉";
pub const PHOTO_STRIP_BODY: &str = "Thanks for using Picapica!";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoStripMail {
    pub recipient_email: Option<String>,
    pub image_data: Option<String>,
}

fn mailer(state: &AppState) -> Result<Arc<dyn Mailer>, PhotoboothError> {
    state
        .mailer
        .clone()
        .ok_or(PhotoboothError::NotConfigured("SMTP"))
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// `POST /send-message`: forward a contact form to the shop inbox.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ContactMessage>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(form) = payload?;
    let (Some(name), Some(email), Some(message)) = (
        required(form.name),
        required(form.email),
        required(form.message),
    ) else {
        return Err(PhotoboothError::InvalidInput("all fields are required".into()).into());
    };

    mailer(&state)?
        .send(OutgoingMail {
            to: None,
            reply_to: Some(email.clone()),
            subject: format!("New Message from {name}"),
            body: format!("Email: {email}\n\nMessage:\n{message}"),
            attachment: None,
        })
        .await?;

    info!(%email, "contact message forwarded");
    Ok(Json(json!({ "success": true, "message": "Email sent successfully" })))
}

/// `POST /send-photo-strip`: email the strip to a customer and log it.
pub async fn send_photo_strip(
    State(state): State<AppState>,
    payload: Result<Json<PhotoStripMail>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let (Some(to), Some(image_data)) = (
        required(request.recipient_email),
        required(request.image_data),
    ) else {
        return Err(
            PhotoboothError::InvalidInput("recipient email and image data are required".into())
                .into(),
        );
    };
    let bytes = decode_any_data_url(&image_data)?;

    mailer(&state)?
        .send(OutgoingMail {
            to: Some(to.clone()),
            reply_to: None,
            subject: PHOTO_STRIP_SUBJECT.into(),
            body: PHOTO_STRIP_BODY.into(),
            attachment: Some(MailAttachment {
                filename: "photo-strip.png".into(),
                content_type: "image/png".into(),
                bytes,
            }),
        })
        .await?;

    let record = state.saved_emails.record(&to).await?;
    info!(%to, filename = %record.filename, "photo strip emailed");
    Ok(Json(json!({ "success": true, "message": "Photo strip sent successfully!" })))
}

/// `GET /saved-emails`
pub async fn saved_emails(State(state): State<AppState>) -> ApiResult<Json<Vec<SavedEmail>>> {
    Ok(Json(state.saved_emails.list().await?))
}
