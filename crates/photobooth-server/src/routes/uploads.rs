// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photo uploads into the static uploads directory.

use axum::Json;
use axum::extract::{Multipart, State};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use photobooth_core::error::PhotoboothError;
use photobooth_store::patterns::extension_of;

use crate::error::ApiResult;
use crate::routes::Form;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct ImageEntry {
    pub url: String,
}

/// `POST /upload`, multipart `image`.
#[instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut form = Form::read(multipart).await?;
    let image = form
        .take_file("image")
        .ok_or_else(|| PhotoboothError::InvalidInput("no file uploaded".into()))?;

    let dir = state.config.uploads_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| PhotoboothError::Filesystem(format!("create {}: {e}", dir.display())))?;

    let filename = format!(
        "photo-{}{}",
        Utc::now().timestamp_millis(),
        extension_of(&image.filename)
    );
    let path = dir.join(&filename);
    tokio::fs::write(&path, &image.bytes)
        .await
        .map_err(|e| PhotoboothError::Filesystem(format!("write {}: {e}", path.display())))?;

    info!(%filename, len = image.bytes.len(), "photo uploaded");
    Ok(Json(UploadResponse {
        image_url: format!("/{filename}"),
    }))
}

/// `GET /images`: every file directly inside the uploads directory.
pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<ImageEntry>>> {
    let dir = state.config.uploads_dir();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => {
            return Err(
                PhotoboothError::Filesystem(format!("read {}: {e}", dir.display())).into(),
            );
        }
    };

    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(PhotoboothError::from)? {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            images.push(ImageEntry {
                url: format!("/{}", entry.file_name().to_string_lossy()),
            });
        }
    }
    images.sort_by(|a, b| a.url.cmp(&b.url));
    Ok(Json(images))
}
