// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde_json::{Value, json};
use tracing::info;

use photobooth_core::error::PhotoboothError;

use crate::drive::{DriveRelay, UploadOutcome};
use crate::error::ApiResult;
use crate::routes::Form;
use crate::state::AppState;

fn relay(state: &AppState) -> Result<Arc<DriveRelay>, PhotoboothError> {
    state
        .drive
        .clone()
        .ok_or(PhotoboothError::NotConfigured("Google Drive"))
}

/// `POST /api/drive/upload`, multipart `photo`.
pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<Value>> {
    let relay = relay(&state)?;
    let mut form = Form::read(multipart).await?;
    let photo = form
        .take_file("photo")
        .ok_or_else(|| PhotoboothError::InvalidInput("no file uploaded".into()))?;

    let outcome = relay
        .upload_photo(&photo.filename, &photo.content_type, photo.bytes)
        .await?;

    let body = match outcome {
        UploadOutcome::SkippedTinyGif => json!({
            "success": true,
            "message": "GIF file corrupt/empty, skipped upload",
            "fileName": photo.filename,
            "fileType": photo.content_type,
        }),
        UploadOutcome::Uploaded { folder, file } => json!({
            "success": true,
            "message": "File uploaded successfully",
            "folderUrl": folder.web_view_link,
            "fileUrl": file.web_view_link,
            "fileId": file.id,
            "fileName": file.name,
            "customerFolder": {
                "id": folder.id,
                "name": folder.name,
                "url": folder.web_view_link,
            },
        }),
    };
    Ok(Json(body))
}

/// `GET /api/drive/test`: check the token and main folder access.
pub async fn test_connection(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let relay = relay(&state)?;
    let user = relay.store().about_user().await?;
    let folder = relay.store().get_item(relay.main_folder_id()).await?;
    info!(folder = %relay.main_folder_id(), "Drive connection verified");

    Ok(Json(json!({
        "success": true,
        "message": "Google Drive connection test successful",
        "serviceAccount": user,
        "folder": {
            "name": folder.get("name"),
            "capabilities": folder.get("capabilities"),
        },
    })))
}

/// `DELETE /api/drive/delete/{fileId}`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<Value>> {
    relay(&state)?.delete(&file_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "File deleted successfully",
        "fileId": file_id,
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;

    use crate::drive::DriveItem;
    use crate::drive::tests::{FakeDrive, relay};
    use crate::test_support::{Fixture, get_json, multipart_body, multipart_request, read_json};

    const BOUNDARY: &str = "driveboundary";

    fn with_drive() -> (Fixture, Arc<FakeDrive>) {
        let mut fx = Fixture::new(&[], &[]);
        let (relay, fake) = relay(FakeDrive::default(), None);
        fx.state.drive = Some(Arc::new(relay));
        (fx, fake)
    }

    #[tokio::test]
    async fn upload_files_photo_under_customer_folder() {
        let (fx, fake) = with_drive();
        let body = multipart_body(
            BOUNDARY,
            &[],
            &[("photo", "ana_strip1.png", "image/png", &[7u8; 32])],
        );
        let (status, body) =
            read_json(fx.router(), multipart_request("/api/drive/upload", BOUNDARY, body)).await;

        assert_eq!(status, 200, "{body}");
        assert_eq!(body["fileName"], "ana_strip1.png");
        assert_eq!(body["customerFolder"]["name"], "ana");
        assert!(body["fileUrl"].is_string());
        assert!(fake.calls().contains(&"create_folder ana".to_string()));
    }

    #[tokio::test]
    async fn tiny_gif_reports_success_without_upload() {
        let (fx, fake) = with_drive();
        let body = multipart_body(
            BOUNDARY,
            &[],
            &[("photo", "ana_anim.gif", "image/gif", &[0u8; 10])],
        );
        let (status, body) =
            read_json(fx.router(), multipart_request("/api/drive/upload", BOUNDARY, body)).await;

        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["fileType"], "image/gif");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn connection_test_reports_folder() {
        let (fx, fake) = with_drive();
        fake.files.lock().expect("lock").push(DriveItem {
            id: "main".into(),
            name: "Photobooth".into(),
            web_view_link: None,
        });
        let (status, body) = get_json(fx.router(), "/api/drive/test").await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["folder"]["name"], "Photobooth");
    }

    #[tokio::test]
    async fn deleting_inaccessible_file_is_404() {
        let (fx, _fake) = with_drive();
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/drive/delete/missing")
            .body(Body::empty())
            .expect("request");
        let (status, _) = read_json(fx.router(), request).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn unconfigured_drive_is_503() {
        let fx = Fixture::new(&[], &[]);
        let (status, body) = get_json(fx.router(), "/api/drive/test").await;
        assert_eq!(status, 503);
        assert_eq!(body["success"], false);
    }
}
