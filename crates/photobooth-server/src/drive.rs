// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Google Drive relay.
//
// Photos are filed per customer: the customer name is the upload's filename
// prefix before the first `_`, and each customer gets a folder under the
// configured main folder.  Folders and files are shared as "anyone with the
// link can edit" so the booth's QR code can point straight at them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use photobooth_core::config::DriveConfig;
use photobooth_core::error::{PhotoboothError, Result};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const ITEM_FIELDS: &str = "id, name, webViewLink";

/// GIF uploads under this size are treated as broken captures and skipped.
pub const MIN_GIF_BYTES: usize = 1000;

/// A Drive file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

/// The Drive operations the relay needs.
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Identity of the authenticated account.
    async fn about_user(&self) -> Result<Value>;

    /// Metadata of one item, or `NotFound`.
    async fn get_item(&self, id: &str) -> Result<Value>;

    async fn find_folder(&self, name: &str, parent: &str) -> Result<Option<DriveItem>>;

    async fn create_folder(&self, name: &str, parent: &str) -> Result<DriveItem>;

    async fn upload(
        &self,
        name: &str,
        mime: &str,
        bytes: Vec<u8>,
        parent: &str,
    ) -> Result<DriveItem>;

    /// Grant `anyone` the `writer` role.
    async fn share_with_anyone(&self, id: &str) -> Result<()>;

    async fn transfer_ownership(&self, id: &str, email: &str) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Drive v3 REST client authenticated with a bearer access token.
pub struct GoogleDrive {
    http: reqwest::Client,
    token: String,
}

impl GoogleDrive {
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PhotoboothError::Drive(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PhotoboothError::NotFound(format!("Drive item: {body}")));
        }
        Err(PhotoboothError::Drive(format!("{status}: {body}")))
    }

    async fn json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| PhotoboothError::Drive(format!("decode response: {e}")))
    }

    async fn create_permission(&self, id: &str, permission: Value, transfer: bool) -> Result<()> {
        let mut query = vec![("supportsAllDrives", "true")];
        if transfer {
            query.push(("transferOwnership", "true"));
        }
        self.send(
            self.http
                .post(format!("{API_BASE}/files/{id}/permissions"))
                .query(&query)
                .json(&permission),
        )
        .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveItem>,
}

/// Escape a value for a single-quoted Drive query string.
fn query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// `multipart/related` body for a metadata + media upload.
fn related_body(boundary: &str, metadata: &Value, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl DriveStore for GoogleDrive {
    async fn about_user(&self) -> Result<Value> {
        let about: Value = self
            .json(self.http.get(format!("{API_BASE}/about")).query(&[("fields", "user")]))
            .await?;
        Ok(about.get("user").cloned().unwrap_or(Value::Null))
    }

    async fn get_item(&self, id: &str) -> Result<Value> {
        self.json(self.http.get(format!("{API_BASE}/files/{id}")).query(&[
            ("fields", "id, name, capabilities"),
            ("supportsAllDrives", "true"),
        ]))
        .await
    }

    async fn find_folder(&self, name: &str, parent: &str) -> Result<Option<DriveItem>> {
        let q = format!(
            "mimeType='{FOLDER_MIME}' and name='{}' and '{}' in parents and trashed=false",
            query_literal(name),
            query_literal(parent)
        );
        let list: FileList = self
            .json(self.http.get(format!("{API_BASE}/files")).query(&[
                ("q", q.as_str()),
                ("fields", "files(id, name, webViewLink)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]))
            .await?;
        Ok(list.files.into_iter().next())
    }

    async fn create_folder(&self, name: &str, parent: &str) -> Result<DriveItem> {
        self.json(
            self.http
                .post(format!("{API_BASE}/files"))
                .query(&[("fields", ITEM_FIELDS), ("supportsAllDrives", "true")])
                .json(&json!({ "name": name, "mimeType": FOLDER_MIME, "parents": [parent] })),
        )
        .await
    }

    async fn upload(
        &self,
        name: &str,
        mime: &str,
        bytes: Vec<u8>,
        parent: &str,
    ) -> Result<DriveItem> {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let boundary = format!("photobooth-{nanos}");
        let metadata = json!({ "name": name, "parents": [parent] });
        self.json(
            self.http
                .post(format!("{UPLOAD_BASE}/files"))
                .query(&[
                    ("uploadType", "multipart"),
                    ("fields", ITEM_FIELDS),
                    ("supportsAllDrives", "true"),
                ])
                .header(
                    reqwest::header::CONTENT_TYPE,
                    format!("multipart/related; boundary={boundary}"),
                )
                .body(related_body(&boundary, &metadata, mime, &bytes)),
        )
        .await
    }

    async fn share_with_anyone(&self, id: &str) -> Result<()> {
        self.create_permission(id, json!({ "role": "writer", "type": "anyone" }), false)
            .await
    }

    async fn transfer_ownership(&self, id: &str, email: &str) -> Result<()> {
        self.create_permission(
            id,
            json!({ "role": "owner", "type": "user", "emailAddress": email }),
            true,
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send(
            self.http
                .delete(format!("{API_BASE}/files/{id}"))
                .query(&[("supportsAllDrives", "true")]),
        )
        .await?;
        Ok(())
    }
}

/// Result of relaying one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { folder: DriveItem, file: DriveItem },
    /// Tiny GIFs are dropped without contacting Drive.
    SkippedTinyGif,
}

/// Customer-folder filing on top of a [`DriveStore`].
pub struct DriveRelay {
    store: Arc<dyn DriveStore>,
    main_folder_id: String,
    owner_email: Option<String>,
}

impl DriveRelay {
    pub fn new(
        store: Arc<dyn DriveStore>,
        main_folder_id: String,
        owner_email: Option<String>,
    ) -> Self {
        Self {
            store,
            main_folder_id,
            owner_email,
        }
    }

    /// Relay backed by the Drive REST API, if an access token is configured.
    pub fn from_config(config: &DriveConfig, http: reqwest::Client) -> Option<Self> {
        let token = config.access_token.clone()?;
        Some(Self::new(
            Arc::new(GoogleDrive::new(http, token)),
            config.main_folder_id.clone(),
            config.owner_email.clone(),
        ))
    }

    pub fn store(&self) -> &dyn DriveStore {
        self.store.as_ref()
    }

    pub fn main_folder_id(&self) -> &str {
        &self.main_folder_id
    }

    /// File `bytes` into the customer's folder, creating and sharing the
    /// folder on first use.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload_photo(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome> {
        if mime == "image/gif" && bytes.len() < MIN_GIF_BYTES {
            warn!(file_name, "GIF too small, skipping upload");
            return Ok(UploadOutcome::SkippedTinyGif);
        }

        let customer = customer_name(file_name);
        let folder = match self.store.find_folder(customer, &self.main_folder_id).await? {
            Some(folder) => {
                debug!(folder_id = %folder.id, "using existing customer folder");
                folder
            }
            None => {
                let folder = self.store.create_folder(customer, &self.main_folder_id).await?;
                self.store.share_with_anyone(&folder.id).await?;
                info!(folder_id = %folder.id, customer, "customer folder created");
                folder
            }
        };

        let file = self.store.upload(file_name, mime, bytes, &folder.id).await?;
        self.store.share_with_anyone(&file.id).await?;

        match &self.owner_email {
            Some(owner) => {
                if let Err(e) = self.store.transfer_ownership(&file.id, owner).await {
                    warn!(file_id = %file.id, error = %e, "ownership transfer failed");
                }
            }
            None => debug!("no owner email configured, skipping ownership transfer"),
        }

        info!(file_id = %file.id, customer, "photo uploaded to Drive");
        Ok(UploadOutcome::Uploaded { folder, file })
    }

    /// Delete a file, reporting `NotFound` when it is not accessible.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        self.store.get_item(file_id).await.map_err(|e| match e {
            PhotoboothError::NotFound(_) => e,
            other => PhotoboothError::NotFound(format!("file {file_id} not accessible: {other}")),
        })?;
        self.store.delete(file_id).await?;
        info!(file_id, "Drive file deleted");
        Ok(())
    }
}

/// `"ana_strip1.png"` → `"ana"`.
pub fn customer_name(file_name: &str) -> &str {
    file_name.split('_').next().unwrap_or(file_name)
}
