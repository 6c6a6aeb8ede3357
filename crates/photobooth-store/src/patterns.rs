// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay pattern catalog.
//
// Metadata lives in `<catalog_dir>/patterns.json` as `{ "patterns": [...] }`;
// the images themselves live under `<uploads>/patterns/` and are served
// statically at `/uploads/patterns/<filename>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::Pattern;

use crate::json_file;

pub const PATTERNS_FILE: &str = "patterns.json";

/// URL prefix the pattern images are served under.
pub const PATTERNS_URL_PREFIX: &str = "/uploads/patterns";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDoc {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

pub struct PatternCatalog {
    catalog_path: PathBuf,
    images_dir: PathBuf,
    lock: Mutex<()>,
}

impl PatternCatalog {
    pub fn new(catalog_dir: &Path, uploads_dir: &Path) -> Self {
        Self {
            catalog_path: catalog_dir.join(PATTERNS_FILE),
            images_dir: uploads_dir.join("patterns"),
            lock: Mutex::new(()),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub async fn list(&self) -> Result<Vec<Pattern>> {
        Ok(self.read().await?.patterns)
    }

    /// Store a new pattern image and record it in the catalog.
    ///
    /// The stored file keeps the extension of `original_filename`.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn add(&self, name: &str, original_filename: &str, bytes: &[u8]) -> Result<Pattern> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PhotoboothError::InvalidInput(
                "pattern image and name are required".into(),
            ));
        }

        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;

        let now = Utc::now();
        let mut millis = now.timestamp_millis();
        while doc.patterns.iter().any(|p| p.id == millis.to_string()) {
            millis += 1;
        }
        let filename = format!(
            "{millis}-{}{}",
            &Uuid::new_v4().simple().to_string()[..8],
            extension_of(original_filename)
        );

        tokio::fs::create_dir_all(&self.images_dir).await.map_err(|e| {
            PhotoboothError::Filesystem(format!("create {}: {e}", self.images_dir.display()))
        })?;
        let image_path = self.images_dir.join(&filename);
        tokio::fs::write(&image_path, bytes).await.map_err(|e| {
            PhotoboothError::Filesystem(format!("write {}: {e}", image_path.display()))
        })?;

        let pattern = Pattern {
            id: millis.to_string(),
            name: name.to_owned(),
            url: format!("{PATTERNS_URL_PREFIX}/{filename}"),
            filename,
            created_at: now,
        };
        doc.patterns.push(pattern.clone());
        if let Err(e) = json_file::write(&self.catalog_path, &doc).await {
            // Don't leave an orphaned image behind a failed catalog write.
            let _ = tokio::fs::remove_file(&image_path).await;
            return Err(e);
        }

        info!(id = %pattern.id, name = %pattern.name, "pattern added");
        Ok(pattern)
    }

    /// Remove a pattern from the catalog, then delete its image.  A failure
    /// to delete the image is logged and tolerated.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<Pattern> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;

        let index = doc
            .patterns
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PhotoboothError::NotFound(format!("pattern {id}")))?;
        let pattern = doc.patterns.remove(index);
        json_file::write(&self.catalog_path, &doc).await?;

        let image_path = self.images_dir.join(&pattern.filename);
        match tokio::fs::remove_file(&image_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %image_path.display(), "pattern image already missing");
            }
            Err(e) => {
                warn!(path = %image_path.display(), error = %e, "pattern image left behind");
            }
        }

        info!(id, "pattern removed");
        Ok(pattern)
    }

    async fn read(&self) -> Result<CatalogDoc> {
        Ok(json_file::read(&self.catalog_path).await?.unwrap_or_default())
    }
}

/// `.png` for `overlay.PNG`; empty when there is no usable extension.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
