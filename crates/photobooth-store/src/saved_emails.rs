// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record of photo strips sent by email: one small JSON file per delivery in
// the saved-emails directory.  Only the recipient and time are kept.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use photobooth_core::error::{PhotoboothError, Result};

use crate::json_file;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    to: String,
    date: DateTime<Utc>,
}

/// One entry of `GET /saved-emails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEmail {
    pub filename: String,
    pub to: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SavedEmailLog {
    dir: PathBuf,
}

impl SavedEmailLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Note that a strip was sent to `to`.
    #[instrument(skip(self))]
    pub async fn record(&self, to: &str) -> Result<SavedEmail> {
        let date = Utc::now();
        let filename = format!(
            "{}-{}.json",
            date.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let record = Record {
            to: to.to_owned(),
            date,
        };
        json_file::write(&self.dir.join(&filename), &record).await?;
        debug!(%filename, "email delivery recorded");
        Ok(SavedEmail {
            filename,
            to: record.to,
            date,
        })
    }

    /// Every readable record, oldest first.  Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<SavedEmail>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PhotoboothError::Store(format!(
                    "read {}: {e}",
                    self.dir.display()
                )));
            }
        };

        let mut emails = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".json") {
                continue;
            }
            match json_file::read::<Record>(&entry.path()).await {
                Ok(Some(record)) => emails.push(SavedEmail {
                    filename,
                    to: record.to,
                    date: record.date,
                }),
                Ok(None) => {}
                Err(e) => warn!(%filename, error = %e, "skipping unreadable email record"),
            }
        }
        emails.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.filename.cmp(&b.filename)));
        Ok(emails)
    }
}
