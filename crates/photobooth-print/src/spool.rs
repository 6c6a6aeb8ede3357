// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-attempt spool files.
//
// Every server-side print attempt writes the decoded page to its own file and
// removes it once the attempt reaches a terminal outcome.  `SpoolFile` is the
// owner of that file: explicit `remove` on the normal path, `Drop` on unwind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, instrument, warn};

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::{COMPOSITE_STRIP, JobId};

/// Directory that holds in-flight print files.  Created on first use.
#[derive(Debug, Clone)]
pub struct SpoolDir {
    root: PathBuf,
}

impl SpoolDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to a fresh, uniquely named PNG for one attempt.
    ///
    /// The name carries the timestamp and strip index (`composite` for the
    /// multi-strip page) plus a job-id suffix so concurrent attempts never
    /// collide.
    #[instrument(skip(self, bytes), fields(job_id = %job, len = bytes.len()))]
    pub async fn create(&self, job: JobId, strip_index: i32, bytes: &[u8]) -> Result<SpoolFile> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            PhotoboothError::Filesystem(format!(
                "create spool dir {}: {e}",
                self.root.display()
            ))
        })?;

        let strip = if strip_index == COMPOSITE_STRIP {
            "composite".to_owned()
        } else {
            strip_index.to_string()
        };
        let name = format!(
            "print_{}_{}_{}.png",
            Utc::now().timestamp_millis(),
            strip,
            job.short()
        );
        let path = self.root.join(name);

        // Take ownership before writing so a partial file is cleaned up too.
        let file = SpoolFile {
            path,
            removed: false,
        };
        tokio::fs::write(&file.path, bytes).await.map_err(|e| {
            PhotoboothError::Filesystem(format!("write {}: {e}", file.path.display()))
        })?;

        debug!(path = %file.path.display(), "spool file written");
        Ok(file)
    }
}

/// A spooled page on disk, deleted exactly once.
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
    removed: bool,
}

impl SpoolFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file.  A file that is already gone counts as removed.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "spool file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "spool cleanup failed"),
        }
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "spool file removed on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "spool cleanup failed"),
        }
    }
}
