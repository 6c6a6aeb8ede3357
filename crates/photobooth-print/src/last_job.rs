// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory cache of the most recent successful print, backing "reprint last
// job".  Only one job is kept and nothing is persisted across restarts.

use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use photobooth_core::types::LastPrintJob;

#[derive(Debug, Default)]
pub struct LastJobCache {
    job: Mutex<Option<LastPrintJob>>,
}

impl LastJobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached job with a freshly printed one.
    pub fn store(&self, image_data: String, printer_name: String, strip_index: i32) {
        let job = LastPrintJob {
            image_data,
            printer_name,
            strip_index,
            printed_at: Utc::now(),
        };
        debug!(printer = %job.printer_name, strip_index, "last print job cached");
        *self.lock() = Some(job);
    }

    pub fn get(&self) -> Option<LastPrintJob> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    // A poisoned lock still holds a valid `Option`; keep using it.
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<LastPrintJob>> {
        self.job.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
