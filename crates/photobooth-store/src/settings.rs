// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booth settings persistence.
//
// `SettingsStore` is the persistence seam; `SettingsService` owns the
// read-merge-write cycle for partial updates and publishes every saved
// result through the notifier.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::Settings;

use crate::json_file;
use crate::notifier::SettingsNotifier;

/// File name of the settings document inside the catalog directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Accepted range for `framesPerStrip`.
pub const FRAMES_PER_STRIP: RangeInclusive<u32> = 1..=12;
/// Accepted range for `numberOfStrips`.
pub const NUMBER_OF_STRIPS: RangeInclusive<u32> = 1..=10;
/// Accepted range for `printCount`.
pub const PRINT_COUNT: RangeInclusive<u32> = 1..=20;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current settings, or defaults when nothing has been saved yet.
    async fn load(&self) -> Result<Settings>;

    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<catalog_dir>/settings.json`.
    pub fn in_dir(catalog_dir: &Path) -> Self {
        Self::new(catalog_dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(json_file::read(&self.path).await?.unwrap_or_default())
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn save(&self, settings: &Settings) -> Result<()> {
        json_file::write(&self.path, settings).await?;
        debug!("settings saved");
        Ok(())
    }
}

/// Non-persistent store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.write().await = settings.clone();
        Ok(())
    }
}

/// Settings access shared by the HTTP handlers and live connections.
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    notifier: SettingsNotifier,
    // Serialises read-merge-write so concurrent patches are not lost.
    update_lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, notifier: SettingsNotifier) -> Self {
        Self {
            store,
            notifier,
            update_lock: Mutex::new(()),
        }
    }

    pub fn notifier(&self) -> &SettingsNotifier {
        &self.notifier
    }

    pub async fn current(&self) -> Result<Settings> {
        self.store.load().await
    }

    /// Merge a partial JSON object over the saved settings, persist the
    /// result and broadcast it.
    #[instrument(skip_all)]
    pub async fn update(&self, patch: &serde_json::Value) -> Result<Settings> {
        if !patch.is_object() {
            return Err(PhotoboothError::InvalidInput(
                "settings update must be a JSON object".into(),
            ));
        }

        let _guard = self.update_lock.lock().await;
        let current = self.store.load().await?;
        let updated = current
            .merged_with(patch)
            .map_err(|e| PhotoboothError::InvalidInput(format!("invalid settings: {e}")))?;
        validate(&updated)?;
        self.store.save(&updated).await?;

        let listeners = self.notifier.publish(updated.clone());
        info!(
            listeners,
            printer = %updated.selected_printer,
            print_count = updated.print_count,
            "settings updated"
        );
        Ok(updated)
    }
}

/// Reject counts outside the ranges a booth can lay out and print.
pub fn validate(settings: &Settings) -> Result<()> {
    let checks = [
        ("framesPerStrip", settings.frames_per_strip, FRAMES_PER_STRIP),
        ("numberOfStrips", settings.number_of_strips, NUMBER_OF_STRIPS),
        ("printCount", settings.print_count, PRINT_COUNT),
    ];
    for (field, value, range) in checks {
        if !range.contains(&value) {
            return Err(PhotoboothError::InvalidInput(format!(
                "{field} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            )));
        }
    }
    Ok(())
}
