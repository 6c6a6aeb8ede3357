// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared state handed to every request handler.
//
// All fields are cheaply cloneable (Arc-wrapped or path-only) so axum can
// clone the state per request.  Collaborators sit behind traits so tests can
// swap in fixed printer lists, scripted strategies and fake mail/Drive.

use std::sync::Arc;

use tracing::{info, warn};

use photobooth_core::AppConfig;
use photobooth_print::{Dispatcher, LastJobCache, OsPrinterCatalog, PrinterCatalog, SpoolDir};
use photobooth_store::{
    JsonFileSettingsStore, PatternCatalog, SavedEmailLog, SettingsNotifier, SettingsService,
};

use crate::drive::DriveRelay;
use crate::mail::{Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub printers: Arc<dyn PrinterCatalog>,
    pub dispatcher: Arc<Dispatcher>,
    pub spool: SpoolDir,
    pub last_job: Arc<LastJobCache>,
    pub settings: Arc<SettingsService>,
    pub patterns: Arc<PatternCatalog>,
    pub saved_emails: SavedEmailLog,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub drive: Option<Arc<DriveRelay>>,
}

impl AppState {
    /// Wire up the production collaborators for `config`.
    pub fn from_config(config: AppConfig) -> Self {
        let catalog_dir = config.catalog_dir();
        let uploads_dir = config.uploads_dir();

        let settings = SettingsService::new(
            Arc::new(JsonFileSettingsStore::in_dir(&catalog_dir)),
            SettingsNotifier::new(),
        );

        let mailer: Option<Arc<dyn Mailer>> = match &config.smtp {
            Some(smtp) => match SmtpMailer::new(smtp) {
                Ok(mailer) => Some(Arc::new(mailer)),
                Err(e) => {
                    warn!(error = %e, "mail relay disabled");
                    None
                }
            },
            None => None,
        };

        let drive = DriveRelay::from_config(&config.drive, reqwest::Client::new()).map(Arc::new);
        if drive.is_none() {
            warn!("GOOGLE_DRIVE_ACCESS_TOKEN not set, Drive relay disabled");
        }

        let dispatcher = Dispatcher::for_host(config.print);
        info!(strategies = ?dispatcher.strategy_ids(), "print strategy chain ready");

        Self {
            printers: Arc::new(OsPrinterCatalog::default()),
            dispatcher: Arc::new(dispatcher),
            spool: SpoolDir::new(config.temp_dir()),
            last_job: Arc::new(LastJobCache::new()),
            settings: Arc::new(settings),
            patterns: Arc::new(PatternCatalog::new(&catalog_dir, &uploads_dir)),
            saved_emails: SavedEmailLog::new(config.saved_emails_dir()),
            mailer,
            drive,
            config: Arc::new(config),
        }
    }
}
