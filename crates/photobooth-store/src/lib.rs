// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobooth Store — small JSON-file catalogs kept under the data directory:
// booth settings, overlay patterns and sent photo-strip emails.  Settings
// changes fan out to live subscribers through the notifier.

mod json_file;
pub mod notifier;
pub mod patterns;
pub mod saved_emails;
pub mod settings;

pub use notifier::SettingsNotifier;
pub use patterns::PatternCatalog;
pub use saved_emails::{SavedEmail, SavedEmailLog};
pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsService, SettingsStore};
