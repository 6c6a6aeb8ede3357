// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, loaded from the process environment with logged
// fallbacks to sensible defaults.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default HTTP port, matching the photobooth frontend's `REACT_APP_API_URL`.
pub const DEFAULT_PORT: u16 = 5000;

/// Default Drive folder that customer folders are created under.
pub const DEFAULT_DRIVE_FOLDER_ID: &str = "1kI1u5PCnFFza1FRKkQHoWRChb625kDxH";

/// SMTP credentials for the mail relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    /// Account used both to authenticate and as the shop's own address.
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Google Drive relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// OAuth bearer token with the `drive.file` scope.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Parent folder for per-customer folders.
    pub main_folder_id: String,
    /// If set, uploaded files are transferred to this account.
    pub owner_email: Option<String>,
}

/// Timing knobs for the print strategy chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrintTiming {
    /// Upper bound on a single strategy invocation.
    pub strategy_timeout: Duration,
    /// Pause between a failed strategy and the next one.
    pub strategy_delay: Duration,
}

impl Default for PrintTiming {
    fn default() -> Self {
        Self {
            strategy_timeout: Duration::from_secs(60),
            strategy_delay: Duration::from_secs(1),
        }
    }
}

/// Process-wide settings for the photobooth server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP server binds on `0.0.0.0`.
    pub port: u16,
    /// Root for uploads, temp print files, JSON catalogs and saved emails.
    pub data_dir: PathBuf,
    /// CORS origins allowed to call the API.
    pub allowed_origins: Vec<String>,
    /// Maximum JSON/multipart request body size in bytes.
    pub body_limit_bytes: usize,
    pub smtp: Option<SmtpConfig>,
    pub drive: DriveConfig,
    pub print: PrintTiming,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: default_data_dir(),
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "https://picapicaa.netlify.app".into(),
            ],
            body_limit_bytes: 50 * 1024 * 1024,
            smtp: None,
            drive: DriveConfig {
                access_token: None,
                main_folder_id: DEFAULT_DRIVE_FOLDER_ID.into(),
                owner_email: None,
            },
            print: PrintTiming::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset keys fall back to [`AppConfig::default`]; unparsable values are
    /// logged and also fall back rather than aborting startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORT", defaults.port);
        let data_dir = lookup("PHOTOBOOTH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);
        let body_limit_mb: usize = parse_or(&lookup, "BODY_LIMIT_MB", 50);

        let smtp = match (lookup("EMAIL"), lookup("EMAIL_PASS")) {
            (Some(user), Some(password)) => Some(SmtpConfig {
                host: lookup("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into()),
                user,
                password,
            }),
            _ => {
                warn!("EMAIL/EMAIL_PASS not set, mail relay disabled");
                None
            }
        };

        let drive = DriveConfig {
            access_token: lookup("GOOGLE_DRIVE_ACCESS_TOKEN"),
            main_folder_id: lookup("GOOGLE_DRIVE_FOLDER_ID")
                .unwrap_or(defaults.drive.main_folder_id),
            owner_email: lookup("GOOGLE_DRIVE_OWNER_EMAIL"),
        };

        let print = PrintTiming {
            strategy_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PRINT_STRATEGY_TIMEOUT_SECS",
                defaults.print.strategy_timeout.as_secs(),
            )),
            strategy_delay: Duration::from_millis(parse_or(
                &lookup,
                "PRINT_STRATEGY_DELAY_MS",
                defaults.print.strategy_delay.as_millis() as u64,
            )),
        };

        Self {
            port,
            data_dir,
            allowed_origins,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            smtp,
            drive,
            print,
        }
    }

    /// Directory that serves uploaded photos and pattern images.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory for per-attempt print spool files.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    /// Directory for JSON catalogs (settings, patterns).
    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join("data")
    }

    /// Directory for records of sent photo-strip emails.
    pub fn saved_emails_dir(&self) -> PathBuf {
        self.data_dir.join("saved_emails")
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

/// XDG data dir, then `~/.local/share`, then the system temp dir.
fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    };
    base.join("photobooth")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.smtp.is_none());
        assert_eq!(config.print.strategy_timeout, Duration::from_secs(60));
        assert_eq!(config.print.strategy_delay, Duration::from_secs(1));
        assert_eq!(config.drive.main_folder_id, DEFAULT_DRIVE_FOLDER_ID);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("PHOTOBOOTH_DATA_DIR", "/srv/booth"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test"),
            ("EMAIL", "booth@example.com"),
            ("EMAIL_PASS", "hunter2"),
            ("PRINT_STRATEGY_DELAY_MS", "250"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("/srv/booth"));
        assert_eq!(config.temp_dir(), PathBuf::from("/srv/booth/temp"));
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        let smtp = config.smtp.expect("smtp configured");
        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(config.print.strategy_delay, Duration::from_millis(250));
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn smtp_requires_both_credentials() {
        let config = AppConfig::from_lookup(lookup_from(&[("EMAIL", "booth@example.com")]));
        assert!(config.smtp.is_none());
    }
}
