// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixtures for router tests: a state rooted in a temp dir with a fixed
// printer list, scripted print strategies and recording mail/Drive fakes.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use photobooth_core::AppConfig;
use photobooth_core::config::PrintTiming;
use photobooth_core::error::{PhotoboothError, Result};
use photobooth_print::{Dispatcher, LastJobCache, PrintStrategy, PrinterCatalog, SpoolDir};
use photobooth_store::{
    MemorySettingsStore, PatternCatalog, SavedEmailLog, SettingsNotifier, SettingsService,
};

use crate::mail::{Mailer, OutgoingMail};
use crate::state::AppState;

/// Printer list that counts how often it is consulted.
pub struct FixedPrinters {
    pub names: Vec<String>,
    pub calls: AtomicUsize,
}

impl FixedPrinters {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrinterCatalog for FixedPrinters {
    async fn list_printers(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.clone())
    }
}

/// What a scripted strategy does when invoked.
#[derive(Clone, Copy)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// Strategy that records each call and whether the spool file existed.
pub struct ScriptedStrategy {
    pub id: &'static str,
    pub behaviour: Behaviour,
    pub seen: Arc<Mutex<Vec<(String, bool)>>>,
}

#[async_trait]
impl PrintStrategy for ScriptedStrategy {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn attempt(&self, file: &Path, printer: &str, _timeout: Duration) -> Result<()> {
        self.seen
            .lock()
            .expect("lock")
            .push((printer.to_owned(), file.exists()));
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(PhotoboothError::PrintExecution {
                strategy: self.id.into(),
                detail: "exited with 1".into(),
            }),
            Behaviour::Panic => panic!("print driver crashed"),
        }
    }
}

/// Mailer that keeps every message.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().expect("lock").push(mail);
        Ok(())
    }
}

pub struct Fixture {
    pub _tmp: tempfile::TempDir,
    pub state: AppState,
    pub printers: Arc<FixedPrinters>,
    pub seen: Arc<Mutex<Vec<(String, bool)>>>,
    pub mailer: Arc<RecordingMailer>,
}

impl Fixture {
    /// State whose strategy chain behaves as `chain` describes.
    pub fn new(printers: &[&str], chain: &[Behaviour]) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            data_dir: tmp.path().to_path_buf(),
            print: PrintTiming {
                strategy_timeout: Duration::from_secs(5),
                strategy_delay: Duration::ZERO,
            },
            ..AppConfig::default()
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        const IDS: [&str; 4] = ["first", "second", "third", "fourth"];
        let strategies: Vec<Arc<dyn PrintStrategy>> = chain
            .iter()
            .zip(IDS)
            .map(|(&behaviour, id)| {
                Arc::new(ScriptedStrategy {
                    id,
                    behaviour,
                    seen: Arc::clone(&seen),
                }) as Arc<dyn PrintStrategy>
            })
            .collect();

        let printers = FixedPrinters::new(printers);
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            printers: printers.clone(),
            dispatcher: Arc::new(Dispatcher::new(strategies, config.print)),
            spool: SpoolDir::new(config.temp_dir()),
            last_job: Arc::new(LastJobCache::new()),
            settings: Arc::new(SettingsService::new(
                Arc::new(MemorySettingsStore::default()),
                SettingsNotifier::new(),
            )),
            patterns: Arc::new(PatternCatalog::new(
                &config.catalog_dir(),
                &config.uploads_dir(),
            )),
            saved_emails: SavedEmailLog::new(config.saved_emails_dir()),
            mailer: Some(mailer.clone() as Arc<dyn Mailer>),
            drive: None,
            config: Arc::new(config),
        };

        Self {
            _tmp: tmp,
            state,
            printers,
            seen,
            mailer,
        }
    }

    pub fn router(&self) -> Router {
        crate::router(self.state.clone())
    }

    pub fn strategy_calls(&self) -> usize {
        self.seen.lock().expect("lock").len()
    }

    /// Files currently in the spool directory (none if it was never created).
    pub fn spooled_files(&self) -> usize {
        std::fs::read_dir(self.state.spool.root())
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

/// Send a JSON request and decode the JSON response.
pub async fn send_json(
    router: Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    read_json(router, request).await
}

pub async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    read_json(router, request).await
}

pub async fn read_json(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// A `multipart/form-data` body with the given text fields and files.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, boundary: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request")
}
