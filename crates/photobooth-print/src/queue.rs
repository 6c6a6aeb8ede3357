// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client-side sequential print queue.
//
// Multiple copies are issued as separate print requests, one at a time.  The
// host spooler has no lock of its own, so the queue is the only thing keeping
// requests from overlapping.  A failed copy freezes the remaining copies until
// the operator explicitly retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::{PrintRequest, PrintResponse};

/// Pause before every print request.
pub const DEFAULT_PACING: Duration = Duration::from_millis(2500);

/// Coarse lifecycle of a [`PrintQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Idle,
    Printing,
    Failed,
}

/// What happened to the queue after a copy printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// More copies remain.
    Continue,
    /// That was the last copy; the queue is idle again.
    Completed,
}

/// The print job as the frontend tracks it, copy by copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintQueue {
    pub image_data: Option<String>,
    pub printer_name: Option<String>,
    pub strip_index: i32,
    pub total_copies: u32,
    pub copies_left: u32,
    pub current_copy: u32,
    pub is_printing: bool,
    pub is_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PrintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> QueueState {
        match (self.is_printing, self.is_failed) {
            (true, true) => QueueState::Failed,
            (true, false) => QueueState::Printing,
            _ => QueueState::Idle,
        }
    }

    /// Begin printing `copies` copies of one page.
    pub fn start(
        &mut self,
        image_data: String,
        printer_name: Option<String>,
        strip_index: i32,
        copies: u32,
    ) -> Result<()> {
        if self.is_printing {
            return Err(PhotoboothError::InvalidInput(
                "a print job is already in progress".into(),
            ));
        }
        if copies == 0 {
            return Err(PhotoboothError::InvalidInput(
                "copies must be at least 1".into(),
            ));
        }

        *self = Self {
            image_data: Some(image_data),
            printer_name,
            strip_index,
            total_copies: copies,
            copies_left: copies,
            current_copy: 1,
            is_printing: true,
            is_failed: false,
            last_error: None,
        };
        info!(copies, strip_index, "print queue started");
        Ok(())
    }

    /// The request for the current copy, if one may be issued now.
    pub fn next_request(&self) -> Option<PrintRequest> {
        if !self.is_printing || self.is_failed || self.copies_left == 0 {
            return None;
        }
        Some(PrintRequest {
            image_data: self.image_data.clone(),
            printer_name: self.printer_name.clone(),
            strip_index: Some(self.strip_index),
        })
    }

    pub fn record_success(&mut self) -> CopyOutcome {
        self.copies_left = self.copies_left.saturating_sub(1);
        if self.copies_left == 0 {
            self.is_printing = false;
            info!(copies = self.total_copies, "all copies printed");
            CopyOutcome::Completed
        } else {
            self.current_copy += 1;
            CopyOutcome::Continue
        }
    }

    /// Freeze the queue on the current copy.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!(
            copy = self.current_copy,
            copies_left = self.copies_left,
            %error,
            "print copy failed"
        );
        self.is_failed = true;
        self.last_error = Some(error);
    }

    /// Resume a failed queue from the copy that failed.
    pub fn retry(&mut self) -> Result<()> {
        if self.state() != QueueState::Failed {
            return Err(PhotoboothError::InvalidInput(
                "no failed print job to retry".into(),
            ));
        }
        info!(copy = self.current_copy, copies_left = self.copies_left, "retrying print job");
        self.is_failed = false;
        self.last_error = None;
        Ok(())
    }

    /// Drop the job, leaving the queue idle.
    pub fn abandon(&mut self) {
        if self.is_printing {
            info!(copies_left = self.copies_left, "print job abandoned");
        }
        *self = Self::default();
    }
}

/// Sends one print request and waits for the server's verdict.
#[async_trait]
pub trait PrintSubmitter: Send + Sync {
    async fn submit(&self, request: &PrintRequest) -> Result<PrintResponse>;
}

/// Submits to a running photobooth server's `POST /api/print`.
#[derive(Debug, Clone)]
pub struct HttpPrintSubmitter {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPrintSubmitter {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/print", self.base_url)
    }
}

/// Error body returned by the server for a rejected or failed print.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(self) -> String {
        let error = self.error.unwrap_or_else(|| "print failed".into());
        match self.details {
            Some(details) => format!("{error} ({details})"),
            None => error,
        }
    }
}

#[async_trait]
impl PrintSubmitter for HttpPrintSubmitter {
    #[instrument(skip_all, fields(endpoint = %self.endpoint()))]
    async fn submit(&self, request: &PrintRequest) -> Result<PrintResponse> {
        let response = self
            .http
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| PhotoboothError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<PrintResponse>()
                .await
                .map_err(|e| PhotoboothError::Transport(format!("decode response: {e}")));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message(),
            Err(_) => status.canonical_reason().unwrap_or("print failed").to_owned(),
        };
        Err(PhotoboothError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

/// How a [`QueueRunner::run`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    Completed { copies: u32 },
    Failed { copy: u32, error: String },
    /// Nothing was queued.
    Idle,
}

/// Drives a [`PrintQueue`] through a [`PrintSubmitter`], one copy at a time.
pub struct QueueRunner {
    submitter: Arc<dyn PrintSubmitter>,
    pacing: Duration,
}

impl QueueRunner {
    pub fn new(submitter: Arc<dyn PrintSubmitter>) -> Self {
        Self::with_pacing(submitter, DEFAULT_PACING)
    }

    pub fn with_pacing(submitter: Arc<dyn PrintSubmitter>, pacing: Duration) -> Self {
        Self { submitter, pacing }
    }

    /// Issue requests until the queue completes or a copy fails.
    ///
    /// `on_progress` sees the queue after every state change.
    pub async fn run(
        &self,
        queue: &mut PrintQueue,
        mut on_progress: impl FnMut(&PrintQueue) + Send,
    ) -> QueueOutcome {
        while let Some(request) = queue.next_request() {
            tokio::time::sleep(self.pacing).await;

            match self.submitter.submit(&request).await {
                Ok(response) => {
                    info!(
                        copy = queue.current_copy,
                        method = %response.method,
                        printer = %response.actual_printer_name,
                        "copy printed"
                    );
                    let outcome = queue.record_success();
                    on_progress(queue);
                    if outcome == CopyOutcome::Completed {
                        return QueueOutcome::Completed {
                            copies: queue.total_copies,
                        };
                    }
                }
                Err(e) => {
                    queue.record_failure(e.to_string());
                    on_progress(queue);
                    break;
                }
            }
        }

        match queue.state() {
            QueueState::Failed => QueueOutcome::Failed {
                copy: queue.current_copy,
                error: queue.last_error.clone().unwrap_or_default(),
            },
            _ => QueueOutcome::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tokio::time::Instant;

    /// Answers from a script and counts requests.
    struct Scripted {
        replies: Mutex<VecDeque<bool>>,
        requests: Mutex<Vec<PrintRequest>>,
    }

    impl Scripted {
        fn new(replies: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl PrintSubmitter for Scripted {
        async fn submit(&self, request: &PrintRequest) -> Result<PrintResponse> {
            self.requests.lock().expect("lock").push(request.clone());
            let ok = self.replies.lock().expect("lock").pop_front().unwrap_or(true);
            if ok {
                Ok(PrintResponse {
                    success: true,
                    message: "Print job sent successfully".into(),
                    method: "cups-lp".into(),
                    actual_printer_name: "HP DeskJet 2700 series".into(),
                })
            } else {
                Err(PhotoboothError::Remote {
                    status: 500,
                    message: "all print methods failed".into(),
                })
            }
        }
    }

    fn started(copies: u32) -> PrintQueue {
        let mut queue = PrintQueue::new();
        queue
            .start("data:image/png;base64,AA==".into(), None, -1, copies)
            .expect("start");
        queue
    }

    #[test]
    fn start_rejects_zero_copies_and_double_start() {
        let mut queue = PrintQueue::new();
        assert!(queue.start("x".into(), None, 0, 0).is_err());
        queue.start("x".into(), None, 0, 1).expect("start");
        assert!(queue.start("x".into(), None, 0, 1).is_err());
    }

    #[test]
    fn failed_queue_issues_no_request() {
        let mut queue = started(2);
        queue.record_failure("boom");
        assert_eq!(queue.state(), QueueState::Failed);
        assert!(queue.next_request().is_none());
    }

    #[test]
    fn retry_requires_failure() {
        let mut queue = started(1);
        assert!(queue.retry().is_err());
        queue.record_failure("boom");
        queue.retry().expect("retry");
        assert_eq!(queue.state(), QueueState::Printing);
        assert!(queue.last_error.is_none());
    }

    #[test]
    fn serializes_in_frontend_shape() {
        let queue = started(3);
        let json = serde_json::to_value(&queue).expect("serialize");
        assert_eq!(json["copiesLeft"], 3);
        assert_eq!(json["currentCopy"], 1);
        assert_eq!(json["isPrinting"], true);
        assert_eq!(json["isFailed"], false);
        assert_eq!(json["stripIndex"], -1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_copy_failure_freezes_then_retry_completes() {
        let submitter = Scripted::new(&[true, false, true, true]);
        let runner = QueueRunner::new(submitter.clone());
        let mut queue = started(3);

        let outcome = runner.run(&mut queue, |_| {}).await;
        assert_eq!(
            outcome,
            QueueOutcome::Failed {
                copy: 2,
                error: "print server returned 500: all print methods failed".into(),
            }
        );
        assert_eq!(queue.current_copy, 2);
        assert_eq!(queue.copies_left, 2);
        assert!(queue.is_failed);
        assert_eq!(submitter.request_count(), 2);

        // Frozen: running again without retry sends nothing.
        let outcome = runner.run(&mut queue, |_| {}).await;
        assert!(matches!(outcome, QueueOutcome::Failed { .. }));
        assert_eq!(submitter.request_count(), 2);

        queue.retry().expect("retry");
        let outcome = runner.run(&mut queue, |_| {}).await;
        assert_eq!(outcome, QueueOutcome::Completed { copies: 3 });
        assert_eq!(queue.copies_left, 0);
        assert!(!queue.is_printing);
        assert_eq!(queue.state(), QueueState::Idle);
        assert_eq!(submitter.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn each_request_is_paced() {
        let submitter = Scripted::new(&[]);
        let runner = QueueRunner::new(submitter.clone());
        let mut queue = started(2);

        let begun = Instant::now();
        let mut snapshots = Vec::new();
        runner
            .run(&mut queue, |q| snapshots.push(q.copies_left))
            .await;
        assert_eq!(begun.elapsed(), DEFAULT_PACING * 2);
        assert_eq!(snapshots, vec![1, 0]);
    }

    #[tokio::test]
    async fn idle_queue_runs_nothing() {
        let submitter = Scripted::new(&[]);
        let runner = QueueRunner::with_pacing(submitter.clone(), Duration::ZERO);
        let mut queue = PrintQueue::new();
        assert_eq!(runner.run(&mut queue, |_| {}).await, QueueOutcome::Idle);
        assert_eq!(submitter.request_count(), 0);
    }

    #[test]
    fn requests_carry_job_fields() {
        let mut queue = PrintQueue::new();
        queue
            .start("img".into(), Some("HP Deskjet".into()), 1, 2)
            .expect("start");
        let request = queue.next_request().expect("request");
        assert_eq!(request.image_data.as_deref(), Some("img"));
        assert_eq!(request.printer_name.as_deref(), Some("HP Deskjet"));
        assert_eq!(request.strip_index, Some(1));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let submitter = HttpPrintSubmitter::new(reqwest::Client::new(), "http://localhost:5000/");
        assert_eq!(submitter.endpoint(), "http://localhost:5000/api/print");
    }
}
