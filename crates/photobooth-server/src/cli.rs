// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface: run the server, or drive the sequential print
// queue against a running server from a terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tracing::{info, warn};

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::COMPOSITE_STRIP;
use photobooth_print::payload::png_data_url;
use photobooth_print::queue::QueueOutcome;
use photobooth_print::{HttpPrintSubmitter, PrintQueue, QueueRunner};

#[derive(Debug, Parser)]
#[command(name = "photobooth")]
#[command(about = "Photobooth backend: strip printing, settings, mail and Drive relays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Print copies of a PNG through a running server, one at a time
    Print(PrintArgs),
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Port to bind (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Data directory (overrides PHOTOBOOTH_DATA_DIR)
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PrintArgs {
    /// PNG file to print
    #[arg(short, long)]
    pub image: PathBuf,
    /// Number of copies
    #[arg(short, long, default_value_t = 1)]
    pub copies: u32,
    /// Printer name; the server's selected printer when omitted
    #[arg(short, long)]
    pub printer: Option<String>,
    /// Strip index, -1 for the composite page
    #[arg(long, default_value_t = COMPOSITE_STRIP, allow_negative_numbers = true)]
    pub strip: i32,
    /// Base URL of the photobooth server
    #[arg(long, default_value = "http://localhost:5000")]
    pub server: String,
}

/// Run `photobooth print`: queue the copies and prompt on stdin after a
/// failure.
pub async fn run_print(args: PrintArgs) -> Result<u32> {
    let bytes = tokio::fs::read(&args.image).await.map_err(|e| {
        PhotoboothError::InvalidInput(format!("read {}: {e}", args.image.display()))
    })?;

    let submitter = HttpPrintSubmitter::new(reqwest::Client::new(), args.server);
    info!(endpoint = %submitter.endpoint(), copies = args.copies, "starting print queue");

    let mut queue = PrintQueue::new();
    queue.start(png_data_url(&bytes), args.printer, args.strip, args.copies)?;

    let runner = QueueRunner::new(Arc::new(submitter));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    drive_queue(&runner, &mut queue, stdin).await
}

/// Run the queue to completion, asking `answers` whether to retry each time
/// a copy fails.  Returns the number of copies printed.
pub async fn drive_queue<R>(runner: &QueueRunner, queue: &mut PrintQueue, answers: R) -> Result<u32>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = answers.lines();
    loop {
        let outcome = runner
            .run(queue, |q| {
                info!(
                    current_copy = q.current_copy,
                    copies_left = q.copies_left,
                    failed = q.is_failed,
                    "queue progress"
                );
            })
            .await;

        match outcome {
            QueueOutcome::Completed { copies } => {
                info!(copies, "all copies printed");
                return Ok(copies);
            }
            QueueOutcome::Idle => return Ok(0),
            QueueOutcome::Failed { copy, error } => {
                warn!(copy, error = %error, "print failed");
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(
                        format!(
                            "Copy {copy} of {} failed: {error}\nRetry? [y/N] ",
                            queue.total_copies
                        )
                        .as_bytes(),
                    )
                    .await?;
                stdout.flush().await?;

                let answer = lines.next_line().await?.unwrap_or_default();
                if matches!(answer.trim(), "y" | "Y" | "yes") {
                    queue.retry()?;
                } else {
                    queue.abandon();
                    return Err(PhotoboothError::AllMethodsFailed {
                        last_error: error,
                        printer: queue
                            .printer_name
                            .clone()
                            .unwrap_or_else(|| "server default".into()),
                    });
                }
            }
        }
    }
}
