// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OS-level print strategies.
//
// Each strategy is one concrete command line that hands an image file to the
// spooler for a named printer.  Windows has no single reliable "print this
// PNG" verb, so several are tried in order: the image viewer's PrintTo entry
// point, Paint's silent print, Paint launched through `start`, and PowerShell's
// PrintTo verb.  CUPS hosts use `lp` and `lpr`.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use photobooth_core::error::{PhotoboothError, Result};

/// One way of sending an image file to a printer.
#[async_trait]
pub trait PrintStrategy: Send + Sync {
    /// Stable identifier reported to clients as the print `method`.
    fn id(&self) -> &'static str;

    /// Send `file` to `printer`, giving up after `timeout`.
    async fn attempt(&self, file: &Path, printer: &str, timeout: Duration) -> Result<()>;
}

/// Builds the argument list for a command from the file and printer name.
pub type ArgBuilder = fn(&str, &str) -> Vec<String>;

/// A strategy that runs a single external program.
pub struct CommandStrategy {
    id: &'static str,
    program: &'static str,
    args: ArgBuilder,
}

impl CommandStrategy {
    pub const fn new(id: &'static str, program: &'static str, args: ArgBuilder) -> Self {
        Self { id, program, args }
    }

    /// The full command line, for logging.
    pub fn command_line(&self, file: &str, printer: &str) -> Vec<String> {
        let mut line = vec![self.program.to_owned()];
        line.extend((self.args)(file, printer));
        line
    }
}

#[async_trait]
impl PrintStrategy for CommandStrategy {
    fn id(&self) -> &'static str {
        self.id
    }

    #[instrument(skip_all, fields(strategy = self.id, printer = %printer))]
    async fn attempt(&self, file: &Path, printer: &str, timeout: Duration) -> Result<()> {
        let file = file.to_string_lossy();
        let args = (self.args)(&file, printer);
        debug!(program = self.program, ?args, "running print command");

        let child = Command::new(self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("could not start {}: {e}", self.program)))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| self.failure(format!("timed out after {}s", timeout.as_secs())))?
            .map_err(|e| self.failure(format!("wait failed: {e}")))?;

        if output.status.success() {
            info!(strategy = self.id, "print command accepted");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.failure(format!("exited with {}: {}", output.status, stderr.trim())))
        }
    }
}

impl CommandStrategy {
    fn failure(&self, detail: String) -> PhotoboothError {
        PhotoboothError::PrintExecution {
            strategy: self.id.to_owned(),
            detail,
        }
    }
}

/// PowerShell single-quoted string literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn image_viewer_args(file: &str, printer: &str) -> Vec<String> {
    vec![
        r"C:\Windows\System32\shimgvw.dll,ImageView_PrintTo".into(),
        "/pt".into(),
        file.into(),
        printer.into(),
    ]
}

fn paint_args(file: &str, printer: &str) -> Vec<String> {
    vec!["/pt".into(), file.into(), printer.into()]
}

fn windowed_paint_args(file: &str, printer: &str) -> Vec<String> {
    // `start` takes the first quoted argument as a window title.
    vec![
        "/C".into(),
        "start".into(),
        String::new(),
        "/wait".into(),
        "/min".into(),
        "mspaint".into(),
        "/pt".into(),
        file.into(),
        printer.into(),
    ]
}

fn script_host_args(file: &str, printer: &str) -> Vec<String> {
    let script = format!(
        "Start-Process -FilePath {} -Verb PrintTo -ArgumentList {} -WindowStyle Hidden -Wait",
        ps_quote(file),
        ps_quote(&format!("\"{printer}\"")),
    );
    vec![
        "-NoProfile".into(),
        "-NonInteractive".into(),
        "-Command".into(),
        script,
    ]
}

fn lp_args(file: &str, printer: &str) -> Vec<String> {
    vec!["-d".into(), printer.into(), file.into()]
}

fn lpr_args(file: &str, printer: &str) -> Vec<String> {
    vec!["-P".into(), printer.into(), file.into()]
}

/// Image viewer `ImageView_PrintTo` entry point.
pub const IMAGE_VIEWER_PRINT_TO: CommandStrategy =
    CommandStrategy::new("image-viewer-print-to", "rundll32", image_viewer_args);

/// `mspaint /pt`, which prints without showing a window.
pub const PAINT_SILENT_PRINT: CommandStrategy =
    CommandStrategy::new("paint-silent-print", "mspaint", paint_args);

/// `mspaint /pt` launched minimised through `cmd /C start /wait`.
pub const WINDOWED_LAUNCH: CommandStrategy =
    CommandStrategy::new("windowed-launch", "cmd", windowed_paint_args);

/// PowerShell `Start-Process -Verb PrintTo`.
pub const SCRIPT_HOST_LAUNCH: CommandStrategy =
    CommandStrategy::new("script-host-launch", "powershell", script_host_args);

/// CUPS System V `lp`.
pub const CUPS_LP: CommandStrategy = CommandStrategy::new("cups-lp", "lp", lp_args);

/// CUPS BSD `lpr`.
pub const CUPS_LPR: CommandStrategy = CommandStrategy::new("cups-lpr", "lpr", lpr_args);

/// The strategy chain for the current host, in attempt order.
pub fn default_strategies() -> Vec<Arc<dyn PrintStrategy>> {
    if cfg!(windows) {
        vec![
            Arc::new(IMAGE_VIEWER_PRINT_TO),
            Arc::new(PAINT_SILENT_PRINT),
            Arc::new(WINDOWED_LAUNCH),
            Arc::new(SCRIPT_HOST_LAUNCH),
        ]
    } else {
        vec![Arc::new(CUPS_LP), Arc::new(CUPS_LPR)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r"C:\booth\temp\print_1700000000000_composite_ab12cd34.png";
    const PRINTER: &str = "HP DeskJet 2700 series";

    #[test]
    fn windows_chain_order_is_fixed() {
        let ids: Vec<_> = [
            &IMAGE_VIEWER_PRINT_TO,
            &PAINT_SILENT_PRINT,
            &WINDOWED_LAUNCH,
            &SCRIPT_HOST_LAUNCH,
        ]
        .iter()
        .map(|s| s.id())
        .collect();
        assert_eq!(
            ids,
            vec![
                "image-viewer-print-to",
                "paint-silent-print",
                "windowed-launch",
                "script-host-launch"
            ]
        );
    }

    #[test]
    fn paint_passes_file_then_printer() {
        assert_eq!(
            PAINT_SILENT_PRINT.command_line(FILE, PRINTER),
            vec!["mspaint", "/pt", FILE, PRINTER]
        );
    }

    #[test]
    fn windowed_launch_supplies_empty_title() {
        let line = WINDOWED_LAUNCH.command_line(FILE, PRINTER);
        assert_eq!(&line[..4], &["cmd", "/C", "start", ""]);
        assert!(line.contains(&"/min".to_string()));
    }

    #[test]
    fn script_host_quotes_paths() {
        let line = SCRIPT_HOST_LAUNCH.command_line(r"C:\it's here\a.png", PRINTER);
        let script = line.last().expect("script");
        assert!(script.contains(r"'C:\it''s here\a.png'"));
        assert!(script.contains("'\"HP DeskJet 2700 series\"'"));
    }

    #[test]
    fn cups_commands_target_printer() {
        assert_eq!(
            CUPS_LP.command_line("/tmp/a.png", "HP_DeskJet"),
            vec!["lp", "-d", "HP_DeskJet", "/tmp/a.png"]
        );
        assert_eq!(
            CUPS_LPR.command_line("/tmp/a.png", "HP_DeskJet"),
            vec!["lpr", "-P", "HP_DeskJet", "/tmp/a.png"]
        );
    }

    #[tokio::test]
    async fn missing_program_is_an_execution_error() {
        let strategy = CommandStrategy::new(
            "missing",
            "definitely-not-a-print-program-7f3a",
            paint_args,
        );
        let err = strategy
            .attempt(Path::new("/tmp/none.png"), PRINTER, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            PhotoboothError::PrintExecution { strategy, .. } => assert_eq!(strategy, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_execution_error() {
        fn false_args(_: &str, _: &str) -> Vec<String> {
            Vec::new()
        }
        let strategy = CommandStrategy::new("false", "false", false_args);
        let result = strategy
            .attempt(Path::new("/tmp/none.png"), PRINTER, Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(PhotoboothError::PrintExecution { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        fn sleep_args(_: &str, _: &str) -> Vec<String> {
            vec!["5".into()]
        }
        let strategy = CommandStrategy::new("sleep", "sleep", sleep_args);
        let err = strategy
            .attempt(Path::new("/tmp/none.png"), PRINTER, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
