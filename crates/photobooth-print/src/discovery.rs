// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer discovery via the host's printer-listing utility, and two-tier
// classification of a requested name against the supported HP DeskJet family.
//
// OS-reported names for the same physical printer vary by driver and locale
// ("HP DeskJet 2700 series", "HP DJ 2700 (Network)", ...).  A request is
// accepted when it matches a listed printer exactly, or when both the request
// and some listed printer belong to the known alias family.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use photobooth_core::error::{PhotoboothError, Result};
use photobooth_core::types::PrinterReport;

/// Name variants observed for the supported printer family.
pub const KNOWN_ALIASES: &[&str] = &[
    "HP Deskjet",
    "HP DeskJet 2700 series",
    "HP DeskJet 2300 series",
    "HP DeskJet 2100 series",
    "HP DeskJet Ink Advantage",
    "HP DJ",
    "HPDeskjet",
];

/// Upper bound on a single printer-listing invocation.
const LISTING_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of the host's installed printer names.
#[async_trait]
pub trait PrinterCatalog: Send + Sync {
    /// Names of every installed printer, in the order the OS reports them.
    async fn list_printers(&self) -> Result<Vec<String>>;
}

/// Lists printers by shelling out to the platform's listing utility.
///
/// Windows: `wmic printer get name`, falling back to PowerShell `Get-Printer`
/// on hosts where WMIC has been removed.  Elsewhere: CUPS `lpstat -e`.
#[derive(Debug, Clone)]
pub struct OsPrinterCatalog {
    timeout: Duration,
}

impl Default for OsPrinterCatalog {
    fn default() -> Self {
        Self {
            timeout: LISTING_TIMEOUT,
        }
    }
}

impl OsPrinterCatalog {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run_listing(&self, program: &str, args: &[&str]) -> Result<String> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PhotoboothError::PrinterListing(format!("spawn {program}: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PhotoboothError::PrinterListing(format!(
                    "{program} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| PhotoboothError::PrinterListing(format!("{program}: {e}")))?;

        if !output.status.success() {
            return Err(PhotoboothError::PrinterListing(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PrinterCatalog for OsPrinterCatalog {
    #[instrument(skip_all)]
    async fn list_printers(&self) -> Result<Vec<String>> {
        let names = if cfg!(windows) {
            match self.run_listing("wmic", &["printer", "get", "name"]).await {
                Ok(stdout) => parse_printer_list(&stdout, true),
                Err(e) => {
                    warn!(error = %e, "wmic unavailable, falling back to Get-Printer");
                    let stdout = self
                        .run_listing(
                            "powershell",
                            &[
                                "-NoProfile",
                                "-NonInteractive",
                                "-Command",
                                "Get-Printer | Select-Object -ExpandProperty Name",
                            ],
                        )
                        .await?;
                    parse_printer_list(&stdout, false)
                }
            }
        } else {
            let stdout = self.run_listing("lpstat", &["-e"]).await?;
            parse_printer_list(&stdout, false)
        };

        info!(count = names.len(), "printers listed");
        Ok(names)
    }
}

/// Split listing output into printer names: one per line, trimmed, blank lines
/// dropped, and the first line discarded when the tool prints a header.
pub fn parse_printer_list(stdout: &str, has_header: bool) -> Vec<String> {
    stdout
        .lines()
        .skip(usize::from(has_header))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Outcome of matching a requested printer name against the installed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Case-insensitive exact match; carries the OS spelling.
    Exact(String),
    /// Request and installed printer share the supported alias family.
    Alias(String),
    /// No usable printer.
    Unknown,
}

impl Classification {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// The installed printer name jobs should be sent to.
    pub fn resolved_name(&self) -> Option<&str> {
        match self {
            Self::Exact(name) | Self::Alias(name) => Some(name),
            Self::Unknown => None,
        }
    }
}

/// Lowercase, treat CUPS-style underscores as spaces, and collapse whitespace.
fn normalize(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether `name` belongs to the supported printer family.
pub fn matches_known_alias(name: &str) -> bool {
    let name = normalize(name);
    KNOWN_ALIASES
        .iter()
        .any(|alias| name.contains(&normalize(alias)))
}

/// Classify `requested` against the installed `names`.
///
/// An exact match wins.  Otherwise, if the request names the supported
/// family, the first installed printer of that family (in OS order) is used.
pub fn classify(requested: &str, names: &[String]) -> Classification {
    let wanted = normalize(requested);
    if wanted.is_empty() {
        return Classification::Unknown;
    }

    if let Some(exact) = names.iter().find(|name| normalize(name) == wanted) {
        return Classification::Exact(exact.clone());
    }

    if matches_known_alias(requested) {
        if let Some(family) = names.iter().find(|name| matches_known_alias(name)) {
            debug!(requested, resolved = %family, "resolved printer through alias");
            return Classification::Alias(family.clone());
        }
    }

    Classification::Unknown
}

/// List printers and resolve `requested`, or fail with the full list attached.
pub async fn resolve_printer(catalog: &dyn PrinterCatalog, requested: &str) -> Result<String> {
    let names = catalog.list_printers().await?;
    match classify(requested, &names) {
        Classification::Exact(name) | Classification::Alias(name) => Ok(name),
        Classification::Unknown => {
            warn!(requested, available = ?names, "requested printer not installed");
            Err(PhotoboothError::PrinterNotFound {
                requested: requested.to_owned(),
                available: names,
            })
        }
    }
}

/// Build the `GET /api/printers` summary from the installed names.
pub fn printer_report(names: Vec<String>) -> PrinterReport {
    let family: Vec<String> = names
        .iter()
        .filter(|name| matches_known_alias(name))
        .cloned()
        .collect();

    PrinterReport {
        has_hp_deskjet: !family.is_empty(),
        default_hp_printer: family.first().cloned().unwrap_or_default(),
        hp_deskjet_printers: family,
        supported_models: KNOWN_ALIASES.iter().map(|s| s.to_string()).collect(),
        printers: names,
    }
}
