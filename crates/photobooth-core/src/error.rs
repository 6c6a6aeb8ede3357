// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the photobooth backend.

use thiserror::Error;

/// Top-level error type for all photobooth operations.
#[derive(Debug, Error)]
pub enum PhotoboothError {
    // -- Request validation --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    // -- Print errors --
    #[error("printer listing failed: {0}")]
    PrinterListing(String),

    #[error("printer \"{requested}\" not found")]
    PrinterNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("print strategy {strategy} failed: {detail}")]
    PrintExecution { strategy: String, detail: String },

    #[error("all print methods failed for {printer}: {last_error}")]
    AllMethodsFailed { last_error: String, printer: String },

    // -- Storage / persistence --
    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Collaborators --
    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("Google Drive request failed: {0}")]
    Drive(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    // -- Print server client --
    #[error("could not reach print server: {0}")]
    Transport(String),

    #[error("print server returned {status}: {message}")]
    Remote { status: u16, message: String },
}

impl PhotoboothError {
    /// Whether this error is the caller's fault (bad payload, unknown printer).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::PrinterNotFound { .. } | Self::NotFound(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhotoboothError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(PhotoboothError::InvalidInput("no image".into()).is_client_error());
        assert!(
            PhotoboothError::PrinterNotFound {
                requested: "Canon".into(),
                available: vec![],
            }
            .is_client_error()
        );
        assert!(
            !PhotoboothError::AllMethodsFailed {
                last_error: "exit 1".into(),
                printer: "HP DeskJet 2700".into(),
            }
            .is_client_error()
        );
    }

    #[test]
    fn all_methods_failed_mentions_printer() {
        let err = PhotoboothError::AllMethodsFailed {
            last_error: "timed out".into(),
            printer: "HP DeskJet 2700 series".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HP DeskJet 2700 series"));
        assert!(msg.contains("timed out"));
    }
}
