// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding of the base64 PNG data URLs the frontend sends for printing and
// emailing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use photobooth_core::error::{PhotoboothError, Result};

/// Exact prefix required on print payloads.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode a `data:image/png;base64,` URL into raw PNG bytes.
///
/// The prefix check is strict: other image types, missing prefixes and
/// parameterised MIME types are all rejected.
pub fn decode_png_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = data_url.strip_prefix(PNG_DATA_URL_PREFIX).ok_or_else(|| {
        PhotoboothError::InvalidInput(format!(
            "image data must start with {PNG_DATA_URL_PREFIX}"
        ))
    })?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| {
            PhotoboothError::InvalidInput(format!("image data is not valid base64: {e}"))
        })?;

    if bytes.is_empty() {
        return Err(PhotoboothError::InvalidInput("image data is empty".into()));
    }
    Ok(bytes)
}

/// Decode the payload after any `base64,` marker, whatever the MIME type.
///
/// Email attachments accept any image the frontend produced.
pub fn decode_any_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = data_url
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(data_url);
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| PhotoboothError::InvalidInput(format!("image data is not valid base64: {e}")))
}

/// Encode PNG bytes as a data URL (inverse of [`decode_png_data_url`]).
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes))
}

/// SHA-256 of the decoded image, used to correlate log lines for one page.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_png_data_url() {
        let bytes = decode_png_data_url("data:image/png;base64,iVBORw0KGgo=").expect("decode");
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = decode_png_data_url("iVBORw0KGgo=").unwrap_err();
        assert!(matches!(err, PhotoboothError::InvalidInput(_)));
    }

    #[test]
    fn rejects_other_mime_types() {
        assert!(decode_png_data_url("data:image/jpeg;base64,/9j/4AAQ").is_err());
        assert!(decode_png_data_url("data:image/PNG;base64,iVBORw0KGgo=").is_err());
    }

    #[test]
    fn rejects_garbage_and_empty_payloads() {
        assert!(decode_png_data_url("data:image/png;base64,!!!not base64!!!").is_err());
        assert!(decode_png_data_url("data:image/png;base64,").is_err());
    }

    #[test]
    fn any_data_url_ignores_mime_type() {
        let bytes = decode_any_data_url("data:image/jpeg;base64,AAEC").expect("decode");
        assert_eq!(bytes, vec![0, 1, 2]);
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = fingerprint(b"strip");
        assert_eq!(a.len(), 64);
        assert_eq!(a, fingerprint(b"strip"));
        assert_ne!(a, fingerprint(b"strip2"));
    }
}
