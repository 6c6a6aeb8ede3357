// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read and write whole JSON documents on disk.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use photobooth_core::error::{PhotoboothError, Result};

/// Read `path` as `T`.  A missing file yields `None`; an unreadable or
/// corrupt file is logged and also yields `None` so the caller can start over
/// from its default.
pub(crate) async fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PhotoboothError::Store(format!(
                "read {}: {e}",
                path.display()
            )));
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt JSON catalog, ignoring contents");
            Ok(None)
        }
    }
}

/// Pretty-print `value` to `path`, replacing any previous contents.
///
/// The document is written to a sibling temp file and renamed into place so
/// readers never observe a half-written catalog.
pub(crate) async fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            PhotoboothError::Store(format!("create {}: {e}", parent.display()))
        })?;
    }

    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| PhotoboothError::Store(format!("write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| PhotoboothError::Store(format!("replace {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let value: Option<BTreeMap<String, u32>> =
            read(&tmp.path().join("absent.json")).await.expect("read");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_none() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, b"{ not json").expect("write");
        let value: Option<BTreeMap<String, u32>> = read(&path).await.expect("read");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("copies".to_string(), 2u32);

        write(&path, &doc).await.expect("write");
        let back: Option<BTreeMap<String, u32>> = read(&path).await.expect("read");
        assert_eq!(back, Some(doc));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
