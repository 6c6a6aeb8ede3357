// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the photobooth backend.  Field names follow the
// frontend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strip index sent for the multi-strip composite page.
pub const COMPOSITE_STRIP: i32 = -1;

/// Unique identifier for a server-side print attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to keep concurrent spool names apart.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_owned()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /api/print`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    /// `data:image/png;base64,...` data URL.
    pub image_data: Option<String>,
    pub printer_name: Option<String>,
    pub strip_index: Option<i32>,
}

/// Successful `POST /api/print` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    /// Identifier of the strategy that reached the spooler.
    pub method: String,
    pub actual_printer_name: String,
}

/// Body of `GET /api/printers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterReport {
    pub printers: Vec<String>,
    #[serde(rename = "hasHPDeskjet")]
    pub has_hp_deskjet: bool,
    #[serde(rename = "hpDeskjetPrinters")]
    pub hp_deskjet_printers: Vec<String>,
    #[serde(rename = "defaultHPPrinter")]
    pub default_hp_printer: String,
    pub supported_models: Vec<String>,
}

/// Per-camera exposure settings; every field defaults to `"auto"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    pub iso: String,
    pub shutter_speed: String,
    pub aperture: String,
    pub white_balance: String,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            iso: "auto".into(),
            shutter_speed: "auto".into(),
            aperture: "auto".into(),
            white_balance: "auto".into(),
        }
    }
}

/// Which capture device the booth uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub device_id: String,
    pub model: String,
    pub settings: CameraSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            kind: "webcam".into(),
            device_id: String::new(),
            model: String::new(),
            settings: CameraSettings::default(),
        }
    }
}

/// Booth settings shared by every connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub frames_per_strip: u32,
    pub number_of_strips: u32,
    /// Copies printed per session.
    pub print_count: u32,
    pub selected_printer: String,
    pub camera: CameraConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frames_per_strip: 4,
            number_of_strips: 2,
            print_count: 2,
            selected_printer: "HP Deskjet".into(),
            camera: CameraConfig::default(),
        }
    }
}

impl Settings {
    /// Overlay a partial JSON update onto these settings.
    ///
    /// Unknown keys are ignored; nested `camera` objects are merged key by key
    /// so a client can change one exposure value without resending the rest.
    pub fn merged_with(&self, patch: &serde_json::Value) -> serde_json::Result<Self> {
        let mut base = serde_json::to_value(self)?;
        merge_json(&mut base, patch);
        serde_json::from_value(base)
    }
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                let nested = value.is_object() && base.get(key).is_some_and(|v| v.is_object());
                match base.get_mut(key) {
                    Some(existing) if nested => merge_json(existing, value),
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// A decorative overlay pattern uploaded through the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    pub name: String,
    /// File name inside the patterns upload directory.
    pub filename: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// The most recent successfully printed page, kept for "reprint last job".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPrintJob {
    pub image_data: String,
    pub printer_name: String,
    pub strip_index: i32,
    pub printed_at: DateTime<Utc>,
}
