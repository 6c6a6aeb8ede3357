// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde_json::{Value, json};

use photobooth_core::error::PhotoboothError;
use photobooth_core::types::Pattern;

use crate::error::ApiResult;
use crate::routes::Form;
use crate::state::AppState;

/// `GET /api/patterns`
pub async fn list_patterns(State(state): State<AppState>) -> ApiResult<Json<Vec<Pattern>>> {
    Ok(Json(state.patterns.list().await?))
}

/// `POST /api/patterns`, multipart `patternImage` + `name`.
pub async fn add_pattern(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Pattern>> {
    let mut form = Form::read(multipart).await?;
    let missing = || PhotoboothError::InvalidInput("pattern image and name are required".into());

    let name = form.text("name").ok_or_else(missing)?.to_owned();
    let image = form.take_file("patternImage").ok_or_else(missing)?;

    let pattern = state
        .patterns
        .add(&name, &image.filename, &image.bytes)
        .await?;
    Ok(Json(pattern))
}

/// `DELETE /api/patterns/{id}`
pub async fn delete_pattern(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let removed = state.patterns.remove(&id).await?;
    Ok(Json(json!({
        "message": format!("Pattern {} deleted successfully", removed.name),
    })))
}
