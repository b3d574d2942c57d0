use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::AppState;
use crate::error::AppError;
use crate::normalize::normalize_technique;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueResponse {
    pub technique_ref: String,
    pub col_inc: u32,
    pub min: u64,
    pub escalas: usize,
}

/// Store a raw technique definition under `technique_ref`.
pub async fn put_technique(
    Path(technique_ref): Path<String>,
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<TechniqueResponse>, AppError> {
    let technique_ref = technique_ref.trim().to_string();
    let technique = normalize_technique(Some(&technique_ref), &raw)
        .ok_or_else(|| AppError::BadRequest("Technique must be a JSON object".to_string()))?;

    state.repo.upsert_technique(&technique_ref, &raw).await?;
    info!(
        technique = %technique.technique_ref,
        escalas = technique.precio_escalas.len(),
        "Stored technique"
    );

    Ok(Json(TechniqueResponse {
        technique_ref: technique.technique_ref.to_string(),
        col_inc: technique.col_inc,
        min: technique.min,
        escalas: technique.precio_escalas.len(),
    }))
}
