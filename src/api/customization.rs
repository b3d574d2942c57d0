use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{AppState, CustomizationView};
use crate::domain::SubjectId;
use crate::engine::price_customization_payload;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationRequest {
    /// Product whose marking areas cap the colour counts.
    pub product_id: Option<String>,
    pub quantity: u64,
    #[serde(default)]
    pub selections: Value,
}

pub async fn price_customization(
    State(state): State<AppState>,
    Json(req): Json<CustomizationRequest>,
) -> Result<Json<CustomizationView>, AppError> {
    let catalog = state.repo.load_catalog().await?;
    let areas = req
        .product_id
        .as_deref()
        .map(|id| catalog.areas(&SubjectId::new(id.trim())))
        .unwrap_or_default();

    let total = price_customization_payload(
        &req.selections,
        req.quantity,
        &catalog.technique_catalog(),
        &areas,
    );
    Ok(Json(state.customization_view(&total)))
}
