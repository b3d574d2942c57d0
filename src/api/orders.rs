use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::cart::{adjust, CartLineRequest};
use crate::api::AppState;
use crate::domain::TierSnapshot;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub lines: Vec<CartLineRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub line_id: String,
    pub subject_id: String,
    pub quantity: u64,
    pub qty_from: u64,
    pub qty_to: u64,
    pub unit_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub captured_ms: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinesResponse {
    pub order_id: String,
    pub lines: Vec<SnapshotView>,
    /// Lines of the request that no tier priced; nothing was frozen for them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

fn snapshot_view(state: &AppState, s: &TierSnapshot) -> SnapshotView {
    SnapshotView {
        line_id: s.line_id.clone(),
        subject_id: s.subject_id.to_string(),
        quantity: s.quantity,
        qty_from: s.qty_from,
        qty_to: s.qty_to,
        unit_price: state.money(s.unit_price),
        currency: s.currency.clone(),
        source: s.source.clone(),
        captured_ms: s.captured_ms,
    }
}

fn parse_order_id(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Invalid order id".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Price the order's lines and freeze the tier of each tier-priced line.
///
/// Lines already captured for this order keep their original snapshot.
/// Lines without an applicable tier are reported as skipped; when none of
/// the lines has one the request fails with 404.
pub async fn capture_lines(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<CaptureRequest>,
) -> Result<Json<OrderLinesResponse>, AppError> {
    let order_id = parse_order_id(&order_id)?;
    let adjusted = adjust(&state, req.lines).await?;
    let captured_ms = chrono::Utc::now().timestamp_millis();

    let mut snapshots = Vec::with_capacity(adjusted.len());
    let mut skipped = Vec::new();
    for line in &adjusted {
        match line.snapshot(&order_id, captured_ms) {
            Some(snapshot) => snapshots.push(snapshot),
            None => skipped.push(line.line_id.clone()),
        }
    }
    if snapshots.is_empty() {
        return Err(AppError::NotFound(format!(
            "No tier applies to any line of order {}",
            order_id
        )));
    }

    let mut stored = 0usize;
    for snapshot in &snapshots {
        if state.repo.insert_tier_snapshot(snapshot).await? {
            stored += 1;
        }
    }
    info!(
        order_id = %order_id,
        lines = adjusted.len(),
        stored,
        skipped = skipped.len(),
        "Captured order tier snapshots"
    );

    let snapshots = state.repo.query_tier_snapshots(&order_id).await?;
    Ok(Json(OrderLinesResponse {
        order_id,
        lines: snapshots.iter().map(|s| snapshot_view(&state, s)).collect(),
        skipped,
    }))
}

pub async fn get_lines(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderLinesResponse>, AppError> {
    let order_id = parse_order_id(&order_id)?;
    let snapshots = state.repo.query_tier_snapshots(&order_id).await?;
    if snapshots.is_empty() {
        return Err(AppError::NotFound(format!(
            "No tier snapshots for order {}",
            order_id
        )));
    }
    Ok(Json(OrderLinesResponse {
        order_id,
        lines: snapshots.iter().map(|s| snapshot_view(&state, s)).collect(),
        skipped: Vec::new(),
    }))
}
