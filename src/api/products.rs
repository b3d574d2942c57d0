use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{AppState, TierView};
use crate::domain::SubjectId;
use crate::engine::resolve_tier;
use crate::error::AppError;
use crate::normalize::{normalize_areas, normalize_tiers, tiers_from_csv};

fn parse_subject(input: &str) -> Result<SubjectId, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Invalid subject id".to_string()));
    }
    Ok(SubjectId::new(trimmed))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TiersResponse {
    pub subject_id: String,
    pub tiers: Vec<TierView>,
}

/// Store raw tier configuration and echo back what it normalizes to.
pub async fn put_tiers(
    Path(subject_id): Path<String>,
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<TiersResponse>, AppError> {
    let subject = parse_subject(&subject_id)?;
    state.repo.upsert_product_tiers(&subject, &raw).await?;

    let table = normalize_tiers(&raw);
    info!(subject = %subject, tiers = table.len(), "Stored tier configuration");

    Ok(Json(TiersResponse {
        subject_id: subject.to_string(),
        tiers: table.tiers().iter().map(|t| state.tier_view(t)).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CsvQuery {
    pub delimiter: Option<String>,
}

/// Import a supplier price sheet. The imported rows replace the subject's
/// tier configuration; prices are stored as strings so no precision is lost.
pub async fn put_tiers_csv(
    Path(subject_id): Path<String>,
    Query(params): Query<CsvQuery>,
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TiersResponse>, AppError> {
    let subject = parse_subject(&subject_id)?;
    let delimiter = match params.delimiter.as_deref() {
        None | Some("") => b',',
        Some(d) if d.len() == 1 && d.is_ascii() => d.as_bytes()[0],
        Some(d) => {
            return Err(AppError::BadRequest(format!("Invalid delimiter: {}", d)));
        }
    };

    let table = tiers_from_csv(body.as_bytes(), delimiter)
        .map_err(|e| AppError::BadRequest(format!("Unreadable price sheet: {}", e)))?;

    let raw = Value::Array(
        table
            .tiers()
            .iter()
            .map(|t| {
                json!({
                    "qty_from": t.qty_from,
                    "qty_to": t.qty_to,
                    "unit_price": t.unit_price.to_canonical_string(),
                    "currency": t.currency,
                    "source": t.source,
                })
            })
            .collect(),
    );
    state.repo.upsert_product_tiers(&subject, &raw).await?;
    info!(subject = %subject, tiers = table.len(), "Imported tier price sheet");

    Ok(Json(TiersResponse {
        subject_id: subject.to_string(),
        tiers: table.tiers().iter().map(|t| state.tier_view(t)).collect(),
    }))
}

pub async fn get_tiers(
    Path(subject_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TiersResponse>, AppError> {
    let subject = parse_subject(&subject_id)?;
    let config = state
        .repo
        .get_product_config(&subject)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No pricing configured for {}", subject)))?;

    let table = normalize_tiers(&config.tiers);
    Ok(Json(TiersResponse {
        subject_id: subject.to_string(),
        tiers: table.tiers().iter().map(|t| state.tier_view(t)).collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreasResponse {
    pub subject_id: String,
    pub areas: usize,
}

pub async fn put_areas(
    Path(subject_id): Path<String>,
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<AreasResponse>, AppError> {
    let subject = parse_subject(&subject_id)?;
    state.repo.upsert_product_areas(&subject, &raw).await?;

    Ok(Json(AreasResponse {
        subject_id: subject.to_string(),
        areas: normalize_areas(&raw).len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub qty: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub subject_id: String,
    pub quantity: u64,
    /// "found" or "not_found".
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierView>,
}

/// Tier price for a quantity. A subject without tiers answers `not_found`
/// rather than an error: the caller falls back to its regular price.
pub async fn get_price(
    Path(subject_id): Path<String>,
    Query(params): Query<PriceQuery>,
    State(state): State<AppState>,
) -> Result<Json<PriceResponse>, AppError> {
    let subject = parse_subject(&subject_id)?;
    let quantity = params.qty.unwrap_or(1);

    let table = state
        .repo
        .get_product_config(&subject)
        .await?
        .map(|config| normalize_tiers(&config.tiers))
        .unwrap_or_default();

    let response = match resolve_tier(table.tiers(), quantity) {
        Some(tier) => PriceResponse {
            subject_id: subject.to_string(),
            quantity,
            status: "found",
            unit_price: Some(state.money(tier.unit_price)),
            tier: Some(state.tier_view(tier)),
        },
        None => PriceResponse {
            subject_id: subject.to_string(),
            quantity,
            status: "not_found",
            unit_price: None,
            tier: None,
        },
    };
    Ok(Json(response))
}
