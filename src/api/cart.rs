use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{AppState, CustomizationView, TierView};
use crate::cart::{AdjustedLine, CartAdjuster, CartLine, RecalcContext, Recalc};
use crate::domain::{Decimal, SubjectId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub line_id: String,
    pub product_id: String,
    pub variation_id: Option<String>,
    pub quantity: u64,
    #[serde(default)]
    pub base_price: Option<String>,
    #[serde(default)]
    pub customization: Option<Value>,
}

impl CartLineRequest {
    pub fn into_line(self) -> Result<CartLine, AppError> {
        let base_price = match self.base_price.as_deref().map(str::trim) {
            None | Some("") => Decimal::zero(),
            Some(s) => Decimal::from_str_canonical(s)
                .ok()
                .filter(|d| !d.is_negative())
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Invalid basePrice for line {}", self.line_id))
                })?,
        };
        Ok(CartLine {
            line_id: self.line_id,
            product_id: SubjectId::new(self.product_id),
            variation_id: self.variation_id.map(SubjectId::new),
            quantity: self.quantity,
            base_price,
            customization: self.customization,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub lines: Vec<CartLineRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub line_id: String,
    pub subject_id: String,
    pub subject_quantity: u64,
    pub quantity: u64,
    pub unit_price: String,
    pub line_total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierView>,
    pub customization: CustomizationView,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<LineView>,
}

pub(crate) fn line_view(state: &AppState, line: &AdjustedLine) -> LineView {
    LineView {
        line_id: line.line_id.clone(),
        subject_id: line.subject_id.to_string(),
        subject_quantity: line.subject_quantity,
        quantity: line.quantity,
        unit_price: state.money(line.unit_price),
        line_total: state.money(line.unit_price * Decimal::from_quantity(line.quantity)),
        tier: line.tier.as_ref().map(|t| state.tier_view(t)),
        customization: state.customization_view(&line.customization),
    }
}

/// Run one cart recalculation pass and return the adjusted lines.
pub(crate) async fn adjust(
    state: &AppState,
    lines: Vec<CartLineRequest>,
) -> Result<Vec<AdjustedLine>, AppError> {
    let lines = lines
        .into_iter()
        .map(CartLineRequest::into_line)
        .collect::<Result<Vec<_>, _>>()?;

    let catalog = state.repo.load_catalog().await?;
    let mut ctx = RecalcContext::new();
    match CartAdjuster::new(&catalog).apply(&mut ctx, &lines) {
        Recalc::Applied(adjusted) => Ok(adjusted),
        Recalc::Skipped => Err(AppError::Internal(
            "Cart recalculation already in progress".to_string(),
        )),
    }
}

pub async fn price_cart(
    State(state): State<AppState>,
    Json(req): Json<CartRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let adjusted = adjust(&state, req.lines).await?;
    Ok(Json(CartResponse {
        lines: adjusted.iter().map(|l| line_view(&state, l)).collect(),
    }))
}
