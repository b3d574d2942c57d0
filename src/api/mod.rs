pub mod cart;
pub mod customization;
pub mod health;
pub mod orders;
pub mod products;
pub mod techniques;

use crate::config::Config;
use crate::db::Repository;
use crate::domain::{Decimal, Tier};
use crate::engine::{AreaBreakdown, CustomizationTotal};
use axum::{
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self { repo, config }
    }

    /// Amount rounded and padded to the configured number of decimals.
    pub fn money(&self, amount: Decimal) -> String {
        let dp = self.config.price_decimals;
        format!("{:.*}", dp as usize, amount.round_dp(dp).inner())
    }

    pub fn tier_view(&self, tier: &Tier) -> TierView {
        TierView {
            qty_from: tier.qty_from,
            qty_to: tier.qty_to,
            unit_price: self.money(tier.unit_price),
            currency: tier
                .currency
                .clone()
                .unwrap_or_else(|| self.config.currency.clone()),
            source: tier.source.clone(),
        }
    }

    pub fn customization_view(&self, total: &CustomizationTotal) -> CustomizationView {
        CustomizationView {
            total: self.money(total.total),
            areas: total
                .breakdown
                .iter()
                .map(|(idx, b)| (*idx, self.area_view(b)))
                .collect(),
        }
    }

    fn area_view(&self, b: &AreaBreakdown) -> AreaView {
        AreaView {
            technique_ref: b.technique_ref.as_ref().map(|r| r.to_string()),
            quantity: b.quantity,
            quantity_for_technique: b.quantity_for_technique,
            min_applied: b.min_applied,
            technique_price: self.money(b.technique_price),
            technique_total: self.money(b.technique_total),
            colors: b.colors,
            col_inc: b.col_inc,
            colors_extra: b.colors_extra,
            price_col: self.money(b.price_col),
            color_extra_total: self.money(b.color_extra_total),
            cliche_repetition: b.cliche_repetition,
            cliche_total: self.money(b.cliche_total),
            cliche_repetition_total: self.money(b.cliche_repetition_total),
            area_total: self.money(b.area_total),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub qty_from: u64,
    pub qty_to: u64,
    pub unit_price: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaView {
    pub technique_ref: Option<String>,
    pub quantity: u64,
    pub quantity_for_technique: u64,
    pub min_applied: bool,
    pub technique_price: String,
    pub technique_total: String,
    pub colors: u32,
    pub col_inc: u32,
    pub colors_extra: u32,
    pub price_col: String,
    pub color_extra_total: String,
    pub cliche_repetition: bool,
    pub cliche_total: String,
    pub cliche_repetition_total: String,
    pub area_total: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationView {
    pub total: String,
    pub areas: BTreeMap<usize, AreaView>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/products/:subject_id/tiers",
            put(products::put_tiers).get(products::get_tiers),
        )
        .route(
            "/v1/products/:subject_id/tiers.csv",
            put(products::put_tiers_csv),
        )
        .route("/v1/products/:subject_id/areas", put(products::put_areas))
        .route("/v1/products/:subject_id/price", get(products::get_price))
        .route(
            "/v1/techniques/:technique_ref",
            put(techniques::put_technique),
        )
        .route(
            "/v1/customization/price",
            post(customization::price_customization),
        )
        .route("/v1/cart/price", post(cart::price_cart))
        .route(
            "/v1/orders/:order_id/lines",
            post(orders::capture_lines).get(orders::get_lines),
        )
        .layer(cors)
        .with_state(state)
}
