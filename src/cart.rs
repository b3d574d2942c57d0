//! Applying tier and customization prices to cart lines.
//!
//! Lines of the same pricing subject are priced together: their quantities
//! are summed and the tier for the total applies to each of them. A
//! variation with its own tier table is its own subject; variations without
//! one share their parent product's table (variation-matrix orders).

use crate::catalog::PricingCatalog;
use crate::domain::{Decimal, SubjectId, Tier, TierSnapshot};
use crate::engine::{price_customization_payload, CustomizationTotal, PriceMemo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: String,
    pub product_id: SubjectId,
    #[serde(default)]
    pub variation_id: Option<SubjectId>,
    pub quantity: u64,
    /// Regular price, used when no tier applies.
    pub base_price: Decimal,
    /// Raw customization payload attached to the line.
    #[serde(default)]
    pub customization: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedLine {
    pub line_id: String,
    pub subject_id: SubjectId,
    /// Quantity the tier was resolved for (sum over the subject's lines).
    pub subject_quantity: u64,
    pub quantity: u64,
    pub tier: Option<Tier>,
    pub customization: CustomizationTotal,
    pub customization_per_unit: Decimal,
    pub unit_price: Decimal,
}

impl AdjustedLine {
    /// Tier snapshot to store on the order line, if a tier priced it.
    pub fn snapshot(&self, order_id: &str, captured_ms: i64) -> Option<TierSnapshot> {
        self.tier.as_ref().map(|tier| {
            TierSnapshot::capture(
                order_id,
                self.line_id.clone(),
                self.subject_id.clone(),
                self.subject_quantity,
                tier,
                captured_ms,
            )
        })
    }
}

/// State of one recalculation pass, passed explicitly to the adjuster.
///
/// While a pass is running, nested passes on the same context are refused;
/// the host may trigger a recalculation from inside the price-setting
/// callback.
#[derive(Debug, Default)]
pub struct RecalcContext {
    in_progress: bool,
    memo: PriceMemo,
}

impl RecalcContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn memo(&self) -> &PriceMemo {
        &self.memo
    }
}

/// Marks a context as running for as long as it lives. The flag is
/// cleared on drop, so a panicking callback cannot leave it set.
struct PassGuard<'c> {
    ctx: &'c mut RecalcContext,
}

impl<'c> PassGuard<'c> {
    fn enter(ctx: &'c mut RecalcContext) -> Self {
        ctx.in_progress = true;
        Self { ctx }
    }
}

impl Deref for PassGuard<'_> {
    type Target = RecalcContext;

    fn deref(&self) -> &RecalcContext {
        self.ctx
    }
}

impl DerefMut for PassGuard<'_> {
    fn deref_mut(&mut self) -> &mut RecalcContext {
        self.ctx
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.ctx.in_progress = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recalc {
    Applied(Vec<AdjustedLine>),
    /// A pass was already running on this context.
    Skipped,
}

pub struct CartAdjuster<'a> {
    catalog: &'a PricingCatalog,
}

impl<'a> CartAdjuster<'a> {
    pub fn new(catalog: &'a PricingCatalog) -> Self {
        Self { catalog }
    }

    /// Subject whose tier table prices `line`.
    pub fn subject_for(&self, line: &CartLine) -> SubjectId {
        match &line.variation_id {
            Some(variation) if self.catalog.has_tiers(variation) => variation.clone(),
            _ => line.product_id.clone(),
        }
    }

    pub fn apply(&self, ctx: &mut RecalcContext, lines: &[CartLine]) -> Recalc {
        self.apply_with(ctx, lines, |_, _| {})
    }

    /// Price `lines`, handing each result to `on_price` (which may itself
    /// try to recalculate with the same context).
    pub fn apply_with<F>(&self, ctx: &mut RecalcContext, lines: &[CartLine], mut on_price: F) -> Recalc
    where
        F: FnMut(&mut RecalcContext, &AdjustedLine),
    {
        if ctx.in_progress {
            debug!("Recalculation already in progress, skipping nested pass");
            return Recalc::Skipped;
        }
        let mut pass = PassGuard::enter(ctx);
        pass.memo.sync_fingerprint(&self.catalog.fingerprint());

        let subjects: Vec<SubjectId> = lines.iter().map(|l| self.subject_for(l)).collect();
        let mut totals: HashMap<&SubjectId, u64> = HashMap::new();
        for (line, subject) in lines.iter().zip(&subjects) {
            let total = totals.entry(subject).or_default();
            *total = total.saturating_add(line.quantity);
        }

        let techniques = self.catalog.technique_catalog();
        let mut adjusted = Vec::with_capacity(lines.len());

        for (line, subject) in lines.iter().zip(&subjects) {
            let subject_quantity = totals.get(subject).copied().unwrap_or(line.quantity);
            let tier = pass
                .memo
                .resolve(subject, subject_quantity, || self.catalog.tier_table(subject));

            let customization = match &line.customization {
                Some(payload) => price_customization_payload(
                    payload,
                    line.quantity,
                    &techniques,
                    &self.catalog.areas(&line.product_id),
                ),
                None => CustomizationTotal::default(),
            };
            let customization_per_unit = if line.quantity > 0 {
                customization.total / Decimal::from_quantity(line.quantity)
            } else {
                Decimal::zero()
            };

            let base = tier.as_ref().map(|t| t.unit_price).unwrap_or(line.base_price);
            let unit_price = base.checked_add(customization_per_unit).unwrap_or_else(|| {
                warn!(line_id = %line.line_id, "Unit price out of range, customization not added");
                base
            });
            adjusted.push(AdjustedLine {
                line_id: line.line_id.clone(),
                subject_id: subject.clone(),
                subject_quantity,
                quantity: line.quantity,
                unit_price,
                tier,
                customization,
                customization_per_unit,
            });
        }

        for line in &adjusted {
            on_price(&mut *pass, line);
        }

        info!(
            lines = adjusted.len(),
            memo_entries = pass.memo.len(),
            "Cart prices applied"
        );
        Recalc::Applied(adjusted)
    }
}
