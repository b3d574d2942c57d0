//! Tier snapshot captured onto an order line.

use crate::domain::{Decimal, SubjectId, Tier};
use serde::{Deserialize, Serialize};

/// The tier that priced an order line, frozen at order creation.
///
/// Tier configuration can change after checkout; the snapshot keeps what
/// the customer was actually charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub order_id: String,
    pub line_id: String,
    pub subject_id: SubjectId,
    pub quantity: u64,
    pub qty_from: u64,
    pub qty_to: u64,
    pub unit_price: Decimal,
    pub currency: Option<String>,
    pub source: Option<String>,
    pub captured_ms: i64,
}

impl TierSnapshot {
    pub fn capture(
        order_id: impl Into<String>,
        line_id: impl Into<String>,
        subject_id: SubjectId,
        quantity: u64,
        tier: &Tier,
        captured_ms: i64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            line_id: line_id.into(),
            subject_id,
            quantity,
            qty_from: tier.qty_from,
            qty_to: tier.qty_to,
            unit_price: tier.unit_price,
            currency: tier.currency.clone(),
            source: tier.source.clone(),
            captured_ms,
        }
    }
}
