//! Quantity tiers and the canonical tier table.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Anything that prices a quantity range. Product tiers and technique
/// escalas share this shape and are resolved by the same algorithm.
pub trait TierRange {
    /// Inclusive lower bound.
    fn qty_from(&self) -> u64;
    /// Inclusive upper bound, 0 = unbounded.
    fn qty_to(&self) -> u64;
    fn unit_price(&self) -> Decimal;

    /// True when `quantity` falls inside this range.
    fn contains(&self, quantity: u64) -> bool {
        quantity >= self.qty_from() && (self.qty_to() == 0 || quantity <= self.qty_to())
    }
}

/// One row of a price schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub qty_from: u64,
    /// 0 means unbounded.
    pub qty_to: u64,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Provenance tag (e.g. which sync wrote the row). Never used for pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Tier {
    pub fn new(qty_from: u64, qty_to: u64, unit_price: Decimal) -> Self {
        Self {
            qty_from,
            qty_to,
            unit_price,
            currency: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Range and price invariants a canonical table requires.
    pub fn is_valid(&self) -> bool {
        !self.unit_price.is_negative() && (self.qty_to == 0 || self.qty_to >= self.qty_from)
    }
}

impl TierRange for Tier {
    fn qty_from(&self) -> u64 {
        self.qty_from
    }

    fn qty_to(&self) -> u64 {
        self.qty_to
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

/// Tiers of one pricing subject, sorted ascending by `qty_from`.
///
/// Overlapping ranges are kept; the resolver decides which one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable(Vec<Tier>);

impl TierTable {
    /// Build a table, sorting by `qty_from`. The sort is stable so rows with
    /// the same lower bound keep their source order.
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(|t| t.qty_from);
        TierTable(tiers)
    }

    pub fn empty() -> Self {
        TierTable(Vec::new())
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<Tier> {
        self.0
    }
}
