use crate::domain::{Decimal, TierRange, TierTable};

/// Result of a tier lookup.
///
/// `NotFound` means "tiered pricing does not apply": callers fall back to
/// another price source. It is never the same thing as a zero price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceLookup {
    Found(Decimal),
    NotFound,
}

impl PriceLookup {
    pub fn price(&self) -> Option<Decimal> {
        match self {
            PriceLookup::Found(price) => Some(*price),
            PriceLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PriceLookup::Found(_))
    }
}

/// Pick the tier that prices `quantity`.
///
/// - quantity is clamped to at least 1;
/// - among matching rows the highest `qty_from` wins (the later row on a tie);
/// - with no match the last row applies;
/// - an empty table or a non-positive price yields `None`.
///
/// `tiers` must be sorted ascending by `qty_from`.
pub fn resolve_tier<T: TierRange>(tiers: &[T], quantity: u64) -> Option<&T> {
    let quantity = quantity.max(1);

    let chosen = tiers
        .iter()
        .filter(|t| t.contains(quantity))
        .max_by_key(|t| t.qty_from())
        .or_else(|| tiers.last())?;

    if !chosen.unit_price().is_positive() {
        return None;
    }
    Some(chosen)
}

/// Unit price for `quantity` from a canonical tier table.
pub fn resolve_price(table: &TierTable, quantity: u64) -> PriceLookup {
    match resolve_tier(table.tiers(), quantity) {
        Some(tier) => PriceLookup::Found(tier.unit_price),
        None => PriceLookup::NotFound,
    }
}
