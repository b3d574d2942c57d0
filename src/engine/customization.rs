//! Marking-area customization pricing.
//!
//! Per area:
//! - technique line: escala price at `max(quantity, technique.min)` units,
//!   billed for that many units;
//! - extra colours: `price_col` per colour beyond `col_inc`, billed at the
//!   real quantity;
//! - cliché: per colour, either the fresh-artwork or the repetition rate.
//!
//! The minimum-quantity floor only inflates the technique line.

use super::resolver::resolve_tier;
use crate::domain::{
    AreaSelection, Decimal, MarkingArea, TechniqueCatalog, TechniqueRef,
};
use crate::normalize::parse_selections;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Every intermediate value of one area's price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaBreakdown {
    pub technique_ref: Option<TechniqueRef>,
    /// Quantity the area was requested for.
    pub quantity: u64,
    /// Quantity the technique line was billed for.
    pub quantity_for_technique: u64,
    pub min_applied: bool,
    pub technique_price: Decimal,
    pub technique_total: Decimal,
    pub colors: u32,
    pub col_inc: u32,
    pub colors_extra: u32,
    pub price_col: Decimal,
    pub color_extra_total: Decimal,
    pub cliche_repetition: bool,
    pub cliche_total: Decimal,
    pub cliche_repetition_total: Decimal,
    pub area_total: Decimal,
}

impl AreaBreakdown {
    fn zero(technique_ref: Option<TechniqueRef>, quantity: u64, colors: u32) -> Self {
        Self {
            technique_ref,
            quantity,
            colors,
            ..Self::default()
        }
    }
}

/// Price one area selection.
///
/// `area` is the product's definition of the zone, when known; it caps the
/// colour count at `max_colors`.
pub fn price_area(
    selection: &AreaSelection,
    quantity: u64,
    catalog: &TechniqueCatalog,
    area: Option<&MarkingArea>,
) -> AreaBreakdown {
    let colors = match area {
        Some(a) => selection.colors.min(a.max_colors),
        None => selection.colors,
    };

    let technique_ref = match selection.technique() {
        Some(r) if selection.enabled => r,
        _ => return AreaBreakdown::zero(None, quantity, colors),
    };
    let zero = || AreaBreakdown::zero(Some(technique_ref.clone()), quantity, colors);

    if quantity == 0 {
        return zero();
    }

    let Some(technique) = catalog.get(technique_ref) else {
        debug!(technique = %technique_ref, "Technique not in catalog, area priced at zero");
        return zero();
    };

    let quantity_for_technique = if technique.min > 0 && quantity < technique.min {
        technique.min
    } else {
        quantity
    };

    let Some(escala) = resolve_tier(&technique.precio_escalas, quantity_for_technique) else {
        debug!(
            technique = %technique_ref,
            quantity = quantity_for_technique,
            "No usable escala for technique, area priced at zero"
        );
        return zero();
    };

    let technique_price = escala.tier.unit_price;
    let colors_extra = colors.saturating_sub(technique.col_inc);

    let Some(amounts) = area_amounts(
        technique_price,
        quantity_for_technique,
        escala.price_col,
        colors_extra,
        quantity,
        if selection.cliche_repetition {
            technique.cliche_repetition
        } else {
            technique.cliche
        },
        colors,
    ) else {
        warn!(
            technique = %technique_ref,
            quantity,
            colors,
            "Area price out of range, area priced at zero"
        );
        return zero();
    };
    let (cliche_total, cliche_repetition_total) = if selection.cliche_repetition {
        (Decimal::zero(), amounts.cliche)
    } else {
        (amounts.cliche, Decimal::zero())
    };

    AreaBreakdown {
        technique_ref: Some(technique_ref.clone()),
        quantity,
        quantity_for_technique,
        min_applied: quantity_for_technique != quantity,
        technique_price,
        technique_total: amounts.technique,
        colors,
        col_inc: technique.col_inc,
        colors_extra,
        price_col: escala.price_col,
        color_extra_total: amounts.color_extra,
        cliche_repetition: selection.cliche_repetition,
        cliche_total,
        cliche_repetition_total,
        area_total: amounts.total,
    }
}

struct AreaAmounts {
    technique: Decimal,
    color_extra: Decimal,
    cliche: Decimal,
    total: Decimal,
}

/// Money lines of one area; `None` when any of them leaves the decimal range.
fn area_amounts(
    technique_price: Decimal,
    quantity_for_technique: u64,
    price_col: Decimal,
    colors_extra: u32,
    quantity: u64,
    cliche_rate: Decimal,
    colors: u32,
) -> Option<AreaAmounts> {
    let technique = technique_price.checked_mul(Decimal::from_quantity(quantity_for_technique))?;
    let color_extra = price_col
        .checked_mul(Decimal::from_quantity(u64::from(colors_extra)))?
        .checked_mul(Decimal::from_quantity(quantity))?;
    let cliche = cliche_rate.checked_mul(Decimal::from_quantity(u64::from(colors)))?;
    let total = technique.checked_add(color_extra)?.checked_add(cliche)?;
    Some(AreaAmounts {
        technique,
        color_extra,
        cliche,
        total,
    })
}

/// Sum of all selected areas, with a per-area breakdown keyed by area index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomizationTotal {
    pub total: Decimal,
    pub breakdown: BTreeMap<usize, AreaBreakdown>,
}

impl CustomizationTotal {
    pub fn is_empty(&self) -> bool {
        self.breakdown.is_empty()
    }
}

/// Price every selection for an order of `quantity` units.
///
/// A selection's own quantity, when set, replaces `quantity` for that area.
/// Disabled areas and areas without a technique are left out of the
/// breakdown. `areas` is keyed by area index, as [`normalize_areas`]
/// returns it.
///
/// [`normalize_areas`]: crate::normalize::normalize_areas
pub fn price_customization(
    selections: &[(usize, AreaSelection)],
    quantity: u64,
    catalog: &TechniqueCatalog,
    areas: &BTreeMap<usize, MarkingArea>,
) -> CustomizationTotal {
    let breakdown: BTreeMap<usize, AreaBreakdown> = selections
        .iter()
        .filter(|(_, sel)| sel.enabled && sel.technique().is_some())
        .map(|(idx, sel)| {
            let area_quantity = sel.quantity.unwrap_or(quantity);
            (*idx, price_area(sel, area_quantity, catalog, areas.get(idx)))
        })
        .collect();

    let total = breakdown
        .values()
        .try_fold(Decimal::zero(), |acc, b| acc.checked_add(b.area_total))
        .unwrap_or_else(|| {
            warn!(areas = breakdown.len(), "Customization total out of range, priced at zero");
            Decimal::zero()
        });
    CustomizationTotal { total, breakdown }
}

/// Same as [`price_customization`] over a raw selection payload.
pub fn price_customization_payload(
    payload: &Value,
    quantity: u64,
    catalog: &TechniqueCatalog,
    areas: &BTreeMap<usize, MarkingArea>,
) -> CustomizationTotal {
    price_customization(&parse_selections(payload), quantity, catalog, areas)
}
