//! Marking techniques and their quantity escalas.

use crate::domain::{Decimal, Tier, TierRange, TechniqueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One escala row: a tier plus the per-unit price of each extra colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueTier {
    #[serde(flatten)]
    pub tier: Tier,
    pub price_col: Decimal,
}

impl TierRange for TechniqueTier {
    fn qty_from(&self) -> u64 {
        self.tier.qty_from
    }

    fn qty_to(&self) -> u64 {
        self.tier.qty_to
    }

    fn unit_price(&self) -> Decimal {
        self.tier.unit_price
    }
}

/// A printing/marking method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub technique_ref: TechniqueRef,
    /// Colours included in the base price. Always >= 1.
    pub col_inc: u32,
    /// Per-colour setup cost for new artwork.
    pub cliche: Decimal,
    /// Per-colour setup cost when the artwork is reused.
    pub cliche_repetition: Decimal,
    /// Minimum billable quantity for the technique line, 0 = none.
    pub min: u64,
    /// Escalas sorted ascending by `qty_from`.
    pub precio_escalas: Vec<TechniqueTier>,
}

impl Technique {
    pub fn has_escalas(&self) -> bool {
        !self.precio_escalas.is_empty()
    }
}

/// Techniques keyed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechniqueCatalog {
    techniques: BTreeMap<TechniqueRef, Technique>,
}

impl TechniqueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, technique: Technique) {
        self.techniques
            .insert(technique.technique_ref.clone(), technique);
    }

    pub fn get(&self, technique_ref: &TechniqueRef) -> Option<&Technique> {
        self.techniques.get(technique_ref)
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }
}

impl FromIterator<Technique> for TechniqueCatalog {
    fn from_iter<I: IntoIterator<Item = Technique>>(iter: I) -> Self {
        let mut catalog = TechniqueCatalog::new();
        for technique in iter {
            catalog.insert(technique);
        }
        catalog
    }
}
