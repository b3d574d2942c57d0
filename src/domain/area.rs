//! Marking areas and the shopper's per-area selections.

use crate::domain::TechniqueRef;
use serde::{Deserialize, Serialize};

/// A printable zone on a product. Static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingArea {
    pub print_area_id: String,
    pub position: String,
    pub technique_ref: TechniqueRef,
    pub max_colors: u32,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub area_img: Option<String>,
}

/// What the shopper chose for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSelection {
    pub enabled: bool,
    pub technique_ref: Option<TechniqueRef>,
    pub colors: u32,
    pub cliche_repetition: bool,
    /// Overrides the order quantity for this area only.
    pub quantity: Option<u64>,
}

impl AreaSelection {
    pub fn new(technique_ref: impl Into<String>, colors: u32) -> Self {
        Self {
            enabled: true,
            technique_ref: Some(TechniqueRef::new(technique_ref)),
            colors,
            cliche_repetition: false,
            quantity: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            technique_ref: None,
            colors: 0,
            cliche_repetition: false,
            quantity: None,
        }
    }

    pub fn with_repetition(mut self) -> Self {
        self.cliche_repetition = true;
        self
    }

    pub fn with_quantity(mut self, quantity: u64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Technique reference when one is actually chosen.
    pub fn technique(&self) -> Option<&TechniqueRef> {
        self.technique_ref.as_ref().filter(|r| !r.is_blank())
    }
}
