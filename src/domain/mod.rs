//! Domain types for tiered and customization pricing.
//!
//! This module provides:
//! - Lossless currency handling via the Decimal wrapper
//! - Domain primitives: SubjectId, TechniqueRef
//! - Tier and TierTable, the canonical price schedule
//! - Techniques, marking areas and shopper selections
//! - Order-line tier snapshots

pub mod area;
pub mod decimal;
pub mod primitives;
pub mod snapshot;
pub mod technique;
pub mod tier;

pub use area::{AreaSelection, MarkingArea};
pub use decimal::Decimal;
pub use primitives::{SubjectId, TechniqueRef};
pub use snapshot::TierSnapshot;
pub use technique::{Technique, TechniqueCatalog, TechniqueTier};
pub use tier::{Tier, TierRange, TierTable};
