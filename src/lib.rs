pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod normalize;

pub use cart::{AdjustedLine, CartAdjuster, CartLine, Recalc, RecalcContext};
pub use catalog::PricingCatalog;
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    AreaSelection, Decimal, MarkingArea, SubjectId, Technique, TechniqueCatalog, TechniqueRef,
    TechniqueTier, Tier, TierSnapshot, TierTable,
};
pub use engine::{price_area, price_customization, resolve_price, resolve_tier, PriceLookup};
pub use error::AppError;
pub use normalize::{normalize_technique, normalize_techniques, normalize_tiers};
