//! Pure pricing engine.
//!
//! Everything here is a synchronous function of its inputs: no I/O, no
//! shared state. Caching lives beside the engine in [`memo`], never inside it.

pub mod customization;
pub mod memo;
pub mod resolver;

pub use customization::{
    price_area, price_customization, price_customization_payload, AreaBreakdown,
    CustomizationTotal,
};
pub use memo::PriceMemo;
pub use resolver::{resolve_price, resolve_tier, PriceLookup};
