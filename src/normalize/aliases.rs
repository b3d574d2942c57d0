//! Accepted field-name aliases for externally synced configuration, and the
//! loose scalar parsing that goes with them.
//!
//! Every alias list is ordered: the first key present (and non-empty) wins.
//! Nothing outside `normalize` should ever see these raw names.

use crate::domain::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal as RustDecimal;
use serde_json::{Map, Value};
use std::str::FromStr;

// Tier rows (product tiers and technique escalas).
pub const QTY_FROM: &[&str] = &[
    "qty_from",
    "min_qty",
    "from",
    "min",
    "cantidad_desde",
    "desde",
    "quantity_from",
];
pub const QTY_TO: &[&str] = &[
    "qty_to",
    "max_qty",
    "to",
    "max",
    "cantidad_hasta",
    "hasta",
    "quantity_to",
];
pub const UNIT_PRICE: &[&str] = &["unit_price", "price", "precio", "amount", "value"];
pub const PRICE_COL: &[&str] = &["price_col", "precio_col", "color_price"];
pub const CURRENCY: &[&str] = &["currency", "moneda"];
pub const SOURCE: &[&str] = &["source", "origen"];

// Techniques.
pub const TECHNIQUE_REF: &[&str] = &["ref", "technique_ref", "referencia", "code"];
pub const COL_INC: &[&str] = &["col_inc", "colors_included", "colores_incluidos"];
pub const CLICHE: &[&str] = &["cliche", "cliche_price", "precio_cliche"];
pub const CLICHE_REPETITION: &[&str] = &[
    "cliche_repetition",
    "cliche_rep",
    "precio_cliche_repeticion",
];
pub const TECHNIQUE_MIN: &[&str] = &["min", "min_qty", "minimo"];
pub const ESCALAS: &[&str] = &["precio_escalas", "escalas", "tiers", "price_tiers"];

// Marking areas.
pub const AREA_ID: &[&str] = &["print_area_id", "area_id", "id"];
pub const AREA_POSITION: &[&str] = &["position", "posicion", "label"];
pub const AREA_TECHNIQUE: &[&str] = &["technique_ref", "tecnica", "technique"];
pub const AREA_MAX_COLORS: &[&str] = &["max_colors", "max_colores", "colors"];
pub const AREA_WIDTH: &[&str] = &["width", "ancho"];
pub const AREA_HEIGHT: &[&str] = &["height", "alto"];
pub const AREA_IMG: &[&str] = &["area_img", "img", "image"];

// Shopper selections.
pub const SEL_ENABLED: &[&str] = &["enabled", "active", "selected"];
pub const SEL_TECHNIQUE: &[&str] = &["technique_ref", "technique", "tecnica"];
pub const SEL_COLORS: &[&str] = &["colors", "colores", "num_colors"];
pub const SEL_REPETITION: &[&str] = &["cliche_repetition", "repeticion_cliche", "repetition"];
pub const SEL_QUANTITY: &[&str] = &["quantity", "qty", "cantidad"];

/// First alias present with a meaningful value. `null` and blank strings
/// count as absent.
pub fn lookup<'a>(record: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| match record.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    })
}

/// Parse a number or numeric string. `,` is accepted as decimal separator.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(Decimal::from(RustDecimal::from(u)))
            } else if let Some(i) = n.as_i64() {
                Some(Decimal::from(RustDecimal::from(i)))
            } else {
                n.as_f64().and_then(RustDecimal::from_f64).map(Decimal::from)
            }
        }
        Value::String(s) => {
            let cleaned = s.trim().replace(',', ".");
            RustDecimal::from_str(&cleaned)
                .or_else(|_| RustDecimal::from_scientific(&cleaned))
                .ok()
                .map(Decimal::from)
        }
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Outcome of reading a whole-number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Value(u64),
    /// Present but negative, fractional or not a number.
    Invalid,
}

pub fn parse_quantity(value: &Value) -> Quantity {
    let Some(d) = parse_decimal(value) else {
        return Quantity::Invalid;
    };
    let inner = d.inner();
    if inner.is_sign_negative() && !inner.is_zero() {
        return Quantity::Invalid;
    }
    if !inner.fract().is_zero() {
        return Quantity::Invalid;
    }
    match inner.trunc().to_u64() {
        Some(q) => Quantity::Value(q),
        None => Quantity::Invalid,
    }
}

/// Loose boolean: form posts send "1", "on", "yes", "true".
pub fn parse_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "si" | "sí"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Strings and numbers both make usable identifiers.
pub fn parse_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
