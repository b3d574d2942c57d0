//! Normalization of externally synced pricing configuration.
//!
//! Raw configuration arrives as loosely typed JSON with historical field
//! names (see [`aliases`]). Everything here degrades silently: malformed
//! rows are dropped and logged, never returned as errors.

pub mod aliases;
pub mod csv_import;
pub mod selection;

use crate::domain::{
    Decimal, MarkingArea, Technique, TechniqueCatalog, TechniqueRef, TechniqueTier, Tier,
    TierTable,
};
use aliases::{lookup, parse_decimal, parse_quantity, parse_string, Quantity};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub use csv_import::tiers_from_csv;
pub use selection::parse_selections;

/// Why a tier row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NotARecord,
    MissingBounds,
    MissingPrice,
    BadQuantity,
    BadPrice,
    InvertedRange,
}

/// Raw records inside `raw`, each with its row index.
///
/// Accepts an array, an object keyed by row index (as PHP-side syncs emit),
/// a single record, or any of these encoded as a JSON string. Index-keyed
/// objects are read in numeric key order ("2" before "10"); when some key
/// is not an index the map order is kept and rows are numbered by position.
fn indexed_records(raw: &Value) -> Vec<(usize, Value)> {
    match raw {
        Value::Array(items) => items.iter().cloned().enumerate().collect(),
        Value::Object(map) => {
            if map.is_empty() || !map.values().all(Value::is_object) {
                return vec![(0, raw.clone())];
            }
            let keyed: Option<Vec<(usize, Value)>> = map
                .iter()
                .map(|(k, v)| k.trim().parse::<usize>().ok().map(|idx| (idx, v.clone())))
                .collect();
            match keyed {
                Some(mut rows) => {
                    rows.sort_by_key(|(idx, _)| *idx);
                    rows
                }
                None => map.values().cloned().enumerate().collect(),
            }
        }
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ (Value::Array(_) | Value::Object(_))) => indexed_records(&inner),
            _ => Vec::new(),
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => Vec::new(),
    }
}

fn records(raw: &Value) -> Vec<Value> {
    indexed_records(raw).into_iter().map(|(_, v)| v).collect()
}

fn parse_tier(record: &Map<String, Value>) -> Result<Tier, Rejection> {
    let from_raw = lookup(record, aliases::QTY_FROM);
    let price_raw = lookup(record, aliases::UNIT_PRICE);

    let price_raw = match (from_raw, price_raw) {
        (None, None) => return Err(Rejection::MissingBounds),
        (_, None) => return Err(Rejection::MissingPrice),
        (_, Some(p)) => p,
    };

    let qty_from = match from_raw.map(parse_quantity) {
        None => 0,
        Some(Quantity::Value(q)) => q,
        Some(Quantity::Invalid) => return Err(Rejection::BadQuantity),
    };
    let qty_to = match lookup(record, aliases::QTY_TO).map(parse_quantity) {
        None => 0,
        Some(Quantity::Value(q)) => q,
        Some(Quantity::Invalid) => return Err(Rejection::BadQuantity),
    };
    let unit_price = parse_decimal(price_raw).ok_or(Rejection::BadPrice)?;

    let tier = Tier {
        qty_from,
        qty_to,
        unit_price,
        currency: lookup(record, aliases::CURRENCY).and_then(parse_string),
        source: lookup(record, aliases::SOURCE).and_then(parse_string),
    };

    if tier.unit_price.is_negative() {
        return Err(Rejection::BadPrice);
    }
    if !tier.is_valid() {
        return Err(Rejection::InvertedRange);
    }
    Ok(tier)
}

fn parse_record(raw: &Value) -> Result<Tier, Rejection> {
    raw.as_object()
        .ok_or(Rejection::NotARecord)
        .and_then(parse_tier)
}

/// Normalize raw tier records into a canonical table.
pub fn normalize_records(raw: &[Value]) -> TierTable {
    let tiers = raw
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| match parse_record(record) {
            Ok(tier) => Some(tier),
            Err(reason) => {
                debug!(row = idx, ?reason, "Dropping tier row");
                None
            }
        })
        .collect();
    TierTable::new(tiers)
}

/// Normalize any raw tier configuration shape into a canonical table.
///
/// Empty or entirely invalid input yields an empty table.
pub fn normalize_tiers(raw: &Value) -> TierTable {
    normalize_records(&records(raw))
}

fn parse_escala(raw: &Value) -> Result<TechniqueTier, Rejection> {
    let record = raw.as_object().ok_or(Rejection::NotARecord)?;
    let tier = parse_tier(record)?;
    let price_col = match lookup(record, aliases::PRICE_COL) {
        None => Decimal::zero(),
        Some(v) => parse_decimal(v).ok_or(Rejection::BadPrice)?,
    };
    if price_col.is_negative() {
        return Err(Rejection::BadPrice);
    }
    Ok(TechniqueTier { tier, price_col })
}

fn non_negative(record: &Map<String, Value>, keys: &[&str]) -> Decimal {
    lookup(record, keys)
        .and_then(parse_decimal)
        .filter(|d| !d.is_negative())
        .unwrap_or_default()
}

fn whole(record: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    match lookup(record, keys).map(parse_quantity) {
        Some(Quantity::Value(q)) => Some(q),
        _ => None,
    }
}

/// Normalize one raw technique definition.
///
/// `fallback_ref` is used when the record carries no reference of its own
/// (e.g. when techniques arrive as an object keyed by reference).
pub fn normalize_technique(fallback_ref: Option<&str>, raw: &Value) -> Option<Technique> {
    let record = raw.as_object()?;
    let technique_ref = lookup(record, aliases::TECHNIQUE_REF)
        .and_then(parse_string)
        .or_else(|| fallback_ref.map(str::to_string))
        .map(TechniqueRef::new)
        .filter(|r| !r.is_blank())?;

    let mut precio_escalas: Vec<TechniqueTier> = lookup(record, aliases::ESCALAS)
        .map(records)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| match parse_escala(row) {
            Ok(escala) => Some(escala),
            Err(reason) => {
                debug!(technique = %technique_ref, row = idx, ?reason, "Dropping escala row");
                None
            }
        })
        .collect();
    precio_escalas.sort_by_key(|e| e.tier.qty_from);

    let col_inc = whole(record, aliases::COL_INC)
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(1)
        .max(1);

    Some(Technique {
        technique_ref,
        col_inc,
        cliche: non_negative(record, aliases::CLICHE),
        cliche_repetition: non_negative(record, aliases::CLICHE_REPETITION),
        min: whole(record, aliases::TECHNIQUE_MIN).unwrap_or(0),
        precio_escalas,
    })
}

/// Normalize a technique catalog: an object keyed by reference or an array
/// of technique records.
pub fn normalize_techniques(raw: &Value) -> TechniqueCatalog {
    match raw {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| normalize_technique(Some(key), value))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|value| normalize_technique(None, value))
            .collect(),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .map(|inner| normalize_techniques(&inner))
            .unwrap_or_default(),
        _ => TechniqueCatalog::new(),
    }
}

fn parse_area(raw: &Value) -> Option<MarkingArea> {
    let record = raw.as_object()?;
    let technique_ref = lookup(record, aliases::AREA_TECHNIQUE)
        .and_then(parse_string)
        .map(TechniqueRef::new)?;
    let text = |keys: &[&str]| {
        lookup(record, keys)
            .and_then(parse_string)
            .unwrap_or_default()
    };

    Some(MarkingArea {
        print_area_id: text(aliases::AREA_ID),
        position: text(aliases::AREA_POSITION),
        technique_ref,
        max_colors: whole(record, aliases::AREA_MAX_COLORS)
            .and_then(|c| u32::try_from(c).ok())
            .filter(|c| *c > 0)
            .unwrap_or(1),
        width: text(aliases::AREA_WIDTH),
        height: text(aliases::AREA_HEIGHT),
        area_img: lookup(record, aliases::AREA_IMG).and_then(parse_string),
    })
}

/// Normalize a product's marking areas, keyed by area index.
///
/// Areas without a technique are dropped; the others keep their index so
/// selections still line up with them.
pub fn normalize_areas(raw: &Value) -> BTreeMap<usize, MarkingArea> {
    indexed_records(raw)
        .into_iter()
        .filter_map(|(idx, record)| parse_area(&record).map(|area| (idx, area)))
        .collect()
}
