//! Parsing of the shopper's customization payload.

use super::aliases::{self, lookup, parse_bool, parse_quantity, parse_string, Quantity};
use crate::domain::{AreaSelection, TechniqueRef};
use serde_json::{Map, Value};
use tracing::debug;

fn parse_selection(record: &Map<String, Value>) -> AreaSelection {
    let colors = match lookup(record, aliases::SEL_COLORS).map(parse_quantity) {
        Some(Quantity::Value(c)) => u32::try_from(c).unwrap_or(u32::MAX),
        _ => 0,
    };
    let quantity = match lookup(record, aliases::SEL_QUANTITY).map(parse_quantity) {
        Some(Quantity::Value(q)) => Some(q),
        _ => None,
    };

    AreaSelection {
        enabled: lookup(record, aliases::SEL_ENABLED)
            .map(parse_bool)
            .unwrap_or(false),
        technique_ref: lookup(record, aliases::SEL_TECHNIQUE)
            .and_then(parse_string)
            .map(TechniqueRef::new),
        colors,
        cliche_repetition: lookup(record, aliases::SEL_REPETITION)
            .map(parse_bool)
            .unwrap_or(false),
        quantity,
    }
}

/// Parse a selection payload into `(area index, selection)` pairs, sorted by
/// index.
///
/// Accepts an object keyed by area index or an array (position = index).
/// Anything else, and any entry that is not an object, is ignored.
pub fn parse_selections(raw: &Value) -> Vec<(usize, AreaSelection)> {
    let mut out: Vec<(usize, AreaSelection)> = match raw {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| item.as_object().map(|r| (idx, parse_selection(r))))
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, item)| {
                let Ok(idx) = key.trim().parse::<usize>() else {
                    debug!(key = %key, "Ignoring selection with non-numeric area key");
                    return None;
                };
                item.as_object().map(|r| (idx, parse_selection(r)))
            })
            .collect(),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| !v.is_string())
            .map(|v| parse_selections(&v))
            .unwrap_or_default(),
        Value::Null | Value::Bool(_) | Value::Number(_) => Vec::new(),
    };
    out.sort_by_key(|(idx, _)| *idx);
    out
}
