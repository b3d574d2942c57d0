//! Raw pricing configuration for a set of products and techniques.
//!
//! The catalog stores configuration exactly as it was synced; tier tables
//! and technique catalogs are normalized from it on every request.

use crate::domain::{MarkingArea, SubjectId, TechniqueCatalog, TierTable};
use crate::normalize::{normalize_areas, normalize_techniques, normalize_tiers};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw per-product configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    #[serde(default)]
    pub tiers: Value,
    #[serde(default)]
    pub areas: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingCatalog {
    #[serde(default)]
    pub products: BTreeMap<SubjectId, ProductConfig>,
    /// Raw technique records keyed by reference.
    #[serde(default)]
    pub techniques: BTreeMap<String, Value>,
}

impl PricingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(path.display().to_string(), e))?;
        Self::from_json_str(&content)
    }

    pub fn set_tiers(&mut self, subject: SubjectId, raw: Value) {
        self.products.entry(subject).or_default().tiers = raw;
    }

    pub fn set_areas(&mut self, subject: SubjectId, raw: Value) {
        self.products.entry(subject).or_default().areas = raw;
    }

    pub fn set_technique(&mut self, technique_ref: impl Into<String>, raw: Value) {
        self.techniques.insert(technique_ref.into(), raw);
    }

    /// Canonical tier table for `subject`; empty when none is configured.
    pub fn tier_table(&self, subject: &SubjectId) -> TierTable {
        self.products
            .get(subject)
            .map(|p| normalize_tiers(&p.tiers))
            .unwrap_or_default()
    }

    /// True when `subject` has at least one usable tier of its own.
    pub fn has_tiers(&self, subject: &SubjectId) -> bool {
        !self.tier_table(subject).is_empty()
    }

    /// Marking areas of `subject`, keyed by area index.
    pub fn areas(&self, subject: &SubjectId) -> BTreeMap<usize, MarkingArea> {
        self.products
            .get(subject)
            .map(|p| normalize_areas(&p.areas))
            .unwrap_or_default()
    }

    pub fn technique_catalog(&self) -> TechniqueCatalog {
        let raw = Value::Object(
            self.techniques
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        normalize_techniques(&raw)
    }

    /// Stable hash of the whole raw configuration. Changes whenever any
    /// product or technique changes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (subject, config) in &self.products {
            hasher.update(subject.as_str());
            hasher.update(b"\0");
            hasher.update(config.tiers.to_string());
            hasher.update(b"\0");
            hasher.update(config.areas.to_string());
            hasher.update(b"\n");
        }
        for (technique_ref, raw) in &self.techniques {
            hasher.update(technique_ref);
            hasher.update(b"\0");
            hasher.update(raw.to_string());
            hasher.update(b"\n");
        }
        hex::encode(&hasher.finalize()[..16])
    }
}
