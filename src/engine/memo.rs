//! Request-scoped memoization of tier lookups.

use super::resolver::resolve_tier;
use crate::domain::{SubjectId, Tier, TierTable};
use std::collections::HashMap;
use tracing::trace;

/// Caches the resolved tier per `(subject, quantity)`.
///
/// The memo is tagged with the catalog fingerprint it was filled from; a
/// different fingerprint empties it. Misses (no applicable tier) are cached
/// too.
#[derive(Debug, Default)]
pub struct PriceMemo {
    fingerprint: Option<String>,
    entries: HashMap<(SubjectId, u64), Option<Tier>>,
    hits: u64,
}

impl PriceMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries if the configuration fingerprint changed.
    pub fn sync_fingerprint(&mut self, fingerprint: &str) {
        if self.fingerprint.as_deref() != Some(fingerprint) {
            if !self.entries.is_empty() {
                trace!(entries = self.entries.len(), "Pricing configuration changed, clearing memo");
            }
            self.entries.clear();
            self.fingerprint = Some(fingerprint.to_string());
        }
    }

    /// Resolved tier for `subject` at `quantity`, building the table with
    /// `load` only on a miss.
    pub fn resolve<F>(&mut self, subject: &SubjectId, quantity: u64, load: F) -> Option<Tier>
    where
        F: FnOnce() -> TierTable,
    {
        let key = (subject.clone(), quantity);
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }

        let table = load();
        let tier = resolve_tier(table.tiers(), quantity).cloned();
        self.entries.insert(key, tier.clone());
        tier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}
