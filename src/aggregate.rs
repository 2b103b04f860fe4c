//! # Aggregation Engine
//!
//! Per-item running statistics, updated only for approved submissions.
//!
//! ## Structure
//!
//! - One registry map: canonical item id to that item's aggregate slot.
//! - One lock per slot: updates to the same item serialize, updates to
//!   different items proceed in parallel. There is no global write lock.
//!
//! Readers take a slot's lock just long enough to clone the aggregate, so a
//! concurrent reader can never observe a count that disagrees with the
//! histogram or a stale mean.
//!
//! Aggregates are never decremented. There is no retraction flow; if one is
//! ever needed it must be a compensating event, not an in-place edit.

use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::confidence::confidence;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAggregate {
    pub count: u64,
    /// Ratings per star value; index i holds the count of (i + 1)-star ratings.
    pub histogram: [u64; 5],
    pub mean: f64,
    pub confidence: f64,
}

impl ItemAggregate {
    pub fn empty() -> Self {
        Self {
            count: 0,
            histogram: [0; 5],
            mean: 0.0,
            confidence: 0.0,
        }
    }

    fn record(&mut self, stars: u8) {
        self.histogram[(stars - 1) as usize] += 1;
        self.count += 1;

        let weighted: u64 = self
            .histogram
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u64 + 1) * c)
            .sum();

        self.mean = weighted as f64 / self.count as f64;
        self.confidence = confidence(&self.histogram);
    }
}

/// Confidence badge shown next to an aggregate.
pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "High"
    } else if confidence >= 0.6 {
        "Medium"
    } else {
        "Low"
    }
}

pub struct AggregateStore {
    items: RwLock<HashMap<String, Arc<Mutex<ItemAggregate>>>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Apply one approved rating and return the updated aggregate.
    /// `stars` must already be validated to 1..=5.
    pub fn apply(&self, item_id: &str, stars: u8) -> ItemAggregate {
        let slot = self.slot(item_id);
        let mut aggregate = slot.lock();

        aggregate.record(stars);
        aggregate.clone()
    }

    pub fn get(&self, item_id: &str) -> Option<ItemAggregate> {
        self.items.read().get(item_id).map(|slot| slot.lock().clone())
    }

    pub fn snapshot(&self) -> Vec<(String, ItemAggregate)> {
        self.items
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.lock().clone()))
            .collect()
    }

    fn slot(&self, item_id: &str) -> Arc<Mutex<ItemAggregate>> {
        if let Some(slot) = self.items.read().get(item_id) {
            return slot.clone();
        }

        let mut items = self.items.write();
        items
            .entry(item_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ItemAggregate::empty())))
            .clone()
    }
}

impl Default for AggregateStore {
    fn default() -> Self {
        Self::new()
    }
}
