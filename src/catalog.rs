//! # Menu Catalog
//!
//! In-memory copy of the menu, loaded once at startup.
//!
//! The catalog is the source of truth for which items exist and for each
//! item's (hall, meal, serving date). A submission's serving period comes
//! from here, never from the submission's wall clock: a rating sent just
//! after midnight for a dinner item still belongs to that dinner's date.
//!
//! Items are keyed by a canonical form of their id (lowercased, separators
//! collapsed) so that `Hill_FrenchToast` and `hill  frenchtoast` resolve to
//! the same item and, downstream, the same dedup slot.

use std::{collections::HashMap, fs::read_to_string};

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::{info, warn};

use crate::models::{MealPeriod, MenuItem, ServingPeriodKey};

struct Canonicalizer {
    separators: Regex,
    strip: Regex,
    collapse: Regex,
}

impl Canonicalizer {
    fn new() -> Self {
        Self {
            separators: Regex::new(r"[_]").unwrap(),
            strip: Regex::new(r"[^A-Za-z0-9- ]").unwrap(),
            collapse: Regex::new(r" +").unwrap(),
        }
    }

    fn apply(&self, input: &str) -> String {
        let mut s = self.separators.replace_all(input, " ").into_owned();

        s = self.strip.replace_all(&s, "").into_owned();
        s = s.trim().to_string();

        self.collapse.replace_all(&s, " ").into_owned().to_lowercase()
    }
}

pub struct Catalog {
    items: HashMap<String, MenuItem>,
    canon: Canonicalizer,
}

impl Catalog {
    pub fn from_items(items: Vec<MenuItem>) -> Self {
        let canon = Canonicalizer::new();
        let items = items
            .into_iter()
            .map(|item| (canon.apply(&item.id), item))
            .collect();

        Self { items, canon }
    }

    /// Load the catalog from a JSON file. Startup-only; a malformed file is
    /// a deployment error, not a request error.
    pub fn load(path: &str) -> Self {
        let raw = read_to_string(path)
            .map_err(|e| {
                warn!("Failed to read catalog from {path}: {e}");
            })
            .expect("Catalog misconfigured!");

        let items: Vec<MenuItem> = serde_json::from_str(&raw)
            .map_err(|e| {
                warn!("Failed to parse catalog {path}: {e}");
            })
            .expect("Catalog misconfigured!");

        info!("Loaded {} menu items from {path}", items.len());
        Self::from_items(items)
    }

    /// The launch menu, served today. Used when no catalog file is configured.
    pub fn seed() -> Self {
        let today = Local::now().date_naive();
        Self::from_items(seed_items(today))
    }

    pub fn canonical(&self, raw: &str) -> String {
        self.canon.apply(raw)
    }

    pub fn get(&self, item_id: &str) -> Option<&MenuItem> {
        self.items.get(&self.canon.apply(item_id))
    }

    /// Derive the serving period for a submission against this item. The
    /// date is the item's serving date from the catalog.
    pub fn resolve_period(&self, item_id: &str) -> Option<ServingPeriodKey> {
        let canonical = self.canon.apply(item_id);

        self.items.get(&canonical).map(|item| ServingPeriodKey {
            hall: item.hall.clone(),
            item: canonical,
            meal: item.meal,
            date: item.served_on,
        })
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.values()
    }
}

fn seed_items(served_on: NaiveDate) -> Vec<MenuItem> {
    vec![
        MenuItem {
            id: "hill_pasta_001".to_string(),
            name: "Penne Pasta with Marinara".to_string(),
            hall: "Hill College House".to_string(),
            meal: MealPeriod::Lunch,
            served_on,
        },
        MenuItem {
            id: "kings_pizza_001".to_string(),
            name: "Cheese Pizza".to_string(),
            hall: "Kings Court English House".to_string(),
            meal: MealPeriod::Dinner,
            served_on,
        },
        MenuItem {
            id: "hill_french_001".to_string(),
            name: "French Toast".to_string(),
            hall: "Hill College House".to_string(),
            meal: MealPeriod::Breakfast,
            served_on,
        },
        MenuItem {
            id: "mcclelland_salad_001".to_string(),
            name: "Caesar Salad".to_string(),
            hall: "McClelland Express".to_string(),
            meal: MealPeriod::Lunch,
            served_on,
        },
    ]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_items(vec![MenuItem {
            id: "Hill_FrenchToast".to_string(),
            name: "French Toast".to_string(),
            hall: "Hill College House".to_string(),
            meal: MealPeriod::Dinner,
            served_on: NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(),
        }])
    }

    #[test]
    fn canonical_collapses_representations() {
        let catalog = catalog();
        assert_eq!(catalog.canonical("Hill_FrenchToast"), "hill frenchtoast");
        assert_eq!(catalog.canonical("hill   frenchtoast"), "hill frenchtoast");
        assert_eq!(catalog.canonical("  HILL FRENCHTOAST!  "), "hill frenchtoast");
    }

    #[test]
    fn resolves_period_from_serving_date() {
        let catalog = catalog();
        let period = catalog.resolve_period("hill  frenchtoast").unwrap();

        assert_eq!(period.hall, "Hill College House");
        assert_eq!(period.item, "hill frenchtoast");
        assert_eq!(period.meal, MealPeriod::Dinner);
        assert_eq!(period.date, NaiveDate::from_ymd_opt(2025, 11, 14).unwrap());
    }

    #[test]
    fn unknown_item_does_not_resolve() {
        assert!(catalog().resolve_period("kings_pizza_001").is_none());
    }

    #[test]
    fn seed_has_all_halls() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.items().count(), 4);
        assert!(catalog.get("hill_french_001").is_some());
    }
}
