//! # Deduplication Ledger
//!
//! Records which (user, serving period) pairs have already produced a
//! filter-passing submission. One successful reservation per pair, for the
//! lifetime of the ledger; the set only grows.
//!
//! ## Policy
//!
//! A reservation is never rolled back. Once a submission passes the content
//! filter and reserves its slot, that user's period is consumed — "one
//! rating per item per meal period" counts the attempt, not the acceptance.
//! The pipeline runs the filter *before* the ledger, so a user whose comment
//! was rejected keeps their slot and may retry within the same period.
//!
//! ## Atomicity
//!
//! `try_reserve` is the single mutual-exclusion point of the pipeline: the
//! set insert is the check-and-set, so two simultaneous submissions for the
//! same pair yield exactly one `Reserved`.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::models::ServingPeriodKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Reserved,
    AlreadyExists,
}

pub struct Ledger {
    reservations: Mutex<HashSet<(String, ServingPeriodKey)>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            reservations: Mutex::new(HashSet::new()),
        }
    }

    pub fn try_reserve(&self, user_id: &str, period: &ServingPeriodKey) -> Reservation {
        let mut reservations = self.reservations.lock();

        if reservations.insert((user_id.to_string(), period.clone())) {
            Reservation::Reserved
        } else {
            Reservation::AlreadyExists
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::models::MealPeriod;

    fn period() -> ServingPeriodKey {
        ServingPeriodKey {
            hall: "Hill College House".to_string(),
            item: "hill frenchtoast".to_string(),
            meal: MealPeriod::Dinner,
            date: NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(),
        }
    }

    #[test]
    fn second_reservation_is_rejected() {
        let ledger = Ledger::new();
        assert_eq!(ledger.try_reserve("user_abc123", &period()), Reservation::Reserved);
        assert_eq!(
            ledger.try_reserve("user_abc123", &period()),
            Reservation::AlreadyExists
        );
    }

    #[test]
    fn different_users_do_not_collide() {
        let ledger = Ledger::new();
        assert_eq!(ledger.try_reserve("user_abc123", &period()), Reservation::Reserved);
        assert_eq!(ledger.try_reserve("user_xyz789", &period()), Reservation::Reserved);
    }

    #[test]
    fn different_dates_are_separate_periods() {
        let ledger = Ledger::new();
        let mut tomorrow = period();
        tomorrow.date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();

        assert_eq!(ledger.try_reserve("user_abc123", &period()), Reservation::Reserved);
        assert_eq!(ledger.try_reserve("user_abc123", &tomorrow), Reservation::Reserved);
    }

    #[test]
    fn concurrent_reservations_yield_exactly_one_winner() {
        let ledger = Arc::new(Ledger::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                ledger.try_reserve("user_abc123", &period())
            }));
        }

        let outcomes: Vec<Reservation> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let reserved = outcomes
            .iter()
            .filter(|o| **o == Reservation::Reserved)
            .count();

        assert_eq!(reserved, 1);
        assert_eq!(outcomes.len(), 16);
    }
}
