//! Read path over the catalog, aggregates, and QC log. Everything here is a
//! snapshot read: locks are taken briefly per collection, writers are never
//! blocked for the duration of a query, and an approved submission is
//! visible to the very next read.

use std::{cmp::Ordering, collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    aggregate::{confidence_label, AggregateStore, ItemAggregate},
    catalog::Catalog,
    models::{Decision, MealPeriod, MenuItem, QcLogEntry},
    qc_log::QcLog,
};

/// Admin reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Last24h,
    Last7d,
    Last30d,
    AllTime,
}

impl TimeRange {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "24h" => Some(Self::Last24h),
            "7d" => Some(Self::Last7d),
            "30d" => Some(Self::Last30d),
            "all" => Some(Self::AllTime),
            _ => None,
        }
    }

    fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Last24h => Some(now - Duration::hours(24)),
            Self::Last7d => Some(now - Duration::days(7)),
            Self::Last30d => Some(now - Duration::days(30)),
            Self::AllTime => None,
        }
    }
}

/// A menu item together with its live aggregate, as served to the menu and
/// per-item views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedItem {
    pub item: MenuItem,
    pub rating: ItemAggregate,
    pub confidence_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub name: String,
    pub hall: String,
    pub count: u64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_ratings: u64,
    pub total_users: u64,
    pub avg_ratings_per_user: f64,
    pub rejection_rate: f64,
    pub avg_confidence: f64,
    pub active_users: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QcLogPage {
    pub entries: Vec<QcLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_before: Option<u64>,
}

pub struct QueryService {
    catalog: Arc<Catalog>,
    aggregates: Arc<AggregateStore>,
    log: Arc<QcLog>,
}

impl QueryService {
    pub fn new(catalog: Arc<Catalog>, aggregates: Arc<AggregateStore>, log: Arc<QcLog>) -> Self {
        Self {
            catalog,
            aggregates,
            log,
        }
    }

    /// Aggregate for one item. `None` only when the catalog does not know
    /// the item; a known item with no ratings yet returns the zero aggregate.
    pub fn aggregate_for(&self, item_id: &str) -> Option<RatedItem> {
        let item = self.catalog.get(item_id)?.clone();
        let rating = self
            .aggregates
            .get(&self.catalog.canonical(item_id))
            .unwrap_or_else(ItemAggregate::empty);
        let confidence_label = confidence_label(rating.confidence);

        Some(RatedItem {
            item,
            rating,
            confidence_label,
        })
    }

    /// Menu browse: catalog items with their aggregates, optionally filtered
    /// by hall and meal period, ordered by item name.
    pub fn menu(&self, hall: Option<&str>, meal: Option<MealPeriod>) -> Vec<RatedItem> {
        let mut entries: Vec<RatedItem> = self
            .catalog
            .items()
            .filter(|item| hall.map_or(true, |h| item.hall.eq_ignore_ascii_case(h)))
            .filter(|item| meal.map_or(true, |m| item.meal == m))
            .map(|item| {
                let rating = self
                    .aggregates
                    .get(&self.catalog.canonical(&item.id))
                    .unwrap_or_else(ItemAggregate::empty);
                let confidence_label = confidence_label(rating.confidence);

                RatedItem {
                    item: item.clone(),
                    rating,
                    confidence_label,
                }
            })
            .collect();

        entries.sort_by(|a, b| a.item.name.cmp(&b.item.name));
        entries
    }

    /// Most-rated items, count descending.
    pub fn top_items(&self, limit: usize) -> Vec<TopItem> {
        let mut rows: Vec<TopItem> = self
            .aggregates
            .snapshot()
            .into_iter()
            .filter(|(_, aggregate)| aggregate.count > 0)
            .filter_map(|(canonical, aggregate)| {
                self.catalog.get(&canonical).map(|item| TopItem {
                    name: item.name.clone(),
                    hall: item.hall.clone(),
                    count: aggregate.count,
                    mean: aggregate.mean,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.mean.partial_cmp(&a.mean).unwrap_or(Ordering::Equal))
        });
        rows.truncate(limit);
        rows
    }

    /// QC log page, newest first. `before` restarts the walk below a
    /// previously seen sequence number.
    pub fn qc_log(
        &self,
        range: TimeRange,
        status: Option<Decision>,
        before: Option<u64>,
        limit: usize,
    ) -> QcLogPage {
        let cutoff = range.cutoff(Utc::now());

        self.log.with_entries(|entries| {
            let mut page = Vec::with_capacity(limit.min(entries.len()));
            let mut more = false;

            for entry in entries.iter().rev() {
                if before.is_some_and(|b| entry.seq >= b) {
                    continue;
                }
                if status.is_some_and(|s| entry.decision != s) {
                    continue;
                }
                if cutoff.is_some_and(|c| entry.recorded_at < c) {
                    continue;
                }
                if page.len() == limit {
                    more = true;
                    break;
                }
                page.push(entry.clone());
            }

            let next_before = if more {
                page.last().map(|entry| entry.seq)
            } else {
                None
            };

            QcLogPage {
                entries: page,
                next_before,
            }
        })
    }

    /// Dashboard stats: submission counts folded over the QC log bounded by
    /// the range, user totals over the whole log, and the current mean
    /// confidence across rated items.
    pub fn summary(&self, range: TimeRange) -> SummaryStats {
        let cutoff = range.cutoff(Utc::now());

        let (total_ratings, rejected, in_range, total_users, approved_all, active_users) =
            self.log.with_entries(|entries| {
                let mut total_ratings = 0u64;
                let mut rejected = 0u64;
                let mut in_range = 0u64;
                let mut approved_all = 0u64;
                let mut users_all: HashSet<&str> = HashSet::new();
                let mut users_in_range: HashSet<&str> = HashSet::new();

                for entry in entries {
                    users_all.insert(entry.user_id.as_str());
                    if entry.decision == Decision::Approved {
                        approved_all += 1;
                    }

                    if cutoff.is_some_and(|c| entry.recorded_at < c) {
                        continue;
                    }
                    in_range += 1;
                    users_in_range.insert(entry.user_id.as_str());
                    match entry.decision {
                        Decision::Approved => total_ratings += 1,
                        Decision::Rejected => rejected += 1,
                    }
                }

                (
                    total_ratings,
                    rejected,
                    in_range,
                    users_all.len() as u64,
                    approved_all,
                    users_in_range.len() as u64,
                )
            });

        let rated: Vec<f64> = self
            .aggregates
            .snapshot()
            .into_iter()
            .filter(|(_, aggregate)| aggregate.count > 0)
            .map(|(_, aggregate)| aggregate.confidence)
            .collect();
        let avg_confidence = if rated.is_empty() {
            0.0
        } else {
            rated.iter().sum::<f64>() / rated.len() as f64
        };

        SummaryStats {
            total_ratings,
            total_users,
            avg_ratings_per_user: if total_users == 0 {
                0.0
            } else {
                approved_all as f64 / total_users as f64
            },
            rejection_rate: if in_range == 0 {
                0.0
            } else {
                rejected as f64 / in_range as f64
            },
            avg_confidence,
            active_users,
        }
    }

    /// CSV dump of the full QC log, for the dashboard's export button.
    pub fn export_qc_log(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(["seq", "recordedAt", "userId", "item", "decision", "reason"])?;

            self.log.with_entries(|entries| -> Result<(), csv::Error> {
                for entry in entries {
                    writer.write_record([
                        entry.seq.to_string(),
                        entry.recorded_at.to_rfc3339(),
                        entry.user_id.clone(),
                        entry.item_label(),
                        entry.decision.to_string(),
                        entry.reason_text().to_string(),
                    ])?;
                }
                Ok(())
            })?;

            writer.flush()?;
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::{
        filter::ContentFilter,
        models::{MealPeriod, MenuItem, RatingSubmission},
        qc::QcPipeline,
    };

    fn fixture() -> (QcPipeline, QueryService, Arc<QcLog>) {
        let catalog = Arc::new(Catalog::from_items(vec![
            MenuItem {
                id: "hill_french_001".to_string(),
                name: "French Toast".to_string(),
                hall: "Hill College House".to_string(),
                meal: MealPeriod::Breakfast,
                served_on: NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(),
            },
            MenuItem {
                id: "kings_pizza_001".to_string(),
                name: "Cheese Pizza".to_string(),
                hall: "Kings Court English House".to_string(),
                meal: MealPeriod::Dinner,
                served_on: NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(),
            },
        ]));
        let denylist = ["damn", "hell", "crap"].map(String::from);
        let aggregates = Arc::new(AggregateStore::new());
        let log = Arc::new(QcLog::new());
        let pipeline = QcPipeline::new(
            catalog.clone(),
            ContentFilter::new(500, &denylist),
            aggregates.clone(),
            log.clone(),
        );
        let query = QueryService::new(catalog, aggregates, log.clone());

        (pipeline, query, log)
    }

    fn submission(user: &str, item: &str, stars: i64, comment: Option<&str>) -> RatingSubmission {
        RatingSubmission {
            user_id: user.to_string(),
            item_id: item.to_string(),
            stars,
            comment: comment.map(String::from),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn read_your_writes_on_aggregates() {
        let (pipeline, query, _) = fixture();

        pipeline.process(&submission("u1", "hill_french_001", 5, None));
        let view = query.aggregate_for("hill_french_001").unwrap();

        assert_eq!(view.rating.count, 1);
        assert_eq!(view.rating.mean, 5.0);
        assert_eq!(view.confidence_label, "Low");
    }

    #[test]
    fn unknown_item_is_not_found_but_unrated_item_is_zero() {
        let (_, query, _) = fixture();

        assert!(query.aggregate_for("lauder_burger_001").is_none());

        let view = query.aggregate_for("kings_pizza_001").unwrap();
        assert_eq!(view.rating.count, 0);
        assert_eq!(view.rating.mean, 0.0);
    }

    #[test]
    fn menu_filters_by_hall_and_meal() {
        let (_, query, _) = fixture();

        assert_eq!(query.menu(None, None).len(), 2);
        assert_eq!(query.menu(Some("Hill College House"), None).len(), 1);
        assert_eq!(query.menu(None, Some(MealPeriod::Dinner)).len(), 1);
        assert_eq!(
            query
                .menu(Some("hill college house"), Some(MealPeriod::Dinner))
                .len(),
            0
        );
    }

    #[test]
    fn top_items_orders_by_count() {
        let (pipeline, query, _) = fixture();

        for user in ["u1", "u2", "u3"] {
            pipeline.process(&submission(user, "kings_pizza_001", 4, None));
        }
        pipeline.process(&submission("u1", "hill_french_001", 5, None));

        let top = query.top_items(10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Cheese Pizza");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].name, "French Toast");

        assert_eq!(query.top_items(1).len(), 1);
    }

    #[test]
    fn qc_log_pages_newest_first_with_restartable_cursor() {
        let (pipeline, query, _) = fixture();

        for i in 0..5 {
            pipeline.process(&submission(&format!("u{i}"), "kings_pizza_001", 4, None));
        }

        let first = query.qc_log(TimeRange::AllTime, None, None, 2);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.entries[0].seq, 5);
        assert_eq!(first.entries[1].seq, 4);
        assert_eq!(first.next_before, Some(4));

        let second = query.qc_log(TimeRange::AllTime, None, first.next_before, 2);
        assert_eq!(second.entries[0].seq, 3);
        assert_eq!(second.entries[1].seq, 2);

        let last = query.qc_log(TimeRange::AllTime, None, second.next_before, 2);
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.entries[0].seq, 1);
        assert_eq!(last.next_before, None);
    }

    #[test]
    fn qc_log_filters_by_status() {
        let (pipeline, query, _) = fixture();

        pipeline.process(&submission("u1", "kings_pizza_001", 4, None));
        pipeline.process(&submission("u1", "kings_pizza_001", 4, None));
        pipeline.process(&submission("u2", "kings_pizza_001", 2, Some("what the hell")));

        let rejected = query.qc_log(TimeRange::AllTime, Some(Decision::Rejected), None, 10);
        assert_eq!(rejected.entries.len(), 2);
        assert!(rejected.entries.iter().all(|e| e.decision == Decision::Rejected));
    }

    #[test]
    fn summary_folds_the_log() {
        let (pipeline, query, _) = fixture();

        pipeline.process(&submission("u1", "kings_pizza_001", 4, None));
        pipeline.process(&submission("u2", "kings_pizza_001", 5, None));
        pipeline.process(&submission("u1", "kings_pizza_001", 4, None)); // duplicate
        pipeline.process(&submission("u3", "nope", 4, None)); // unknown item

        let stats = query.summary(TimeRange::AllTime);
        assert_eq!(stats.total_ratings, 2);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.rejection_rate, 0.5);
        assert!(stats.avg_confidence > 0.0);
        assert!((stats.avg_ratings_per_user - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn summary_and_paging_respect_the_range_bound() {
        let (pipeline, query, log) = fixture();

        pipeline.process(&submission("u1", "kings_pizza_001", 4, None));

        // A submission processed two days ago, appended with its original
        // timestamp the way the pipeline recorded it.
        log.append(crate::models::QcLogEntry {
            seq: 0,
            submission_id: Uuid::new_v4(),
            recorded_at: Utc::now() - Duration::days(2),
            user_id: "old_user".to_string(),
            item_id: "kings pizza 001".to_string(),
            period: None,
            decision: Decision::Approved,
            reason: None,
        });

        let day = query.summary(TimeRange::Last24h);
        assert_eq!(day.total_ratings, 1);
        assert_eq!(day.active_users, 1);
        assert_eq!(day.total_users, 2);

        let all = query.summary(TimeRange::AllTime);
        assert_eq!(all.total_ratings, 2);

        let page = query.qc_log(TimeRange::Last24h, None, None, 10);
        assert_eq!(page.entries.len(), 1);
    }

    #[test]
    fn csv_export_includes_header_and_rows() {
        let (pipeline, query, _) = fixture();

        pipeline.process(&submission("u1", "kings_pizza_001", 4, None));
        pipeline.process(&submission("u2", "kings_pizza_001", 2, Some("utter crap")));

        let csv = query.export_qc_log().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "seq,recordedAt,userId,item,decision,reason"
        );
        assert_eq!(lines.clone().count(), 2);
        assert!(csv.contains("Passed all checks"));
        assert!(csv.contains("Profanity detected"));
    }
}
