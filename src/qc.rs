//! # QC Pipeline
//!
//! Every submission moves through the same stages and lands in exactly one
//! terminal state:
//!
//! 1. Resolve the serving period from the catalog; an unresolvable item
//!    rejects with `UnknownItem`.
//! 2. Content filter (stars, length, denylist); a failure rejects with the
//!    filter's reason and leaves the dedup ledger untouched, so the user may
//!    fix their comment and retry within the same period.
//! 3. Reserve the (user, period) slot; a prior reservation rejects with
//!    `DuplicateSubmission`.
//! 4. Approve and fold the stars into the item's aggregate.
//!
//! Every path appends exactly one QC log entry, and both the entry and any
//! aggregate update are visible before `process` returns. No stage holds a
//! lock while another stage runs, and nothing here retries on its own —
//! callers retry, bounded by the ledger.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    aggregate::{AggregateStore, ItemAggregate},
    catalog::Catalog,
    filter::ContentFilter,
    ledger::{Ledger, Reservation},
    models::{Decision, QcLogEntry, RatingSubmission, RejectReason, ServingPeriodKey},
    qc_log::QcLog,
};

/// Outcome of one submission, returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QcOutcome {
    pub submission_id: Uuid,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<ItemAggregate>,
}

pub struct QcPipeline {
    catalog: Arc<Catalog>,
    filter: ContentFilter,
    ledger: Ledger,
    aggregates: Arc<AggregateStore>,
    log: Arc<QcLog>,
}

impl QcPipeline {
    pub fn new(
        catalog: Arc<Catalog>,
        filter: ContentFilter,
        aggregates: Arc<AggregateStore>,
        log: Arc<QcLog>,
    ) -> Self {
        Self {
            catalog,
            filter,
            ledger: Ledger::new(),
            aggregates,
            log,
        }
    }

    pub fn process(&self, submission: &RatingSubmission) -> QcOutcome {
        let submission_id = Uuid::new_v4();
        let canonical = self.catalog.canonical(&submission.item_id);

        let Some(period) = self.catalog.resolve_period(&submission.item_id) else {
            return self.reject(submission, submission_id, canonical, None, RejectReason::UnknownItem);
        };

        if let Err(reason) = self.filter.evaluate(submission) {
            return self.reject(submission, submission_id, canonical, Some(period), reason);
        }

        if self.ledger.try_reserve(&submission.user_id, &period) == Reservation::AlreadyExists {
            return self.reject(
                submission,
                submission_id,
                canonical,
                Some(period),
                RejectReason::DuplicateSubmission,
            );
        }

        let aggregate = self.aggregates.apply(&period.item, submission.stars as u8);

        self.log.append(QcLogEntry {
            seq: 0,
            submission_id,
            recorded_at: Utc::now(),
            user_id: submission.user_id.clone(),
            item_id: canonical,
            period: Some(period),
            decision: Decision::Approved,
            reason: None,
        });

        info!(
            user = %submission.user_id,
            item = %submission.item_id,
            stars = submission.stars,
            "rating approved"
        );

        QcOutcome {
            submission_id,
            decision: Decision::Approved,
            reason: None,
            aggregate: Some(aggregate),
        }
    }

    fn reject(
        &self,
        submission: &RatingSubmission,
        submission_id: Uuid,
        item_id: String,
        period: Option<ServingPeriodKey>,
        reason: RejectReason,
    ) -> QcOutcome {
        self.log.append(QcLogEntry {
            seq: 0,
            submission_id,
            recorded_at: Utc::now(),
            user_id: submission.user_id.clone(),
            item_id,
            period,
            decision: Decision::Rejected,
            reason: Some(reason),
        });

        debug!(
            user = %submission.user_id,
            item = %submission.item_id,
            reason = reason.describe(),
            "rating rejected"
        );

        QcOutcome {
            submission_id,
            decision: Decision::Rejected,
            reason: Some(reason),
            aggregate: None,
        }
    }
}
