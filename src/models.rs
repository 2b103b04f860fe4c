use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Meal periods served by the dining halls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealPeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            _ => None,
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breakfast => write!(f, "Breakfast"),
            Self::Lunch => write!(f, "Lunch"),
            Self::Dinner => write!(f, "Dinner"),
        }
    }
}

/// A menu item as published by the catalog. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub hall: String,
    pub meal: MealPeriod,
    pub served_on: NaiveDate,
}

/// One rating attempt from a user. Never mutated after creation; either
/// approved or rejected, never retried by the pipeline itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub user_id: String,
    pub item_id: String,
    pub stars: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

/// The granularity at which duplicate submissions are judged: one rating per
/// user per (hall, item, meal, serving date). The item component is the
/// canonical id, so representation differences cannot defeat deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingPeriodKey {
    pub hall: String,
    pub item: String,
    pub meal: MealPeriod,
    pub date: NaiveDate,
}

impl ServingPeriodKey {
    /// Display form used by the admin views, e.g. `hill frenchtoast_2025-11-14`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.item, self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Why a submission was rejected. `AlreadyExists` from the ledger surfaces
/// here as `DuplicateSubmission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    UnknownItem,
    InvalidRating,
    CommentTooLong,
    Profanity,
    DuplicateSubmission,
}

impl RejectReason {
    /// Human-readable form shown in the admin QC table.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::UnknownItem => "Unknown menu item",
            Self::InvalidRating => "Invalid star rating",
            Self::CommentTooLong => "Comment too long",
            Self::Profanity => "Profanity detected",
            Self::DuplicateSubmission => "Duplicate submission",
        }
    }
}

/// Append-only audit record, exactly one per submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QcLogEntry {
    pub seq: u64,
    pub submission_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub user_id: String,
    pub item_id: String,
    pub period: Option<ServingPeriodKey>,
    pub decision: Decision,
    pub reason: Option<RejectReason>,
}

impl QcLogEntry {
    /// The item column for admin listings: the period label when the item
    /// resolved, the canonical id as submitted otherwise.
    pub fn item_label(&self) -> String {
        match &self.period {
            Some(period) => period.label(),
            None => self.item_id.clone(),
        }
    }

    pub fn reason_text(&self) -> &'static str {
        match self.reason {
            Some(reason) => reason.describe(),
            None => "Passed all checks",
        }
    }
}
