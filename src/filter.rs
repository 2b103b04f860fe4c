//! # Content Filter
//!
//! Deterministic lexical checks on a submission, in order: star range,
//! comment length, denylist. First failure wins.
//!
//! Denylist matching is substring matching over normalized text (lowercased,
//! whitespace collapsed). This is intentionally simple and auditable: it
//! produces false positives ("scrap" contains "crap") and those are accepted,
//! documented behavior rather than special-cased.

use regex::Regex;

use crate::models::{RatingSubmission, RejectReason};

pub struct ContentFilter {
    max_comment_len: usize,
    denylist: Vec<String>,
    whitespace: Regex,
}

impl ContentFilter {
    pub fn new(max_comment_len: usize, denylist: &[String]) -> Self {
        let whitespace = Regex::new(r"\s+").unwrap();
        let denylist = denylist
            .iter()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();

        Self {
            max_comment_len,
            denylist,
            whitespace,
        }
    }

    pub fn evaluate(&self, submission: &RatingSubmission) -> Result<(), RejectReason> {
        if !(1..=5).contains(&submission.stars) {
            return Err(RejectReason::InvalidRating);
        }

        let Some(comment) = &submission.comment else {
            return Ok(());
        };

        if comment.chars().count() > self.max_comment_len {
            return Err(RejectReason::CommentTooLong);
        }

        let normalized = self.normalize(comment);
        for term in &self.denylist {
            if normalized.contains(term.as_str()) {
                return Err(RejectReason::Profanity);
            }
        }

        Ok(())
    }

    fn normalize(&self, text: &str) -> String {
        self.whitespace
            .replace_all(&text.to_lowercase(), " ")
            .trim()
            .to_string()
    }
}
