//! Outcome records
//!
//! Exactly one [`OutcomeRecord`] is emitted per completed-or-failed unit
//! of work; the record is emitted even when the unit fails entirely.
//! Failure surfaces to operators through these records, never through
//! run-level errors.

use crate::domain::ids::{GlobalId, TargetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protocol category of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// HL7 order/report message send
    Hl7,
    /// Imaging instance transfer
    Imaging,
    /// Document-set or manifest submission
    Document,
    /// Patient-identity feed
    IdentityFeed,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeKind::Hl7 => "hl7",
            OutcomeKind::Imaging => "imaging",
            OutcomeKind::Document => "document",
            OutcomeKind::IdentityFeed => "identity_feed",
        };
        write!(f, "{s}")
    }
}

/// Terminal status of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Completed without failures
    Ok,
    /// Transport or processing failure
    Error,
    /// Configured off or inputs absent; not an error condition
    Skipped,
}

/// Audit entry for one unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Registration the unit of work belongs to
    pub registration_id: GlobalId,

    /// Target the unit of work was bound to
    pub target_id: TargetId,

    /// Protocol category
    pub kind: OutcomeKind,

    /// Terminal status
    pub status: OutcomeStatus,

    /// Items sent successfully (1/0 for single-message units)
    pub successes: u32,

    /// Items that failed
    pub failures: u32,

    /// Free-text context: which payload, which response, which reason
    #[serde(default)]
    pub context: String,

    /// When the record was created
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Create a record with zero counts and empty context
    pub fn new(
        registration_id: GlobalId,
        target_id: TargetId,
        kind: OutcomeKind,
        status: OutcomeStatus,
    ) -> Self {
        Self {
            registration_id,
            target_id,
            kind,
            status,
            successes: 0,
            failures: 0,
            context: String::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Replace the status
    pub fn with_status(mut self, status: OutcomeStatus) -> Self {
        self.status = status;
        self
    }

    /// Set success/failure counts
    pub fn with_counts(mut self, successes: u32, failures: u32) -> Self {
        self.successes = successes;
        self.failures = failures;
        self
    }

    /// Set free-text context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Whether the unit of work failed
    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }

    /// Status derived from an item tally: any failure marks the unit Error
    pub fn status_from_counts(failures: u32) -> OutcomeStatus {
        if failures == 0 {
            OutcomeStatus::Ok
        } else {
            OutcomeStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: OutcomeStatus) -> OutcomeRecord {
        OutcomeRecord::new(
            GlobalId::new("GID-1").unwrap(),
            TargetId::new("pacs-1").unwrap(),
            OutcomeKind::Imaging,
            status,
        )
    }

    #[test]
    fn test_builder_counts_and_context() {
        let rec = record(OutcomeStatus::Error)
            .with_counts(12, 2)
            .with_context("Study s1: 12 sent, 2 failed");
        assert_eq!(rec.successes, 12);
        assert_eq!(rec.failures, 2);
        assert!(rec.is_error());
        assert!(rec.context.contains("s1"));
    }

    #[test]
    fn test_status_from_counts() {
        assert_eq!(OutcomeRecord::status_from_counts(0), OutcomeStatus::Ok);
        assert_eq!(OutcomeRecord::status_from_counts(3), OutcomeStatus::Error);
    }

    #[test]
    fn test_skipped_is_not_error() {
        assert!(!record(OutcomeStatus::Skipped).is_error());
    }

    #[test]
    fn test_serializes_to_json_line() {
        let rec = record(OutcomeStatus::Ok).with_counts(1, 0);
        let line = serde_json::to_string(&rec).unwrap();
        assert!(line.contains("\"kind\":\"imaging\""));
        assert!(line.contains("\"status\":\"ok\""));
    }
}
