//! Run summary and reporting
//!
//! Rolls every outcome record emitted during a fan-out run into one
//! [`RunSummary`]. The summary is always returned, never raised; partial
//! failure anywhere in the run changes its counts, not its structure.

use crate::domain::{GlobalId, OutcomeKind, OutcomeRecord, OutcomeStatus};
use std::time::Duration;

/// Summary of one registration fan-out run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Registration the run processed
    pub registration_id: GlobalId,

    /// Units of work with status Ok
    pub ok_units: usize,

    /// Units of work with status Error
    pub error_units: usize,

    /// Units of work with status Skipped
    pub skipped_units: usize,

    /// Summed per-item success count across all units
    pub item_successes: u32,

    /// Summed per-item failure count across all units
    pub item_failures: u32,

    /// Every outcome record emitted during the run
    pub records: Vec<OutcomeRecord>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// True when one or more audit-sink appends failed
    pub audit_degraded: bool,
}

impl RunSummary {
    /// Build a summary from the records of one run
    pub fn from_records(
        registration_id: GlobalId,
        records: Vec<OutcomeRecord>,
        duration: Duration,
        audit_degraded: bool,
    ) -> Self {
        let mut summary = Self {
            registration_id,
            ok_units: 0,
            error_units: 0,
            skipped_units: 0,
            item_successes: 0,
            item_failures: 0,
            records: Vec::new(),
            duration,
            audit_degraded,
        };
        for record in &records {
            match record.status {
                OutcomeStatus::Ok => summary.ok_units += 1,
                OutcomeStatus::Error => summary.error_units += 1,
                OutcomeStatus::Skipped => summary.skipped_units += 1,
            }
            summary.item_successes += record.successes;
            summary.item_failures += record.failures;
        }
        summary.records = records;
        summary
    }

    /// Total units of work recorded
    pub fn total_units(&self) -> usize {
        self.records.len()
    }

    /// Whether every unit completed without error
    pub fn is_clean(&self) -> bool {
        self.error_units == 0
    }

    /// Records for one outcome category
    pub fn records_for(&self, kind: OutcomeKind) -> Vec<&OutcomeRecord> {
        self.records.iter().filter(|r| r.kind == kind).collect()
    }

    /// Records referencing one target
    pub fn records_for_target(&self, target_id: &str) -> Vec<&OutcomeRecord> {
        self.records
            .iter()
            .filter(|r| r.target_id.as_str() == target_id)
            .collect()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            registration_id = %self.registration_id,
            total_units = self.total_units(),
            ok = self.ok_units,
            errors = self.error_units,
            skipped = self.skipped_units,
            item_successes = self.item_successes,
            item_failures = self.item_failures,
            duration_ms = self.duration.as_millis() as u64,
            audit_degraded = self.audit_degraded,
            "Fan-out run completed"
        );

        for record in self.records.iter().filter(|r| r.is_error()) {
            tracing::warn!(
                target_id = %record.target_id,
                kind = %record.kind,
                failures = record.failures,
                context = %record.context,
                "Unit of work failed"
            );
        }
    }
}
