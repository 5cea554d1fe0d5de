//! Outcome aggregation
//!
//! Collects per-unit-of-work outcome records for the run summary and
//! forwards each to the configured audit sink. A sink outage degrades
//! observability, not delivery: it is logged and counted, never raised.

use crate::adapters::traits::AuditSink;
use crate::domain::OutcomeRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Run-scoped outcome aggregator
pub struct OutcomeAggregator {
    sink: Arc<dyn AuditSink>,
    records: Mutex<Vec<OutcomeRecord>>,
    sink_failures: AtomicUsize,
}

impl OutcomeAggregator {
    /// Create an aggregator writing to the given sink
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            records: Mutex::new(Vec::new()),
            sink_failures: AtomicUsize::new(0),
        }
    }

    /// Record one outcome
    ///
    /// Never fails for a logically failed unit of work. If the sink append
    /// fails the record is still retained for the run summary.
    pub async fn record(&self, record: OutcomeRecord) {
        tracing::debug!(
            target_id = %record.target_id,
            kind = %record.kind,
            status = ?record.status,
            successes = record.successes,
            failures = record.failures,
            "Recording outcome"
        );

        if let Err(e) = self.sink.append(&record).await {
            self.sink_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                target_id = %record.target_id,
                error = %e,
                "Audit sink append failed; outcome retained in summary only"
            );
        }

        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    /// Number of sink appends that failed during this run
    pub fn sink_failures(&self) -> usize {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of all records recorded so far
    pub fn records(&self) -> Vec<OutcomeRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GlobalId, OutcomeKind, OutcomeStatus, RegsimError, Result, TargetId};
    use async_trait::async_trait;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _record: &OutcomeRecord) -> Result<()> {
            Err(RegsimError::Audit("sink unavailable".to_string()))
        }
    }

    fn record() -> OutcomeRecord {
        OutcomeRecord::new(
            GlobalId::new("GID-1").unwrap(),
            TargetId::new("t1").unwrap(),
            OutcomeKind::Hl7,
            OutcomeStatus::Ok,
        )
        .with_counts(1, 0)
    }

    #[tokio::test]
    async fn test_sink_outage_does_not_lose_records() {
        let aggregator = OutcomeAggregator::new(Arc::new(FailingSink));
        aggregator.record(record()).await;
        aggregator.record(record()).await;

        assert_eq!(aggregator.records().len(), 2);
        assert_eq!(aggregator.sink_failures(), 2);
    }

    #[tokio::test]
    async fn test_records_pass_through_sink() {
        let sink = Arc::new(crate::adapters::audit::MemoryAuditSink::new());
        let aggregator = OutcomeAggregator::new(sink.clone());
        aggregator.record(record()).await;

        assert_eq!(sink.records().len(), 1);
        assert_eq!(aggregator.sink_failures(), 0);
    }
}
