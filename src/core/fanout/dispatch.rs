//! Target dispatcher
//!
//! Drives one fan-out stage across the configured targets. Targets are
//! launched in configuration order and run concurrently; the dispatcher
//! joins them all before the stage completes. An error escaping one
//! target's operation is converted into a failed outcome record for that
//! target and never reaches its siblings.

use crate::core::fanout::outcome::OutcomeAggregator;
use crate::domain::{
    OutcomeKind, OutcomeRecord, OutcomeStatus, Registration, Result, Target, TargetId,
};
use futures::future::join_all;
use std::future::Future;

/// Drive one stage operation across all enabled, applicable targets
///
/// Disabled targets are skipped entirely and never appear in the returned
/// outcomes. Per-target results are returned in configuration order.
pub async fn dispatch<'t, F, Fut>(
    targets: &'t [Target],
    applies: impl Fn(&Target) -> bool,
    op: F,
) -> Vec<(TargetId, Result<()>)>
where
    F: Fn(&'t Target) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let selected: Vec<&Target> = targets
        .iter()
        .filter(|t| t.enabled && applies(t))
        .collect();

    if selected.is_empty() {
        return Vec::new();
    }

    let results = join_all(selected.iter().map(|t| op(*t))).await;

    selected
        .into_iter()
        .zip(results)
        .map(|(t, r)| (t.id.clone(), r))
        .collect()
}

/// Dispatch a stage and fold escaped errors into failed outcome records
///
/// Operations are expected to record their own outcomes; an `Err` here
/// means the target's operation failed outside its own accounting, and
/// the dispatcher emits the failed record on its behalf.
pub async fn dispatch_stage<'t, F, Fut>(
    registration: &Registration,
    targets: &'t [Target],
    kind: OutcomeKind,
    aggregator: &OutcomeAggregator,
    applies: impl Fn(&Target) -> bool,
    op: F,
) where
    F: Fn(&'t Target) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    for (target_id, result) in dispatch(targets, applies, op).await {
        if let Err(e) = result {
            tracing::error!(
                target_id = %target_id,
                kind = %kind,
                error = %e,
                "Target operation failed"
            );
            aggregator
                .record(
                    OutcomeRecord::new(
                        registration.global_id.clone(),
                        target_id,
                        kind,
                        OutcomeStatus::Error,
                    )
                    .with_counts(0, 1)
                    .with_context(format!("Unhandled {kind} failure: {e}")),
                )
                .await;
        }
    }
}
