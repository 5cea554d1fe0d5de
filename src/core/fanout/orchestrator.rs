//! Registration fan-out orchestrator
//!
//! Runs the fixed stage sequence for one registration: HL7 profiles,
//! then imaging transfers, then document sets. Only registration
//! validation is fatal; every downstream failure is absorbed into the
//! run's outcome records and summary.

use crate::adapters::traits::{AuditSink, DocumentClient, Hl7Client, IdGenerator, ImagingClient, PayloadWalker};
use crate::config::RegsimConfig;
use crate::core::fanout::context::RunContext;
use crate::core::fanout::summary::RunSummary;
use crate::core::fanout::{documents, hl7, imaging};
use crate::domain::{Registration, Result};
use std::sync::Arc;
use std::time::Instant;

/// Protocol clients and services one orchestrator dispatches through
#[derive(Clone)]
pub struct FanoutClients {
    pub id_generator: Arc<dyn IdGenerator>,
    pub hl7: Arc<dyn Hl7Client>,
    pub imaging: Arc<dyn ImagingClient>,
    pub walker: Arc<dyn PayloadWalker>,
    pub documents: Arc<dyn DocumentClient>,
    pub audit: Arc<dyn AuditSink>,
}

/// Drives one registration through the full fan-out sequence
pub struct FanoutOrchestrator {
    config: RegsimConfig,
    clients: FanoutClients,
}

impl FanoutOrchestrator {
    pub fn new(config: RegsimConfig, clients: FanoutClients) -> Self {
        Self { config, clients }
    }

    /// Run the fan-out for one registration
    ///
    /// Returns `Err` only when the registration itself is unusable;
    /// per-target failures are reported through the summary.
    pub async fn run(&self, registration: &Registration) -> Result<RunSummary> {
        let start = Instant::now();
        registration.validate()?;

        tracing::info!(
            registration_id = %registration.global_id,
            subject = %registration.name(),
            targets = self.config.targets.len(),
            "Starting registration fan-out"
        );

        let ctx = RunContext::new(registration, &self.config, &self.clients);

        hl7::run_stage(&ctx).await;
        imaging::run_stage(&ctx).await;
        documents::run_stage(&ctx).await;

        let audit_degraded = ctx.aggregator.sink_failures() > 0;
        let summary = RunSummary::from_records(
            registration.global_id.clone(),
            ctx.aggregator.records(),
            start.elapsed(),
            audit_degraded,
        );
        summary.log_summary();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GlobalId, RegsimError};

    fn invalid_registration() -> Registration {
        Registration {
            global_id: GlobalId::new("GID-1").unwrap(),
            given_name: String::new(),
            family_name: String::new(),
            email: String::new(),
            birth_date: String::new(),
            sex: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: String::new(),
            local_ids: Default::default(),
        }
    }

    #[test]
    fn test_invalid_registration_fails_validation() {
        let reg = invalid_registration();
        assert!(matches!(
            reg.validate(),
            Err(RegsimError::Registration(_))
        ));
    }
}
