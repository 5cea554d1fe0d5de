//! HL7 fan-out stage
//!
//! Sends the admit, order and report profiles to every enabled target
//! whose capability set accepts them. Each individual send yields its own
//! outcome record; a rejected acknowledgement or transport failure marks
//! that send failed and the stage moves on.

use crate::adapters::traits::{Hl7Profile, OrderFields, PatientFields};
use crate::core::fanout::context::{order_failure_status, with_timeout, RunContext};
use crate::core::fanout::dispatch::dispatch_stage;
use crate::domain::{OutcomeKind, OutcomeRecord, OutcomeStatus, Result, Target};
use std::time::Duration;

/// Canned report body attached to the report profile
const REPORT_TEXT: &str =
    "Exam completed without complication. Findings within normal limits. \
     No acute abnormality identified.";

/// Longest acknowledgement excerpt carried into an outcome context
const ACK_EXCERPT_LEN: usize = 120;

pub(super) async fn run_stage(ctx: &RunContext<'_>) {
    tracing::info!(
        registration_id = %ctx.registration.global_id,
        "Running HL7 fan-out stage"
    );
    dispatch_stage(
        ctx.registration,
        &ctx.config.targets,
        OutcomeKind::Hl7,
        &ctx.aggregator,
        Target::accepts_hl7,
        |target| send_profiles(ctx, target),
    )
    .await;
}

/// Send every accepted profile to one target
async fn send_profiles(ctx: &RunContext<'_>, target: &Target) -> Result<()> {
    let patient = ctx.patient_fields(target);

    if target.capabilities.accepts_admit {
        send_one(ctx, target, Hl7Profile::Admit, &patient, None).await;
    }

    if !target.capabilities.accepts_orders && !target.capabilities.accepts_reports {
        return Ok(());
    }

    for study in ctx.config.studies_for(&target.id) {
        let order = match ctx.order_context(target, study) {
            Ok(order) => order,
            Err(e) => {
                let status = order_failure_status(&e);
                let failures = (status == OutcomeStatus::Error) as u32;
                ctx.record(
                    OutcomeRecord::new(
                        ctx.registration.global_id.clone(),
                        target.id.clone(),
                        OutcomeKind::Hl7,
                        status,
                    )
                    .with_counts(0, failures)
                    .with_context(format!("Study {}: {e}", study.id)),
                )
                .await;
                continue;
            }
        };
        let provider = ctx.config.application.physician_name.as_str();

        if target.capabilities.accepts_orders {
            let fields = order.to_order_fields(study, ctx.timestamp(), provider);
            send_one(ctx, target, Hl7Profile::Order, &patient, Some(&fields)).await;
        }

        if target.capabilities.accepts_reports {
            if target.report_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(target.report_delay_ms)).await;
            }
            // Reports carry a timestamp after the order they answer
            let mut fields = order.to_order_fields(study, ctx.timestamp_in(10), provider);
            fields.report_text = Some(REPORT_TEXT.to_string());
            send_one(ctx, target, Hl7Profile::Report, &patient, Some(&fields)).await;
        }
    }

    Ok(())
}

/// Build and send one profile message, recording the outcome
async fn send_one(
    ctx: &RunContext<'_>,
    target: &Target,
    profile: Hl7Profile,
    patient: &PatientFields,
    order: Option<&OrderFields>,
) {
    let kind = profile.outcome_kind();
    let base = || {
        OutcomeRecord::new(
            ctx.registration.global_id.clone(),
            target.id.clone(),
            kind,
            OutcomeStatus::Ok,
        )
    };

    let message = match ctx.clients.hl7.build(profile, patient, order) {
        Ok(message) => message,
        Err(e) => {
            ctx.record(
                base()
                    .with_status(OutcomeStatus::Error)
                    .with_counts(0, 1)
                    .with_context(format!("Failed to build {} message: {e}", profile.name())),
            )
            .await;
            return;
        }
    };

    let record = match with_timeout(
        target.timeout(),
        ctx.clients.hl7.send(&message, &target.hl7_url, target.timeout()),
    )
    .await
    {
        Ok(ack) => {
            let marker = ctx.clients.hl7.success_marker().to_lowercase();
            let accepted = ack.to_lowercase().contains(&marker);
            let excerpt: String = ack.chars().take(ACK_EXCERPT_LEN).collect();
            let status = if accepted {
                OutcomeStatus::Ok
            } else {
                OutcomeStatus::Error
            };
            base()
                .with_status(status)
                .with_counts(accepted as u32, (!accepted) as u32)
                .with_context(format!(
                    "{} sent. Subject {} as {}^^^{}. Response: {excerpt}",
                    profile.name(),
                    patient.global_id,
                    patient.local_id,
                    patient.assigning_authority,
                ))
        }
        Err(e) => base()
            .with_status(OutcomeStatus::Error)
            .with_counts(0, 1)
            .with_context(format!(
                "{} send to {} failed: {e}",
                profile.name(),
                target.hl7_url
            )),
    };
    ctx.record(record).await;
}
