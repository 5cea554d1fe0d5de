//! Imaging fan-out stage
//!
//! Transfers every bound study payload to its imaging targets, tallying
//! per-item successes and failures, and submits a manifest of what was
//! transferred when the target is configured for it. A malformed item
//! costs one failure and the transfer continues with the next item.

use crate::adapters::traits::InstanceAssignment;
use crate::core::fanout::context::{order_failure_status, with_timeout, OrderContext, RunContext};
use crate::core::fanout::dispatch::dispatch_stage;
use crate::domain::{
    OutcomeKind, OutcomeRecord, OutcomeStatus, Result, Study, Target, TargetId,
};
use serde::Serialize;

/// Manifest template file names expected under a study's metadata folder
const MANIFEST_DOC_ENTRY_SOURCE: &str = "doc_entry_source.xml";
const MANIFEST_SUBMISSION_SET_SOURCE: &str = "submission_set_source.xml";

pub(super) async fn run_stage(ctx: &RunContext<'_>) {
    tracing::info!(
        registration_id = %ctx.registration.global_id,
        "Running imaging fan-out stage"
    );
    dispatch_stage(
        ctx.registration,
        &ctx.config.targets,
        OutcomeKind::Imaging,
        &ctx.aggregator,
        Target::accepts_imaging,
        |target| transfer_target(ctx, target),
    )
    .await;
}

async fn transfer_target(ctx: &RunContext<'_>, target: &Target) -> Result<()> {
    for study in ctx.config.studies_for(&target.id) {
        transfer_study(ctx, target, study).await;
    }
    Ok(())
}

/// Manifest of transferred instances, submitted as a key-image reference
#[derive(Debug, Serialize)]
struct Manifest {
    retrieve_aet: String,
    institution_name: String,
    study_uid: String,
    accession_number: String,
    patient_id: String,
    instances: Vec<ManifestInstance>,
}

#[derive(Debug, Serialize)]
struct ManifestInstance {
    series_uid: String,
    instance_uid: String,
    instance_number: u32,
}

impl Manifest {
    fn new(target: &Target, order: &OrderContext, patient_id: &str) -> Self {
        Self {
            retrieve_aet: target.retrieve_aet.clone(),
            institution_name: target.institution_name.clone(),
            study_uid: order.study_uid.clone(),
            accession_number: order.accession_number.clone(),
            patient_id: patient_id.to_string(),
            instances: Vec::new(),
        }
    }

    fn add(&mut self, series_uid: String, instance_uid: String, instance_number: u32) {
        self.instances.push(ManifestInstance {
            series_uid,
            instance_uid,
            instance_number,
        });
    }
}

/// Transfer one study payload to one target
async fn transfer_study(ctx: &RunContext<'_>, target: &Target, study: &Study) {
    let record = |status| {
        OutcomeRecord::new(
            ctx.registration.global_id.clone(),
            target.id.clone(),
            OutcomeKind::Imaging,
            status,
        )
    };

    let order = match ctx.order_context(target, study) {
        Ok(order) => order,
        Err(e) => {
            let status = order_failure_status(&e);
            let failures = (status == OutcomeStatus::Error) as u32;
            ctx.record(
                record(status)
                    .with_counts(0, failures)
                    .with_context(format!("Study {}: {e}", study.id)),
            )
            .await;
            return;
        }
    };

    let items = match ctx.clients.walker.items(&study.directory) {
        Ok(items) => items,
        Err(e) => {
            ctx.record(record(OutcomeStatus::Error).with_counts(0, 1).with_context(
                format!("Study {}: payload walk failed: {e}", study.id),
            ))
            .await;
            return;
        }
    };

    let mut session = match with_timeout(
        target.timeout(),
        ctx.clients.imaging.open(&target.imaging_url, target.timeout()),
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            ctx.record(record(OutcomeStatus::Error).with_counts(0, 1).with_context(
                format!(
                    "Study {}: association to {} failed: {e}",
                    study.id, target.imaging_url
                ),
            ))
            .await;
            return;
        }
    };

    let patient = ctx.patient_fields(target);
    let study_date = study.resolved_date(&ctx.run_date);
    let mut manifest = Manifest::new(target, &order, &patient.local_id);
    let mut successes: u32 = 0;
    let mut failures: u32 = 0;
    // Instance numbering restarts at 1 for every transfer
    let mut instance_number: u32 = 0;

    for item in items {
        let info = match ctx.clients.imaging.describe(&item) {
            Ok(info) => info,
            Err(e) => {
                failures += 1;
                tracing::debug!(item = %item.display(), error = %e, "Unparsable payload item");
                continue;
            }
        };
        let series_uid = match ctx.remapper.get_or_create(&info.series_uid) {
            Ok(uid) => uid,
            Err(e) => {
                failures += 1;
                tracing::warn!(item = %item.display(), error = %e, "Series id remap failed");
                continue;
            }
        };
        let study_uid = match ctx.remapper.get_or_create(&info.study_uid) {
            Ok(uid) => uid,
            Err(e) => {
                failures += 1;
                tracing::warn!(item = %item.display(), error = %e, "Study id remap failed");
                continue;
            }
        };
        let instance_uid = match ctx.clients.id_generator.new_id() {
            Ok(uid) => uid,
            Err(e) => {
                failures += 1;
                tracing::warn!(item = %item.display(), error = %e, "Instance id generation failed");
                continue;
            }
        };
        instance_number += 1;

        let assignment = InstanceAssignment {
            patient_name: patient.name.clone(),
            patient_id: patient.local_id.clone(),
            assigning_authority: patient.assigning_authority.clone(),
            global_subject_id: patient.global_id.clone(),
            birth_date: patient.birth_date.clone(),
            sex: patient.sex.clone(),
            study_date: study_date.clone(),
            study_time: ctx.run_time.clone(),
            accession_number: order.accession_number.clone(),
            institution_name: target.institution_name.clone(),
            requested_procedure_id: order.requested_procedure_id.clone(),
            scheduled_step_id: order.scheduled_step_id.clone(),
            study_uid,
            series_uid: series_uid.clone(),
            instance_uid: instance_uid.clone(),
            instance_number,
            description: study.description.clone(),
            body_part: study.body_part.clone(),
        };

        match with_timeout(target.timeout(), session.send(&item, &assignment)).await {
            Ok(()) => {
                successes += 1;
                manifest.add(series_uid, instance_uid, instance_number);
            }
            Err(e) => {
                failures += 1;
                tracing::debug!(item = %item.display(), error = %e, "Instance send failed");
            }
        }
    }

    if let Err(e) = session.close().await {
        tracing::warn!(target_id = %target.id, error = %e, "Imaging session close failed");
    }

    ctx.record(
        record(OutcomeRecord::status_from_counts(failures))
            .with_counts(successes, failures)
            .with_context(format!(
                "Study {}: {successes} instances transferred, {failures} failed",
                study.id
            )),
    )
    .await;

    if target.capabilities.sends_manifest {
        submit_manifest(ctx, target, study, &order, manifest).await;
    }
}

/// Submit the transfer manifest through the target's repository
///
/// The manifest is only a courtesy artifact: every precondition that is
/// absent (metadata folder, repository link, repository transmission)
/// yields a skipped record, not an error.
async fn submit_manifest(
    ctx: &RunContext<'_>,
    target: &Target,
    study: &Study,
    order: &OrderContext,
    manifest: Manifest,
) {
    let reg_id = ctx.registration.global_id.clone();
    let record = |target_id: TargetId, status| {
        OutcomeRecord::new(reg_id.clone(), target_id, OutcomeKind::Document, status)
    };

    let metadata_dir = study.metadata_dir();
    if !metadata_dir.is_dir() {
        ctx.record(
            record(target.id.clone(), OutcomeStatus::Skipped).with_context(format!(
                "Study {}: manifest metadata folder {} not present",
                study.id,
                metadata_dir.display()
            )),
        )
        .await;
        return;
    }

    let Some(repository_id) = &target.repository_id else {
        ctx.record(
            record(target.id.clone(), OutcomeStatus::Skipped).with_context(format!(
                "Study {}: no repository configured for manifest submission",
                study.id
            )),
        )
        .await;
        return;
    };
    let Some(repository) = ctx.config.target(repository_id) else {
        ctx.record(
            record(target.id.clone(), OutcomeStatus::Skipped).with_context(format!(
                "Study {}: manifest repository {repository_id} is not configured",
                study.id
            )),
        )
        .await;
        return;
    };
    if !repository.enabled {
        ctx.record(
            record(target.id.clone(), OutcomeStatus::Skipped).with_context(format!(
                "Study {}: manifest repository {repository_id} is disabled",
                study.id
            )),
        )
        .await;
        return;
    }
    if !repository.capabilities.sends_documents {
        ctx.record(
            record(repository.id.clone(), OutcomeStatus::Skipped).with_context(format!(
                "Study {} manifest: transmission disabled",
                study.id
            )),
        )
        .await;
        return;
    }

    let submission = match build_manifest_submission(ctx, repository, study, order, &manifest) {
        Ok(submission) => submission,
        Err(e) => {
            ctx.record(
                record(repository.id.clone(), OutcomeStatus::Error)
                    .with_counts(0, 1)
                    .with_context(format!("Study {} manifest build failed: {e}", study.id)),
            )
            .await;
            return;
        }
    };

    let outcome = match with_timeout(
        repository.timeout(),
        ctx.clients
            .documents
            .submit(&submission, &repository.submit_url, repository.timeout()),
    )
    .await
    {
        Ok(response) if response.is_ok() => record(repository.id.clone(), OutcomeStatus::Ok)
            .with_counts(1, 0)
            .with_context(format!(
                "Study {} manifest submitted ({} instances)",
                study.id,
                manifest.instances.len()
            )),
        Ok(response) => record(repository.id.clone(), OutcomeStatus::Error)
            .with_counts(0, 1)
            .with_context(format!(
                "Study {} manifest rejected: {}",
                study.id,
                response.errors.join("; ")
            )),
        Err(e) => record(repository.id.clone(), OutcomeStatus::Error)
            .with_counts(0, 1)
            .with_context(format!("Study {} manifest submission failed: {e}", study.id)),
    };
    ctx.record(outcome).await;
}

fn build_manifest_submission(
    ctx: &RunContext<'_>,
    repository: &Target,
    study: &Study,
    order: &OrderContext,
    manifest: &Manifest,
) -> Result<crate::adapters::traits::DocumentSubmission> {
    let title = format!("Manifest {}", study.description);
    let date = study.resolved_date(&ctx.run_date);
    let mut params = ctx.document_params(&title, &repository.institution_name, &date)?;
    params.set("accession-number", order.accession_number.clone());
    params.set("study-uid", order.study_uid.clone());

    let metadata_dir = study.metadata_dir();
    let documents = &ctx.clients.documents;
    let doc_entry = documents
        .build_from_template(&metadata_dir.join(MANIFEST_DOC_ENTRY_SOURCE), &params)?;
    let submission_set = documents
        .build_from_template(&metadata_dir.join(MANIFEST_SUBMISSION_SET_SOURCE), &params)?;

    Ok(crate::adapters::traits::DocumentSubmission {
        document: Some(serde_json::to_string_pretty(manifest)?),
        pdf: None,
        doc_entry,
        submission_set,
        title,
    })
}
