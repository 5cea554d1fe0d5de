//! Document fan-out stage
//!
//! Processes every document set bound to a repository target: renders the
//! template sources found in the set's directory, assembles a submission
//! and sends it. A repository with transmission switched off still builds
//! everything and records the skip, so template problems surface in
//! rehearsals too.

use crate::adapters::traits::DocumentSubmission;
use crate::core::fanout::context::{with_timeout, RunContext};
use crate::core::fanout::dispatch::dispatch_stage;
use crate::domain::{DocSet, OutcomeKind, OutcomeRecord, OutcomeStatus, Result, Target};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::time::Duration;

/// Template file names expected in a document set directory
const PDF_SOURCE: &str = "pdf_source.xml";
const CDA_SOURCE: &str = "cda_source.xml";
const DOC_ENTRY_SOURCE: &str = "doc_entry_source.xml";
const SUBMISSION_SET_SOURCE: &str = "submission_set_source.xml";

pub(super) async fn run_stage(ctx: &RunContext<'_>) {
    tracing::info!(
        registration_id = %ctx.registration.global_id,
        "Running document fan-out stage"
    );
    dispatch_stage(
        ctx.registration,
        &ctx.config.targets,
        OutcomeKind::Document,
        &ctx.aggregator,
        Target::accepts_document_sets,
        |target| process_repository(ctx, target),
    )
    .await;
}

async fn process_repository(ctx: &RunContext<'_>, target: &Target) -> Result<()> {
    let docsets = ctx.config.docsets_for(&target.id);
    if docsets.is_empty() {
        return Ok(());
    }
    if target.docset_delay_ms > 0 {
        // Demo pacing so registries ingest earlier stages first
        tokio::time::sleep(Duration::from_millis(target.docset_delay_ms)).await;
    }
    for docset in docsets {
        process_docset(ctx, target, docset).await;
    }
    Ok(())
}

/// Result of assembling one document set
enum BuildOutcome {
    Ready(DocumentSubmission),
    /// A required template source is absent
    MissingTemplate(&'static str),
}

async fn process_docset(ctx: &RunContext<'_>, target: &Target, docset: &DocSet) {
    let record = |status| {
        OutcomeRecord::new(
            ctx.registration.global_id.clone(),
            target.id.clone(),
            OutcomeKind::Document,
            status,
        )
    };

    if !docset.sex.accepts(&ctx.registration.sex) {
        tracing::debug!(
            docset_id = %docset.id,
            sex = %ctx.registration.sex,
            "Document set not applicable to this registration"
        );
        return;
    }

    let submission = match build_submission(ctx, target, docset) {
        Ok(BuildOutcome::Ready(submission)) => submission,
        Ok(BuildOutcome::MissingTemplate(name)) => {
            ctx.record(record(OutcomeStatus::Skipped).with_context(format!(
                "DocSet {}: required template {name} not found in {}",
                docset.id,
                docset.directory.display()
            )))
            .await;
            return;
        }
        Err(e) => {
            ctx.record(
                record(OutcomeStatus::Error)
                    .with_counts(0, 1)
                    .with_context(format!("DocSet {}: build failed: {e}", docset.id)),
            )
            .await;
            return;
        }
    };

    if !target.capabilities.sends_documents {
        ctx.record(
            record(OutcomeStatus::Skipped)
                .with_context(format!("DocSet {}: transmission disabled", docset.id)),
        )
        .await;
        return;
    }

    let outcome = match with_timeout(
        target.timeout(),
        ctx.clients
            .documents
            .submit(&submission, &target.submit_url, target.timeout()),
    )
    .await
    {
        Ok(response) if response.is_ok() => {
            let pdf_note = if submission.pdf.is_some() {
                " with PDF attachment"
            } else {
                ""
            };
            record(OutcomeStatus::Ok).with_counts(1, 0).with_context(format!(
                "DocSet {} submitted{pdf_note}",
                docset.id
            ))
        }
        Ok(response) => record(OutcomeStatus::Error)
            .with_counts(0, 1)
            .with_context(format!(
                "DocSet {} rejected: {}",
                docset.id,
                response.errors.join("; ")
            )),
        Err(e) => record(OutcomeStatus::Error)
            .with_counts(0, 1)
            .with_context(format!("DocSet {} submission failed: {e}", docset.id)),
    };
    ctx.record(outcome).await;
}

/// Assemble one document set from its directory of template sources
///
/// The PDF and clinical document sources are optional; the document-entry
/// and submission-set metadata sources are required.
fn build_submission(
    ctx: &RunContext<'_>,
    target: &Target,
    docset: &DocSet,
) -> Result<BuildOutcome> {
    let institution = if docset.institution_name.is_empty() {
        target.institution_name.as_str()
    } else {
        docset.institution_name.as_str()
    };
    let date = docset.resolved_date(&ctx.run_date);
    let mut params = ctx.document_params(&docset.title, institution, &date)?;

    let mut submission = DocumentSubmission {
        title: docset.title.clone(),
        ..Default::default()
    };

    let pdf_source = docset.directory.join(PDF_SOURCE);
    if pdf_source.is_file() {
        let pdf = ctx.clients.documents.render_pdf(&pdf_source, &params)?;
        // The rendered bytes ride inside the metadata as base64
        params.set("pdf", BASE64.encode(&pdf));
        submission.pdf = Some(pdf);
    }

    let cda_source = docset.directory.join(CDA_SOURCE);
    if cda_source.is_file() {
        submission.document = Some(
            ctx.clients
                .documents
                .build_from_template(&cda_source, &params)?,
        );
    }

    let doc_entry_source = docset.directory.join(DOC_ENTRY_SOURCE);
    if !doc_entry_source.is_file() {
        return Ok(BuildOutcome::MissingTemplate(DOC_ENTRY_SOURCE));
    }
    let submission_set_source = docset.directory.join(SUBMISSION_SET_SOURCE);
    if !submission_set_source.is_file() {
        return Ok(BuildOutcome::MissingTemplate(SUBMISSION_SET_SOURCE));
    }

    submission.doc_entry = ctx
        .clients
        .documents
        .build_from_template(&doc_entry_source, &params)?;
    submission.submission_set = ctx
        .clients
        .documents
        .build_from_template(&submission_set_source, &params)?;

    Ok(BuildOutcome::Ready(submission))
}
