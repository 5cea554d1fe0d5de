//! Run command: fan one registration out to all configured targets

use crate::adapters::{
    DirectoryWalker, JsonlAuditSink, LoopbackDocumentClient, LoopbackHl7Client,
    LoopbackImagingClient, UidGenerator,
};
use crate::adapters::traits::IdGenerator;
use crate::config::load_config;
use crate::core::{FanoutClients, FanoutOrchestrator, RunSummary};
use crate::domain::Registration;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Registration intake file (TOML)
    #[arg(short, long)]
    pub registration: PathBuf,
}

impl RunArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let mut registration = Registration::from_file(&self.registration)?;

        let id_generator = Arc::new(UidGenerator::new(&config.identity.uid_root));

        // Intake: targets without a pre-assigned local id get one now, so
        // every downstream message carries a stable local identifier
        for target in config.targets.iter().filter(|t| t.enabled) {
            if registration.local_id(&target.id).is_none() {
                let local_id = id_generator.new_id()?;
                tracing::debug!(
                    target_id = %target.id,
                    local_id = %local_id,
                    "Assigned local id at intake"
                );
                registration.local_ids.insert(target.id.clone(), local_id);
            }
        }

        let out_dir = config.application.output_dir.clone();
        let audit = Arc::new(JsonlAuditSink::open(out_dir.join("audit.jsonl"))?);
        tracing::info!(audit = %audit.path().display(), "Audit trail opened");

        let clients = FanoutClients {
            id_generator: id_generator.clone(),
            hl7: Arc::new(LoopbackHl7Client::new(&out_dir)),
            imaging: Arc::new(LoopbackImagingClient::new(&out_dir)),
            walker: Arc::new(DirectoryWalker::new()),
            documents: Arc::new(LoopbackDocumentClient::new(&out_dir)),
            audit,
        };

        let orchestrator = FanoutOrchestrator::new(config, clients);
        let summary = orchestrator.run(&registration).await?;

        print_summary(&summary);
        Ok(if summary.is_clean() { 0 } else { 1 })
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\nRegistration {} fan-out complete", summary.registration_id);
    println!(
        "  units: {} ok, {} failed, {} skipped",
        summary.ok_units, summary.error_units, summary.skipped_units
    );
    println!(
        "  items: {} sent, {} failed",
        summary.item_successes, summary.item_failures
    );
    println!("  duration: {:.2}s", summary.duration.as_secs_f64());
    if summary.audit_degraded {
        println!("  warning: one or more audit appends failed; see logs");
    }
    for record in summary.records.iter().filter(|r| r.is_error()) {
        println!(
            "  FAILED [{}] {}: {}",
            record.kind, record.target_id, record.context
        );
    }
}
