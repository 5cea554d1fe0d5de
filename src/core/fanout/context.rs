//! Run-scoped state shared by the fan-out stages
//!
//! Sequence counters, identifier maps and order parameters all live here
//! as explicit per-run state, so concurrently executing runs never
//! interfere.

use crate::adapters::traits::{OrderFields, PatientFields, TemplateParams};
use crate::config::RegsimConfig;
use crate::core::fanout::orchestrator::FanoutClients;
use crate::core::fanout::outcome::OutcomeAggregator;
use crate::core::remap::IdRemapper;
use crate::domain::{
    OutcomeRecord, OutcomeStatus, RegsimError, Registration, Result, Study, StudyId, Target,
    TargetId, TransportError,
};
use chrono::Local;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Bound a transport operation by a target's configured timeout
///
/// An elapsed timeout surfaces as a [`TransportError::Timeout`], which
/// the stages fold into a failed outcome like any other send failure.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit).into()),
    }
}

/// Status for a unit whose order context could not be created
///
/// An absent or unreadable payload means the unit has no inputs and is
/// skipped. Anything else, identifier generation included, means work
/// was attempted and lost, so the unit is recorded failed.
pub(crate) fn order_failure_status(e: &RegsimError) -> OutcomeStatus {
    match e {
        RegsimError::Configuration(_) => OutcomeStatus::Skipped,
        _ => OutcomeStatus::Error,
    }
}

/// Order parameters generated once per (target, study) and reused by the
/// HL7 and imaging stages, so both reference the same accession number,
/// procedure ids and remapped study identifier.
#[derive(Debug, Clone)]
pub(crate) struct OrderContext {
    pub accession_number: String,
    pub requested_procedure_id: String,
    pub scheduled_step_id: String,
    pub placer_order_number: String,
    /// Per image-sharing demo convention the accession number doubles as
    /// the filler order number.
    pub filler_order_number: String,
    /// Remapped study identifier
    pub study_uid: String,
    /// Modality read from the probed payload item
    pub modality: String,
}

impl OrderContext {
    /// Expand into the order fields a message builder needs
    pub fn to_order_fields(&self, study: &Study, date_time: String, provider: &str) -> OrderFields {
        OrderFields {
            accession_number: self.accession_number.clone(),
            placer_order_number: format!(
                "{}^{}",
                self.placer_order_number, study.placer_order_authority
            ),
            filler_order_number: format!(
                "{}^{}",
                self.filler_order_number, study.filler_order_authority
            ),
            requested_procedure_id: self.requested_procedure_id.clone(),
            scheduled_step_id: self.scheduled_step_id.clone(),
            universal_service_id: study.universal_service_id(),
            diagnostic_service_id: self.modality.clone(),
            study_uid: self.study_uid.clone(),
            date_time,
            ordering_provider: provider.to_string(),
            entering_organization: study.entering_organization.clone(),
            report_text: None,
        }
    }
}

/// State for one registration fan-out run
pub(crate) struct RunContext<'a> {
    pub registration: &'a Registration,
    pub config: &'a RegsimConfig,
    pub clients: &'a FanoutClients,
    pub remapper: IdRemapper,
    pub aggregator: OutcomeAggregator,
    /// Run date as YYYYMMDD, used to expand `*` dates
    pub run_date: String,
    /// Run time as HHMMSS
    pub run_time: String,
    seq: AtomicU64,
    order_contexts: Mutex<HashMap<(TargetId, StudyId), OrderContext>>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        registration: &'a Registration,
        config: &'a RegsimConfig,
        clients: &'a FanoutClients,
    ) -> Self {
        let now = Local::now();
        Self {
            registration,
            config,
            clients,
            remapper: IdRemapper::new(clients.id_generator.clone()),
            aggregator: OutcomeAggregator::new(clients.audit.clone()),
            run_date: now.format("%Y%m%d").to_string(),
            run_time: now.format("%H%M%S").to_string(),
            seq: AtomicU64::new(1),
            order_contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Record one outcome
    pub async fn record(&self, record: OutcomeRecord) {
        self.aggregator.record(record).await;
    }

    /// Next value of the run-scoped sequence counter
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Current timestamp as YYYYMMDDHHMMSS
    pub fn timestamp(&self) -> String {
        Local::now().format("%Y%m%d%H%M%S").to_string()
    }

    /// Timestamp a number of minutes from now (reports are stamped ahead
    /// of the order they answer)
    pub fn timestamp_in(&self, minutes: i64) -> String {
        (Local::now() + chrono::Duration::minutes(minutes))
            .format("%Y%m%d%H%M%S")
            .to_string()
    }

    /// Patient fields resolved against one target's local identifier
    pub fn patient_fields(&self, target: &Target) -> PatientFields {
        let reg = self.registration;
        let local_id = reg
            .local_id(&target.id)
            .map(str::to_string)
            .unwrap_or_else(|| {
                tracing::debug!(
                    target_id = %target.id,
                    "No local id assigned at intake; using global id"
                );
                reg.global_id.as_str().to_string()
            });
        PatientFields {
            local_id,
            assigning_authority: target.local_assigning_authority.clone(),
            global_id: reg.global_id.as_str().to_string(),
            name: reg.name(),
            email: reg.email.clone(),
            birth_date: reg.birth_date.clone(),
            sex: reg.sex.clone(),
            street: reg.street.clone(),
            city: reg.city.clone(),
            state: reg.state.clone(),
            zip: reg.zip.clone(),
            country: reg.country.clone(),
        }
    }

    /// Order context for one (target, study), created on first use
    ///
    /// Probes the study payload for its first readable item to learn the
    /// original study identifier and modality, remaps the study identifier
    /// through the run remapper, and assigns run-scoped order numbers. The
    /// HL7 and imaging stages both resolve through this cache, which keeps
    /// their identifier assignments causally consistent.
    pub fn order_context(&self, target: &Target, study: &Study) -> Result<OrderContext> {
        let mut cache = self.order_contexts.lock().unwrap_or_else(|e| e.into_inner());
        let key = (target.id.clone(), study.id.clone());
        if let Some(existing) = cache.get(&key) {
            return Ok(existing.clone());
        }

        let probe = self.probe_payload(study)?;
        let seq = self.next_seq();
        let accession_number = format!("ACC{seq:06}");
        let context = OrderContext {
            requested_procedure_id: format!("RP{seq}"),
            scheduled_step_id: format!("SPS{seq}"),
            placer_order_number: format!("PN{seq}"),
            filler_order_number: accession_number.clone(),
            accession_number,
            study_uid: self.remapper.get_or_create(&probe.study_uid)?,
            modality: probe.modality,
        };
        cache.insert(key, context.clone());
        Ok(context)
    }

    /// Walk the study payload until the first item that parses
    fn probe_payload(&self, study: &Study) -> Result<crate::adapters::traits::InstanceInfo> {
        for item in self.clients.walker.items(&study.directory)? {
            match self.clients.imaging.describe(&item) {
                Ok(info) => return Ok(info),
                Err(e) => {
                    tracing::debug!(item = %item.display(), error = %e, "Probe skipped item");
                }
            }
        }
        Err(RegsimError::Configuration(format!(
            "No readable payload item under {}",
            study.directory.display()
        )))
    }

    /// Template parameters for one document build
    ///
    /// Generated identifiers (uuid, uid1..uid4, document id) are drawn
    /// fresh for every call; the `pdf` parameter starts empty and is
    /// filled in after PDF rendering.
    pub fn document_params(
        &self,
        title: &str,
        institution_name: &str,
        date: &str,
    ) -> Result<TemplateParams> {
        let reg = self.registration;
        let identity = &self.config.identity;
        let idgen = &self.clients.id_generator;

        let mut params = TemplateParams::new();
        params.set("patient-name", reg.name());
        params.set("full-name", reg.full_name());
        params.set("given-name", reg.given_name.clone());
        params.set("family-name", reg.family_name.clone());
        params.set("patient-id", reg.global_id.as_str());
        params.set("assigning-authority", identity.global_assigning_authority.clone());
        params.set(
            "assigning-authority-oid",
            identity.global_assigning_authority_oid.clone(),
        );
        params.set("institution-name", institution_name);
        params.set("document-id", format!("ACC{:06}", self.next_seq()));
        params.set("title", title);
        params.set("date", date);
        params.set("time", self.run_time.clone());
        params.set("street", reg.street.clone());
        params.set("city", reg.city.clone());
        params.set("state", reg.state.clone());
        params.set("zip", reg.zip.clone());
        params.set("country", reg.country.clone());
        params.set("sex", reg.sex.clone());
        params.set("birth-date", reg.birth_date.clone());
        params.set("uuid", uuid::Uuid::new_v4().to_string());
        params.set("uid1", idgen.new_id()?);
        params.set("uid2", idgen.new_id()?);
        params.set("uid3", idgen.new_id()?);
        params.set("uid4", idgen.new_id()?);
        params.set("pdf", "");
        Ok(params)
    }
}
