//! Collaborator contracts consumed by the fan-out core
//!
//! The core drives downstream protocols through these traits and never
//! touches wire formats itself. Implementations live beside this module
//! (loopback simulators) or in test code (stubs).

use crate::domain::{OutcomeKind, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Globally unique identifier source
///
/// Must be safe under concurrent calls from multiple runs; the identifier
/// remapper and template-parameter builders treat it as an opaque service.
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh, globally unique identifier
    fn new_id(&self) -> Result<String>;
}

/// HL7 message profiles a target may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hl7Profile {
    /// Patient-identity/admit feed
    Admit,
    /// Order message
    Order,
    /// Report message
    Report,
}

impl Hl7Profile {
    /// Short name used in contexts and file names
    pub fn name(&self) -> &'static str {
        match self {
            Hl7Profile::Admit => "admit",
            Hl7Profile::Order => "order",
            Hl7Profile::Report => "report",
        }
    }

    /// Outcome category this profile's sends are recorded under
    pub fn outcome_kind(&self) -> OutcomeKind {
        match self {
            Hl7Profile::Admit => OutcomeKind::IdentityFeed,
            Hl7Profile::Order | Hl7Profile::Report => OutcomeKind::Hl7,
        }
    }
}

/// Patient-level fields for message building, resolved per target
#[derive(Debug, Clone, Default)]
pub struct PatientFields {
    pub local_id: String,
    pub assigning_authority: String,
    pub global_id: String,
    pub name: String,
    pub email: String,
    pub birth_date: String,
    pub sex: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Order-level fields for order/report profiles
#[derive(Debug, Clone, Default)]
pub struct OrderFields {
    pub accession_number: String,
    pub placer_order_number: String,
    pub filler_order_number: String,
    pub requested_procedure_id: String,
    pub scheduled_step_id: String,
    pub universal_service_id: String,
    pub diagnostic_service_id: String,
    pub study_uid: String,
    pub date_time: String,
    pub ordering_provider: String,
    pub entering_organization: String,
    pub report_text: Option<String>,
}

/// A built HL7 message ready for transport
#[derive(Debug, Clone)]
pub struct Hl7Message {
    pub profile: Hl7Profile,
    pub text: String,
}

/// HL7 profile client: builds messages and speaks the HL7 transport
#[async_trait]
pub trait Hl7Client: Send + Sync {
    /// Build a message for the given profile
    ///
    /// Order fields are required for the order and report profiles and
    /// ignored for the admit profile.
    fn build(
        &self,
        profile: Hl7Profile,
        patient: &PatientFields,
        order: Option<&OrderFields>,
    ) -> Result<Hl7Message>;

    /// Send a message and return the raw acknowledgement text
    async fn send(&self, message: &Hl7Message, endpoint: &str, timeout: Duration)
        -> Result<String>;

    /// Application-defined success marker, matched case-insensitively in
    /// the acknowledgement text
    fn success_marker(&self) -> &str {
        "msa|aa"
    }
}

/// Identifiers and descriptors read from one payload item
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub study_uid: String,
    pub series_uid: String,
    pub modality: String,
}

/// Field assignments applied to one instance before it is sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstanceAssignment {
    pub patient_name: String,
    pub patient_id: String,
    pub assigning_authority: String,
    pub global_subject_id: String,
    pub birth_date: String,
    pub sex: String,
    pub study_date: String,
    pub study_time: String,
    pub accession_number: String,
    pub institution_name: String,
    pub requested_procedure_id: String,
    pub scheduled_step_id: String,
    pub study_uid: String,
    pub series_uid: String,
    pub instance_uid: String,
    pub instance_number: u32,
    pub description: String,
    pub body_part: String,
}

/// An open imaging transfer session against one endpoint
#[async_trait]
pub trait ImagingSession: Send {
    /// Send one item with the given assignments
    ///
    /// Errors on malformed or unsendable items; the caller tallies the
    /// failure and continues with the next item.
    async fn send(&mut self, item: &Path, assignment: &InstanceAssignment) -> Result<()>;

    /// Close the session
    async fn close(&mut self) -> Result<()>;
}

/// Imaging transfer client
#[async_trait]
pub trait ImagingClient: Send + Sync {
    /// Read identifiers from one payload item without sending it
    ///
    /// Errors when the item cannot be parsed as an instance.
    fn describe(&self, item: &Path) -> Result<InstanceInfo>;

    /// Open a transfer session against an endpoint
    async fn open(&self, endpoint: &str, timeout: Duration) -> Result<Box<dyn ImagingSession>>;
}

/// Lazy, finite, restartable traversal of transferable payload items
pub trait PayloadWalker: Send + Sync {
    /// Iterate the leaf items rooted at a location
    ///
    /// Directories recurse; non-directories are leaf items. Calling again
    /// with the same root restarts the traversal.
    fn items(&self, root: &Path) -> Result<Box<dyn Iterator<Item = PathBuf> + Send>>;
}

/// Template parameters for document building
///
/// Ordered map so rendered artifacts are deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct TemplateParams(BTreeMap<String, String>);

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one parameter
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up one parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Substitute `${key}` placeholders in a template body
    ///
    /// Unknown placeholders are left in place so missing inputs stay
    /// visible in rendered output.
    pub fn apply(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (key, value) in &self.0 {
            out = out.replace(&format!("${{{key}}}"), value);
        }
        out
    }

    /// Iterate parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One assembled document submission
#[derive(Debug, Clone, Default)]
pub struct DocumentSubmission {
    /// Clinical document body, when a document template exists
    pub document: Option<String>,
    /// Rendered PDF bytes, when a PDF template exists
    pub pdf: Option<Vec<u8>>,
    /// Document-entry metadata
    pub doc_entry: String,
    /// Submission-set metadata
    pub submission_set: String,
    /// Document title
    pub title: String,
}

/// Response from a document submission
#[derive(Debug, Clone, Default)]
pub struct SubmitResponse {
    /// Registry errors; empty means the submission was accepted
    pub errors: Vec<String>,
}

impl SubmitResponse {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Document build/submit client
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Render a template source with parameter substitution
    fn build_from_template(&self, source: &Path, params: &TemplateParams) -> Result<String>;

    /// Render a PDF from a PDF template source
    fn render_pdf(&self, source: &Path, params: &TemplateParams) -> Result<Vec<u8>>;

    /// Submit an assembled document; errors on transport failure
    async fn submit(
        &self,
        submission: &DocumentSubmission,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<SubmitResponse>;
}

/// Append-only, concurrency-safe audit sink
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one outcome record; each append is atomic
    async fn append(&self, record: &crate::domain::OutcomeRecord) -> Result<()>;
}
