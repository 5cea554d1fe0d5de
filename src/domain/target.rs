//! Downstream target model
//!
//! A [`Target`] is one configured downstream endpoint: a tagged
//! [`TargetKind`] plus a declared [`Capabilities`] set. The dispatcher
//! treats all targets uniformly and branches only on capabilities.

use crate::domain::ids::TargetId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of downstream system a target represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Imaging system (accepts instance transfers, usually HL7 orders too)
    ImagingSystem,
    /// Document repository (accepts document-set submissions)
    Repository,
    /// Patient-identity feed endpoint
    IdentityFeed,
}

/// Protocol-capability flags declared by a target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Accepts patient-identity/admit messages
    #[serde(default)]
    pub accepts_admit: bool,

    /// Accepts order messages
    #[serde(default)]
    pub accepts_orders: bool,

    /// Accepts report messages
    #[serde(default)]
    pub accepts_reports: bool,

    /// Actually transmits document submissions (when false, document jobs
    /// are skipped with a "transmission disabled" outcome, not an error)
    #[serde(default)]
    pub sends_documents: bool,

    /// Produces a structured manifest after an imaging transfer
    #[serde(default)]
    pub sends_manifest: bool,
}

/// One configured downstream endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier
    pub id: TargetId,

    /// Target kind
    pub kind: TargetKind,

    /// Disabled targets are skipped entirely and never appear in outcomes
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Declared protocol capabilities
    #[serde(default)]
    pub capabilities: Capabilities,

    /// HL7 endpoint (opaque, passed through to the HL7 client)
    #[serde(default)]
    pub hl7_url: String,

    /// Imaging transfer endpoint (opaque)
    #[serde(default)]
    pub imaging_url: String,

    /// Document submission endpoint (opaque)
    #[serde(default)]
    pub submit_url: String,

    /// Per-send timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Assigning authority for this target's local patient ids
    #[serde(default)]
    pub local_assigning_authority: String,

    /// Institution name stamped on transferred instances
    #[serde(default)]
    pub institution_name: String,

    /// Retrieve location advertised in imaging manifests
    #[serde(default)]
    pub retrieve_aet: String,

    /// Repository target that receives this target's imaging manifests
    #[serde(default)]
    pub repository_id: Option<TargetId>,

    /// Optional wait before sending the report profile, in milliseconds
    #[serde(default)]
    pub report_delay_ms: u64,

    /// Optional wait before this repository's document jobs, in milliseconds
    #[serde(default)]
    pub docset_delay_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Target {
    /// Per-send timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether this target accepts any HL7 message profile
    pub fn accepts_hl7(&self) -> bool {
        self.capabilities.accepts_admit
            || self.capabilities.accepts_orders
            || self.capabilities.accepts_reports
    }

    /// Whether this target receives imaging transfers
    pub fn accepts_imaging(&self) -> bool {
        self.kind == TargetKind::ImagingSystem
    }

    /// Whether this target receives document submissions
    pub fn accepts_document_sets(&self) -> bool {
        self.kind == TargetKind::Repository
    }
}
