//! Unit-of-work bindings
//!
//! Configuration-time bindings between payloads and targets: a [`Study`]
//! binds an imaging payload directory to an imaging system, a [`DocSet`]
//! binds a document-template directory to a repository. Each enabled
//! binding becomes one independent unit of work during a fan-out run.

use crate::domain::ids::{DocSetId, StudyId, TargetId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_enabled() -> bool {
    true
}

fn default_date() -> String {
    "*".to_string()
}

/// One imaging study payload bound to an imaging system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    /// Study identifier
    pub id: StudyId,

    /// Disabled studies are never transferred
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Imaging system this study is bound to
    pub target_id: TargetId,

    /// Root of the payload tree (directories recurse, files are items)
    pub directory: PathBuf,

    /// Study date as YYYYMMDD; `*` means the run date
    #[serde(default = "default_date")]
    pub date: String,

    /// Study description
    #[serde(default)]
    pub description: String,

    /// Body part examined
    #[serde(default)]
    pub body_part: String,

    /// Procedure code
    #[serde(default)]
    pub procedure_code: String,

    /// Local procedure code (appended to the universal service id)
    #[serde(default)]
    pub local_procedure_code: String,

    /// Placer order assigning authority
    #[serde(default)]
    pub placer_order_authority: String,

    /// Filler order assigning authority
    #[serde(default)]
    pub filler_order_authority: String,

    /// Entering organization for order messages
    #[serde(default)]
    pub entering_organization: String,
}

impl Study {
    /// Companion metadata location for manifest generation
    ///
    /// Lives beside the payload directory with a `-metadata` suffix. When
    /// it does not exist, manifest generation is skipped (a distinct,
    /// non-fatal condition).
    pub fn metadata_dir(&self) -> PathBuf {
        let mut name = self
            .directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str("-metadata");
        self.directory
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(name)
    }

    /// Study date with `*` expanded to the run date
    pub fn resolved_date(&self, run_date: &str) -> String {
        if self.date.contains('*') {
            run_date.to_string()
        } else {
            self.date.clone()
        }
    }

    /// Universal service id combining procedure and local procedure codes
    pub fn universal_service_id(&self) -> String {
        if self.local_procedure_code.is_empty() {
            self.procedure_code.clone()
        } else {
            format!("{}^{}", self.procedure_code, self.local_procedure_code)
        }
    }
}

/// Sex constraint restricting which registrations a document set applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SexConstraint {
    /// Applies to every registration
    #[default]
    Both,
    /// Applies only to male registrations
    Male,
    /// Applies only to female registrations
    Female,
}

impl SexConstraint {
    /// Whether a registration's sex field satisfies this constraint
    ///
    /// An empty sex field always matches; intake does not require the
    /// field to be populated.
    pub fn accepts(&self, sex: &str) -> bool {
        let sex = sex.trim().to_uppercase();
        match self {
            SexConstraint::Both => true,
            _ if sex.is_empty() => true,
            SexConstraint::Male => sex.starts_with('M'),
            SexConstraint::Female => sex.starts_with('F'),
        }
    }
}

/// One document-set job bound to a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSet {
    /// Document-set identifier
    pub id: DocSetId,

    /// Disabled document sets are never submitted
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Repository this document set is bound to
    pub repository_id: TargetId,

    /// Directory holding the template sources
    pub directory: PathBuf,

    /// Document title
    #[serde(default)]
    pub title: String,

    /// Institution name for document metadata
    #[serde(default)]
    pub institution_name: String,

    /// Document date as YYYYMMDD; `*` means the run date
    #[serde(default = "default_date")]
    pub date: String,

    /// Sex constraint for applicability
    #[serde(default)]
    pub sex: SexConstraint,
}

impl DocSet {
    /// Document date with `*` expanded to the run date
    pub fn resolved_date(&self, run_date: &str) -> String {
        if self.date.contains('*') {
            run_date.to_string()
        } else {
            self.date.clone()
        }
    }
}
