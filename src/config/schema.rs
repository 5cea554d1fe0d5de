//! Configuration schema

use crate::domain::{DocSet, RegsimError, Result, Study, Target, TargetId, TargetKind};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegsimConfig {
    pub application: ApplicationConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub studies: Vec<Study>,
    #[serde(default)]
    pub docsets: Vec<DocSet>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory the loopback clients and audit trail write under
    pub output_dir: PathBuf,

    /// Ordering provider placed on order and report messages
    #[serde(default = "default_physician_name")]
    pub physician_name: String,
}

/// Identity domain settings
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// OID root for generated identifiers
    pub uid_root: String,

    /// Assigning authority of the global subject identifier
    pub global_assigning_authority: String,

    /// OID of the global assigning authority
    pub global_assigning_authority_oid: String,
}

/// File logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Whether to also write JSON logs to a local file
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_physician_name() -> String {
    "Moore^Samuel".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_ROTATIONS: &[&str] = &["daily", "hourly", "never"];

impl RegsimConfig {
    /// Validate cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(RegsimError::Configuration(format!(
                "Invalid log level: {}",
                self.application.log_level
            )));
        }
        if !VALID_ROTATIONS.contains(&self.logging.local_rotation.to_lowercase().as_str()) {
            return Err(RegsimError::Configuration(format!(
                "Invalid log rotation: {}",
                self.logging.local_rotation
            )));
        }
        if self.identity.uid_root.is_empty() {
            return Err(RegsimError::Configuration(
                "identity.uid_root must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(&target.id) {
                return Err(RegsimError::Configuration(format!(
                    "Duplicate target id: {}",
                    target.id
                )));
            }
        }
        for target in &self.targets {
            if let Some(repository_id) = &target.repository_id {
                match self.target(repository_id) {
                    Some(repository) if repository.kind == TargetKind::Repository => {}
                    Some(_) => {
                        return Err(RegsimError::Configuration(format!(
                            "Target {} links repository_id {} which is not a repository",
                            target.id, repository_id
                        )))
                    }
                    None => {
                        return Err(RegsimError::Configuration(format!(
                            "Target {} links unknown repository_id {}",
                            target.id, repository_id
                        )))
                    }
                }
            }
        }

        for study in &self.studies {
            match self.target(&study.target_id) {
                Some(target) if target.kind == TargetKind::ImagingSystem => {}
                Some(_) => {
                    return Err(RegsimError::Configuration(format!(
                        "Study {} is bound to {} which is not an imaging system",
                        study.id, study.target_id
                    )))
                }
                None => {
                    return Err(RegsimError::Configuration(format!(
                        "Study {} is bound to unknown target {}",
                        study.id, study.target_id
                    )))
                }
            }
        }

        for docset in &self.docsets {
            match self.target(&docset.repository_id) {
                Some(target) if target.kind == TargetKind::Repository => {}
                Some(_) => {
                    return Err(RegsimError::Configuration(format!(
                        "DocSet {} is bound to {} which is not a repository",
                        docset.id, docset.repository_id
                    )))
                }
                None => {
                    return Err(RegsimError::Configuration(format!(
                        "DocSet {} is bound to unknown target {}",
                        docset.id, docset.repository_id
                    )))
                }
            }
        }

        Ok(())
    }

    /// Look up a target by id
    pub fn target(&self, id: &TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| &t.id == id)
    }

    /// Enabled studies bound to one target, in configuration order
    pub fn studies_for(&self, target_id: &TargetId) -> Vec<&Study> {
        self.studies
            .iter()
            .filter(|s| s.enabled && &s.target_id == target_id)
            .collect()
    }

    /// Enabled document sets bound to one repository, in configuration order
    pub fn docsets_for(&self, repository_id: &TargetId) -> Vec<&DocSet> {
        self.docsets
            .iter()
            .filter(|d| d.enabled && &d.repository_id == repository_id)
            .collect()
    }
}
