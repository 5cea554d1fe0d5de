//! Registration event model
//!
//! A [`Registration`] is one synthetic patient-registration event produced
//! by the intake step. The fan-out core treats it as read-only for the
//! duration of a run; demographic fields are opaque strings passed through
//! to the protocol builders.

use crate::domain::ids::{GlobalId, TargetId};
use crate::domain::{RegsimError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One patient-registration event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Process-wide unique global identifier
    pub global_id: GlobalId,

    /// Given name
    pub given_name: String,

    /// Family name
    pub family_name: String,

    /// Email address (opaque, may be empty)
    #[serde(default)]
    pub email: String,

    /// Birth date as YYYYMMDD (opaque, may be empty)
    #[serde(default)]
    pub birth_date: String,

    /// Administrative sex ("M", "F" or empty)
    #[serde(default)]
    pub sex: String,

    /// Street address
    #[serde(default)]
    pub street: String,

    /// City
    #[serde(default)]
    pub city: String,

    /// State or province
    #[serde(default)]
    pub state: String,

    /// Postal code
    #[serde(default)]
    pub zip: String,

    /// Country
    #[serde(default)]
    pub country: String,

    /// Per-target table of locally assigned patient identifiers
    #[serde(default)]
    pub local_ids: HashMap<TargetId, String>,
}

impl Registration {
    /// Load a registration event from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RegsimError::Registration(format!(
                "Failed to read registration file {}: {e}",
                path.display()
            ))
        })?;
        let registration: Registration = toml::from_str(&contents)
            .map_err(|e| RegsimError::Registration(format!("Failed to parse registration: {e}")))?;
        registration.validate()?;
        Ok(registration)
    }

    /// Validate the registration before any target is contacted
    ///
    /// A failure here is the only fatal condition of a fan-out run.
    pub fn validate(&self) -> Result<()> {
        if self.family_name.trim().is_empty() {
            return Err(RegsimError::Registration(
                "family_name cannot be empty".to_string(),
            ));
        }
        if self.given_name.trim().is_empty() {
            return Err(RegsimError::Registration(
                "given_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Component-form name used by message builders (FAMILY^GIVEN)
    pub fn name(&self) -> String {
        format!("{}^{}", self.family_name, self.given_name)
    }

    /// Human-readable full name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    /// Locally assigned patient id for a target, if intake assigned one
    pub fn local_id(&self, target_id: &TargetId) -> Option<&str> {
        self.local_ids.get(target_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registration {
        Registration {
            global_id: GlobalId::new("GID-42").unwrap(),
            given_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
            email: String::new(),
            birth_date: "19850105".to_string(),
            sex: "F".to_string(),
            street: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: String::new(),
            zip: "SW1".to_string(),
            country: "UK".to_string(),
            local_ids: HashMap::from([(TargetId::new("pacs-1").unwrap(), "L-100".to_string())]),
        }
    }

    #[test]
    fn test_name_forms() {
        let reg = sample();
        assert_eq!(reg.name(), "Lovelace^Ada");
        assert_eq!(reg.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_local_id_lookup() {
        let reg = sample();
        let pacs = TargetId::new("pacs-1").unwrap();
        let other = TargetId::new("other").unwrap();
        assert_eq!(reg.local_id(&pacs), Some("L-100"));
        assert_eq!(reg.local_id(&other), None);
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut reg = sample();
        reg.family_name = "  ".to_string();
        assert!(reg.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
global_id = "GID-7"
given_name = "Grace"
family_name = "Hopper"
sex = "F"

[local_ids]
ehr-1 = "L-7"
"#
        )
        .unwrap();
        let reg = Registration::from_file(file.path()).unwrap();
        assert_eq!(reg.global_id.as_str(), "GID-7");
        assert_eq!(
            reg.local_id(&TargetId::new("ehr-1").unwrap()),
            Some("L-7")
        );
    }
}
