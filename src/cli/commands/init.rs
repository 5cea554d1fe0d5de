//! Init command: write starter configuration and registration files

use clap::Args;
use std::path::PathBuf;

const CONFIG_TEMPLATE: &str = r#"# Regsim configuration

[application]
log_level = "info"
output_dir = "out"
physician_name = "Moore^Samuel"

[identity]
uid_root = "1.2.840.99970.1"
global_assigning_authority = "GLOBAL_AD"
global_assigning_authority_oid = "1.2.840.99970.2"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"

# An imaging system that accepts orders and instance transfers
[[targets]]
id = "pacs-west"
kind = "imaging_system"
hl7_url = "mllp://localhost:3600"
imaging_url = "localhost:11112"
local_assigning_authority = "WEST_RAD"
institution_name = "West Radiology"
retrieve_aet = "WEST_PACS"

[targets.capabilities]
accepts_orders = true
accepts_reports = true

# A document repository; transmission is off until its endpoint is live
[[targets]]
id = "repo-central"
kind = "repository"
submit_url = "https://localhost:9443/xds"
local_assigning_authority = "CENTRAL_DOCS"
institution_name = "Central Repository"

[targets.capabilities]
sends_documents = false

# A patient-identity feed
[[targets]]
id = "feed-ix"
kind = "identity_feed"
hl7_url = "mllp://localhost:3700"
local_assigning_authority = "IX_DOMAIN"

[targets.capabilities]
accepts_admit = true

[[studies]]
id = "chest-ct"
target_id = "pacs-west"
directory = "payloads/chest-ct"
description = "CT Chest w/o contrast"
body_part = "CHEST"
procedure_code = "71250"

[[docsets]]
id = "discharge-summary"
repository_id = "repo-central"
directory = "docsets/discharge-summary"
title = "Discharge Summary"
"#;

const REGISTRATION_TEMPLATE: &str = r#"# Registration intake file

global_id = "GID-000001"
given_name = "Ada"
family_name = "Lovelace"
email = "ada@example.org"
birth_date = "19791210"
sex = "F"
street = "12 Analytical Way"
city = "Geneva"
state = "GE"
zip = "1201"
country = "CH"

# Pre-assigned local identifiers per target; omitted targets get one
# generated at intake
[local_ids]
pacs-west = "W-100234"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write the starter files into
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub async fn execute(&self) -> anyhow::Result<i32> {
        std::fs::create_dir_all(&self.dir)?;
        let mut wrote = 0;
        wrote += self.write_one("regsim.toml", CONFIG_TEMPLATE)?;
        wrote += self.write_one("registration.toml", REGISTRATION_TEMPLATE)?;
        if wrote > 0 {
            println!("\nNext steps:");
            println!("  1. Edit regsim.toml for your targets and payload locations");
            println!("  2. Edit registration.toml with the subject to register");
            println!("  3. Run: regsim run --registration registration.toml");
        }
        Ok(0)
    }

    fn write_one(&self, name: &str, content: &str) -> anyhow::Result<usize> {
        let path = self.dir.join(name);
        if path.exists() && !self.force {
            println!("Skipping {name}: already exists (use --force to overwrite)");
            return Ok(0);
        }
        std::fs::write(&path, content)?;
        println!("Wrote {}", path.display());
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_is_valid() {
        let config: crate::config::RegsimConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.targets.len(), 3);
    }

    #[test]
    fn test_registration_template_is_valid() {
        let registration: crate::domain::Registration =
            toml::from_str(REGISTRATION_TEMPLATE).unwrap();
        registration.validate().unwrap();
        assert_eq!(registration.given_name, "Ada");
    }

    #[tokio::test]
    async fn test_init_writes_both_files_and_respects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            dir: dir.path().to_path_buf(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(dir.path().join("regsim.toml").is_file());
        assert!(dir.path().join("registration.toml").is_file());

        std::fs::write(dir.path().join("regsim.toml"), "custom").unwrap();
        args.execute().await.unwrap();
        let kept = std::fs::read_to_string(dir.path().join("regsim.toml")).unwrap();
        assert_eq!(kept, "custom");
    }
}
