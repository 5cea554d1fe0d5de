//! Configuration loading tests over real files

use regsim::config::load_config;
use regsim::domain::{TargetId, TargetKind};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const FULL_CONFIG: &str = r#"
[application]
log_level = "debug"
output_dir = "out"
physician_name = "Curie^Marie"

[identity]
uid_root = "1.2.840.99970.1"
global_assigning_authority = "GLOBAL_AD"
global_assigning_authority_oid = "1.2.840.99970.2"

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "hourly"

[[targets]]
id = "pacs-west"
kind = "imaging_system"
hl7_url = "mllp://pacs-west:3600"
imaging_url = "pacs-west:11112"
local_assigning_authority = "WEST_RAD"
institution_name = "West Radiology"
retrieve_aet = "WEST_PACS"
repository_id = "repo-central"
timeout_ms = 5000
report_delay_ms = 250

[targets.capabilities]
accepts_orders = true
accepts_reports = true
sends_manifest = true

[[targets]]
id = "repo-central"
kind = "repository"
submit_url = "https://repo-central/xds"
docset_delay_ms = 100

[targets.capabilities]
sends_documents = true

[[targets]]
id = "feed-ix"
kind = "identity_feed"
hl7_url = "mllp://feed-ix:3700"
enabled = false

[targets.capabilities]
accepts_admit = true

[[studies]]
id = "chest-ct"
target_id = "pacs-west"
directory = "payloads/chest-ct"
description = "CT Chest w/o contrast"
body_part = "CHEST"
procedure_code = "71250"
local_procedure_code = "L71250"
date = "20250601"

[[docsets]]
id = "discharge"
repository_id = "repo-central"
directory = "docsets/discharge"
title = "Discharge Summary"
sex = "female"
"#;

#[test]
fn test_full_config_round_trip() {
    let file = write_config(FULL_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.application.physician_name, "Curie^Marie");
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");

    assert_eq!(config.targets.len(), 3);
    let pacs = config.target(&TargetId::new("pacs-west").unwrap()).unwrap();
    assert_eq!(pacs.kind, TargetKind::ImagingSystem);
    assert!(pacs.capabilities.accepts_orders);
    assert!(pacs.capabilities.sends_manifest);
    assert_eq!(pacs.timeout_ms, 5_000);
    assert_eq!(pacs.report_delay_ms, 250);
    assert_eq!(
        pacs.repository_id,
        Some(TargetId::new("repo-central").unwrap())
    );

    let feed = config.target(&TargetId::new("feed-ix").unwrap()).unwrap();
    assert!(!feed.enabled);

    let bound = config.studies_for(&TargetId::new("pacs-west").unwrap());
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].universal_service_id(), "71250^L71250");
    assert_eq!(bound[0].resolved_date("20260827"), "20250601");

    let docsets = config.docsets_for(&TargetId::new("repo-central").unwrap());
    assert_eq!(docsets.len(), 1);
    assert!(docsets[0].sex.accepts("F"));
    assert!(!docsets[0].sex.accepts("M"));
}

#[test]
fn test_env_substitution_in_file() {
    std::env::set_var("REGSIM_IT_UID_ROOT", "7.7.7");
    let file = write_config(
        r#"
[application]
output_dir = "out"

[identity]
uid_root = "${REGSIM_IT_UID_ROOT}"
global_assigning_authority = "GLOBAL"
global_assigning_authority_oid = "1.2"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.identity.uid_root, "7.7.7");
    std::env::remove_var("REGSIM_IT_UID_ROOT");
}

#[test]
fn test_cross_reference_validation_failures_name_the_culprit() {
    let file = write_config(
        r#"
[application]
output_dir = "out"

[identity]
uid_root = "1.2"
global_assigning_authority = "GLOBAL"
global_assigning_authority_oid = "1.2"

[[targets]]
id = "pacs-1"
kind = "imaging_system"

[[docsets]]
id = "d1"
repository_id = "pacs-1"
directory = "docsets/d1"
"#,
    );
    let err = load_config(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("d1"));
    assert!(message.contains("not a repository"));
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let file = write_config("[application\noutput_dir = out");
    assert!(load_config(file.path()).is_err());
}
