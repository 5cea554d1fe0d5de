//! Configuration loading
//!
//! Loads the TOML configuration file, substitutes `${VAR}` environment
//! references, applies `REGSIM_*` environment overrides and validates the
//! result.

use crate::config::schema::RegsimConfig;
use crate::domain::{RegsimError, Result};
use regex::Regex;
use std::path::Path;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<RegsimConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        RegsimError::Configuration(format!("Cannot read {}: {e}", path.display()))
    })?;

    let substituted = substitute_env_vars(&raw)?;
    let mut config: RegsimConfig = toml::from_str(&substituted)?;
    apply_env_overrides(&mut config);
    config.validate()?;

    tracing::debug!(
        path = %path.display(),
        targets = config.targets.len(),
        studies = config.studies.len(),
        docsets = config.docsets.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Replace `${VAR}` references with environment variable values
///
/// Comment lines are passed through untouched. All missing variables are
/// reported together so one fix round suffices.
fn substitute_env_vars(raw: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| RegsimError::Configuration(format!("Invalid substitution pattern: {e}")))?;

    let mut missing = Vec::new();
    let mut out = String::with_capacity(raw.len());

    for line in raw.lines() {
        if line.trim_start().starts_with('#') {
            out.push_str(line);
        } else {
            let replaced = pattern.replace_all(line, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                match std::env::var(name) {
                    Ok(value) => value,
                    Err(_) => {
                        missing.push(name.to_string());
                        caps[0].to_string()
                    }
                }
            });
            out.push_str(&replaced);
        }
        out.push('\n');
    }

    if missing.is_empty() {
        Ok(out)
    } else {
        missing.sort();
        missing.dedup();
        Err(RegsimError::Configuration(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )))
    }
}

/// Apply `REGSIM_*` environment overrides on top of the file values
fn apply_env_overrides(config: &mut RegsimConfig) {
    if let Ok(level) = std::env::var("REGSIM_APPLICATION_LOG_LEVEL") {
        config.application.log_level = level;
    }
    if let Ok(dir) = std::env::var("REGSIM_APPLICATION_OUTPUT_DIR") {
        config.application.output_dir = dir.into();
    }
    if let Ok(root) = std::env::var("REGSIM_IDENTITY_UID_ROOT") {
        config.identity.uid_root = root;
    }
    if let Ok(enabled) = std::env::var("REGSIM_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = enabled.eq_ignore_ascii_case("true");
    }
    if let Ok(path) = std::env::var("REGSIM_LOGGING_LOCAL_PATH") {
        config.logging.local_path = path;
    }
}
