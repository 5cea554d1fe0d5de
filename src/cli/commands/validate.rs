//! Validate-config command

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid: {config_path}");
                println!("  targets: {}", config.targets.len());
                println!(
                    "  enabled: {}",
                    config.targets.iter().filter(|t| t.enabled).count()
                );
                println!("  studies: {}", config.studies.len());
                println!("  docsets: {}", config.docsets.len());
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {e}");
                Ok(2)
            }
        }
    }
}
