// Regsim - Patient Registration Fan-Out Simulator
// Copyright (c) 2026 Regsim Contributors
// Licensed under the MIT License

//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Regsim - Patient Registration Fan-Out Simulator
#[derive(Parser, Debug)]
#[command(name = "regsim")]
#[command(version, about, long_about = None)]
#[command(author = "Regsim Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "regsim.toml", env = "REGSIM_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REGSIM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fan one registration out to all configured targets
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize starter configuration and registration files
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["regsim", "run", "--registration", "reg.toml"]);
        assert_eq!(cli.config, "regsim.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from([
            "regsim",
            "--config",
            "custom.toml",
            "run",
            "--registration",
            "reg.toml",
        ]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from([
            "regsim",
            "--log-level",
            "debug",
            "run",
            "--registration",
            "reg.toml",
        ]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["regsim", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["regsim", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
