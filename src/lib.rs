// Regsim - Patient Registration Fan-Out Simulator
// Copyright (c) 2026 Regsim Contributors
// Licensed under the MIT License

//! # Regsim - Patient Registration Fan-Out Simulator
//!
//! Regsim simulates a patient registering at a healthcare facility and fans
//! that single registration out to every configured downstream system:
//! imaging systems receive HL7 orders, reports and instance transfers,
//! document repositories receive rendered document sets, and identity feeds
//! receive admit messages.
//!
//! ## Overview
//!
//! One `run` invocation drives the full fan-out sequence:
//! - **HL7 profiles** (admit, order, report) to every target that accepts them
//! - **Imaging transfers** of simulated study payloads, with per-item tallies
//! - **Document sets** rendered from template directories and submitted
//! - **A unified audit trail** of one outcome record per unit of work
//!
//! A failure at any target is isolated to that target's outcome records;
//! only an unusable registration aborts the run.
//!
//! ## Architecture
//!
//! Regsim follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (fan-out pipeline, identifier remapping)
//! - [`adapters`] - Protocol clients, payload traversal, audit sinks
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regsim::adapters::{
//!     DirectoryWalker, JsonlAuditSink, LoopbackDocumentClient, LoopbackHl7Client,
//!     LoopbackImagingClient, UidGenerator,
//! };
//! use regsim::config::load_config;
//! use regsim::core::{FanoutClients, FanoutOrchestrator};
//! use regsim::domain::Registration;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("regsim.toml")?;
//!     let registration = Registration::from_file("registration.toml")?;
//!
//!     let out = config.application.output_dir.clone();
//!     let clients = FanoutClients {
//!         id_generator: Arc::new(UidGenerator::new(&config.identity.uid_root)),
//!         hl7: Arc::new(LoopbackHl7Client::new(&out)),
//!         imaging: Arc::new(LoopbackImagingClient::new(&out)),
//!         walker: Arc::new(DirectoryWalker::new()),
//!         documents: Arc::new(LoopbackDocumentClient::new(&out)),
//!         audit: Arc::new(JsonlAuditSink::open(out.join("audit.jsonl"))?),
//!     };
//!
//!     let summary = FanoutOrchestrator::new(config, clients)
//!         .run(&registration)
//!         .await?;
//!     println!("{} units, {} failed", summary.total_units(), summary.error_units);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Regsim uses the [`domain::RegsimError`] type for all errors. Transport
//! failures never escape the run: they surface as failed outcome records
//! in the returned [`core::RunSummary`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
