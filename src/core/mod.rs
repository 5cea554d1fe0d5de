//! Core business logic

pub mod fanout;
pub mod remap;

pub use fanout::{FanoutClients, FanoutOrchestrator, OutcomeAggregator, RunSummary};
pub use remap::IdRemapper;
