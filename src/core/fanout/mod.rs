//! Registration fan-out pipeline

mod context;
mod dispatch;
mod documents;
mod hl7;
mod imaging;
mod orchestrator;
mod outcome;
mod summary;

pub use dispatch::{dispatch, dispatch_stage};
pub use orchestrator::{FanoutClients, FanoutOrchestrator};
pub use outcome::OutcomeAggregator;
pub use summary::RunSummary;
