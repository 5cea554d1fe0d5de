//! Adapters for external protocols and services

pub mod audit;
pub mod idgen;
pub mod loopback;
pub mod payload;
pub mod traits;

pub use audit::{JsonlAuditSink, MemoryAuditSink};
pub use idgen::UidGenerator;
pub use loopback::{LoopbackDocumentClient, LoopbackHl7Client, LoopbackImagingClient};
pub use payload::DirectoryWalker;
