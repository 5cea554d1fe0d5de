//! Unique identifier generation

use crate::adapters::traits::IdGenerator;
use crate::domain::{RegsimError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// OID-style identifier generator
///
/// Produces `<root>.<millis>.<n>` where the counter is process-scoped, so
/// identifiers stay unique across concurrent runs sharing one generator.
pub struct UidGenerator {
    root: String,
    counter: AtomicU64,
}

impl UidGenerator {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for UidGenerator {
    fn new_id(&self) -> Result<String> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RegsimError::IdGeneration(format!("system clock error: {e}")))?
            .as_millis();
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}.{millis}.{n}", self.root))
    }
}
