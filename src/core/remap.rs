//! Identifier remapper
//!
//! Per-run store mapping original protocol identifiers (study and series
//! identifiers) to freshly generated replacements. One instance is
//! constructed per registration run and discarded when the run completes,
//! so identifier assignments never leak across registrations.

use crate::adapters::traits::IdGenerator;
use crate::domain::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Run-scoped identifier remap table
///
/// `get_or_create` is idempotent within one instance: the first call for
/// an original identifier generates a replacement through the configured
/// [`IdGenerator`]; every later call returns the recorded value. The lock
/// is held across generation so a same-key race resolves to exactly one
/// winner. Entries are never removed or reassigned.
pub struct IdRemapper {
    generator: Arc<dyn IdGenerator>,
    table: Mutex<HashMap<String, String>>,
}

impl IdRemapper {
    /// Create a fresh, empty remap table for one run
    pub fn new(generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            generator,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Return the replacement for an original identifier, generating it on
    /// first use
    ///
    /// A generation failure is returned to the caller and leaves no entry
    /// behind; the same key can be retried and unrelated keys are
    /// unaffected.
    pub fn get_or_create(&self, original: &str) -> Result<String> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = table.get(original) {
            return Ok(existing.clone());
        }
        let fresh = self.generator.new_id()?;
        table.insert(original.to_string(), fresh.clone());
        Ok(fresh)
    }

    /// Number of identifiers remapped so far in this run
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether any identifier has been remapped yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegsimError;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic generator that counts how many ids it has produced
    struct CountingGenerator {
        issued: AtomicU64,
    }

    impl CountingGenerator {
        fn new() -> Self {
            Self {
                issued: AtomicU64::new(0),
            }
        }

        fn issued(&self) -> u64 {
            self.issued.load(Ordering::SeqCst)
        }
    }

    impl IdGenerator for CountingGenerator {
        fn new_id(&self) -> Result<String> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst);
            Ok(format!("NEW-{n}"))
        }
    }

    struct FailingGenerator;

    impl IdGenerator for FailingGenerator {
        fn new_id(&self) -> Result<String> {
            Err(RegsimError::IdGeneration("service down".to_string()))
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let generator = Arc::new(CountingGenerator::new());
        let remapper = IdRemapper::new(generator.clone());

        let first = remapper.get_or_create("1.2.3.4").unwrap();
        let second = remapper.get_or_create("1.2.3.4").unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.issued(), 1);
        assert_eq!(remapper.len(), 1);
    }

    #[test]
    fn test_distinct_originals_get_distinct_ids() {
        let remapper = IdRemapper::new(Arc::new(CountingGenerator::new()));
        let a = remapper.get_or_create("study-a").unwrap();
        let b = remapper.get_or_create("study-b").unwrap();
        assert_ne!(a, b);
        assert_eq!(remapper.len(), 2);
    }

    #[test]
    fn test_runs_do_not_share_tables() {
        let generator = Arc::new(CountingGenerator::new());
        let run1 = IdRemapper::new(generator.clone());
        let run2 = IdRemapper::new(generator.clone());

        let from_run1 = run1.get_or_create("1.2.3.4").unwrap();
        let from_run2 = run2.get_or_create("1.2.3.4").unwrap();
        assert_ne!(from_run1, from_run2);
        assert_eq!(generator.issued(), 2);
    }

    #[test]
    fn test_same_key_race_has_single_winner() {
        let generator = Arc::new(CountingGenerator::new());
        let remapper = Arc::new(IdRemapper::new(generator.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let remapper = remapper.clone();
                std::thread::spawn(move || remapper.get_or_create("1.2.840.99").unwrap())
            })
            .collect();

        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(generator.issued(), 1);
    }

    #[test]
    fn test_generation_failure_leaves_no_entry() {
        let remapper = IdRemapper::new(Arc::new(FailingGenerator));
        assert!(remapper.get_or_create("1.2.3").is_err());
        assert!(remapper.is_empty());
    }
}
