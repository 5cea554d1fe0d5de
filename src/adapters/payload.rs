//! Payload traversal

use crate::adapters::traits::PayloadWalker;
use crate::domain::Result;
use std::path::{Path, PathBuf};

/// Depth-first directory walker
///
/// Yields leaf files lazily in sorted order so two walks over the same
/// tree visit items identically. A file root yields itself as the single
/// item. Unreadable directories encountered mid-walk are logged and
/// skipped rather than aborting the traversal.
pub struct DirectoryWalker;

impl DirectoryWalker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirectoryWalker {
    fn default() -> Self {
        Self::new()
    }
}

struct WalkIter {
    stack: Vec<PathBuf>,
}

impl Iterator for WalkIter {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(path) = self.stack.pop() {
            if !path.is_dir() {
                return Some(path);
            }
            match std::fs::read_dir(&path) {
                Ok(entries) => {
                    let mut children: Vec<PathBuf> =
                        entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
                    // Reverse-sorted so the stack pops in ascending order
                    children.sort();
                    children.reverse();
                    self.stack.extend(children);
                }
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "Skipping unreadable directory");
                }
            }
        }
        None
    }
}

impl PayloadWalker for DirectoryWalker {
    fn items(&self, root: &Path) -> Result<Box<dyn Iterator<Item = PathBuf> + Send>> {
        if !root.exists() {
            return Err(crate::domain::RegsimError::Configuration(format!(
                "Payload location {} does not exist",
                root.display()
            )));
        }
        Ok(Box::new(WalkIter {
            stack: vec![root.to_path_buf()],
        }))
    }
}
