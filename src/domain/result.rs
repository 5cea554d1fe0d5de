//! Result type alias for Regsim operations

use super::errors::RegsimError;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, RegsimError>;
