//! # Core Error Types
//!
//! Errors that callers of the kernel cannot ignore.
//!
//! Most kernel conditions (unknown state name, duplicate listener, exhausted
//! pool) are logged and handled in place. Only broken preconditions surface
//! here.

use thiserror::Error;

/// Errors raised by the behavior kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A freshly constructed pool instance lacks its required capability and
    /// the capability could not be attached.
    #[error("pool `{pool}`: instance is missing required capability `{capability}`")]
    MissingCapability {
        /// Name of the pool that built the instance.
        pool: String,
        /// Type name of the missing capability.
        capability: &'static str,
    },
}

/// Result type for kernel operations.
pub type CoreResult<T> = Result<T, CoreError>;
