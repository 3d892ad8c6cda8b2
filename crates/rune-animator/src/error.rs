//! Error types for the animator.

use thiserror::Error;

use crate::events::Operation;
use crate::lifecycle::{LifecycleInput, LifecycleState};

/// Result type for animator operations.
pub type Result<T> = std::result::Result<T, AnimatorError>;

/// Errors that can occur inside the animator.
///
/// None of these reach callers of the animator facade: every public
/// operation resolves to a plain `bool`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimatorError {
    /// A DOM capability failed.
    #[error("platform operation failed: {0}")]
    Platform(String),

    /// A lifecycle input arrived in a state that has no transition for it.
    #[error("invalid lifecycle transition from {from:?} on {input:?}")]
    InvalidTransition {
        /// State the run was in.
        from: LifecycleState,
        /// Input that was rejected.
        input: LifecycleInput,
    },

    /// The run was dropped before its completion latch resolved.
    #[error("{0} lifecycle run dropped before it resolved")]
    Abandoned(Operation),
}
