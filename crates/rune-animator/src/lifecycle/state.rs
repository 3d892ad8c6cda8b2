//! Lifecycle states and their transition table.

use crate::error::{AnimatorError, Result};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A native start/end pair completed.
    Animated,
    /// The guard predicate failed; nothing was touched.
    Skipped,
    /// No animation was running after activation.
    TimedOut,
}

impl Outcome {
    /// Value the completion resolves with.
    pub fn resolved_value(&self) -> bool {
        matches!(self, Self::Animated)
    }
}

/// Where a lifecycle run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Created, guard not evaluated yet.
    #[default]
    Idle,
    /// Guard passed, begin classes applied.
    Begun,
    /// Prepare classes applied, animation-name baseline captured.
    Prepared,
    /// Native listeners attached, activation pending.
    Bound { started: bool },
    /// Activated with animations present, waiting for the native end event.
    Running { started: bool },
    /// Completion resolved. Absorbs every further input.
    Finished(Outcome),
}

/// Something that happened to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleInput {
    GuardPassed,
    GuardFailed,
    Prepared,
    ListenersBound,
    NativeStart,
    NativeEnd,
    Activated { animations_present: bool },
}

impl LifecycleState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Whether the native start event fired for this run.
    pub fn started(&self) -> bool {
        matches!(
            self,
            Self::Bound { started: true } | Self::Running { started: true }
        )
    }

    /// Next state for `input`.
    ///
    /// A native end before any start leaves the state unchanged: the run keeps
    /// waiting on whichever resolution path is still live.
    pub fn transition(self, input: LifecycleInput) -> Result<Self> {
        use LifecycleInput as In;
        use LifecycleState as St;

        let next = match (self, input) {
            (St::Finished(outcome), _) => St::Finished(outcome),

            (St::Idle, In::GuardPassed) => St::Begun,
            (St::Idle, In::GuardFailed) => St::Finished(Outcome::Skipped),
            (St::Begun, In::Prepared) => St::Prepared,
            (St::Prepared, In::ListenersBound) => St::Bound { started: false },

            (St::Bound { .. }, In::NativeStart) => St::Bound { started: true },
            (St::Running { .. }, In::NativeStart) => St::Running { started: true },

            (St::Bound { started: true }, In::NativeEnd)
            | (St::Running { started: true }, In::NativeEnd) => St::Finished(Outcome::Animated),
            (St::Bound { started: false }, In::NativeEnd) => St::Bound { started: false },
            (St::Running { started: false }, In::NativeEnd) => St::Running { started: false },

            (St::Bound { .. }, In::Activated { animations_present: false }) => {
                St::Finished(Outcome::TimedOut)
            }
            (St::Bound { started }, In::Activated { animations_present: true }) => {
                St::Running { started }
            }

            (from, input) => return Err(AnimatorError::InvalidTransition { from, input }),
        };
        Ok(next)
    }
}
