//! Custom DOM events dispatched around animator operations.
//!
//! Every event name is `<operation><Stage>`, e.g. `enterBegin`,
//! `removeClassTimeout`, `sequenceDone`. Events bubble, are cancelable and
//! carry the affected element (or nothing, for sequences) as their detail.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Animator operation that owns a lifecycle run or an event group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Element insertion.
    Enter,
    /// Element removal.
    Leave,
    /// Class addition.
    AddClass,
    /// Class removal.
    RemoveClass,
    /// Add-then-remove class cycle.
    Animate,
    /// Ordered chain of animate calls.
    Sequence,
}

impl Operation {
    /// Operations that run through the lifecycle engine.
    pub const LIFECYCLE: [Operation; 4] = [
        Operation::Enter,
        Operation::Leave,
        Operation::AddClass,
        Operation::RemoveClass,
    ];

    /// Name used in event names and class names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Leave => "leave",
            Self::AddClass => "addClass",
            Self::RemoveClass => "removeClass",
            Self::Animate => "animate",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of an operation announced to external observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The operation started touching the element.
    Begin,
    /// The native animation started.
    Active,
    /// The native animation finished.
    Done,
    /// No animation ran.
    Timeout,
}

impl Stage {
    const ALL: [Stage; 4] = [Stage::Begin, Stage::Active, Stage::Done, Stage::Timeout];

    /// Suffix appended to the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::Active => "Active",
            Self::Done => "Done",
            Self::Timeout => "Timeout",
        }
    }
}

/// A named animator event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimatorEvent {
    /// Owning operation.
    pub operation: Operation,
    /// Announced stage.
    pub stage: Stage,
}

impl AnimatorEvent {
    /// `sequenceBegin`
    pub const SEQUENCE_BEGIN: Self = Self::new(Operation::Sequence, Stage::Begin);
    /// `sequenceDone`
    pub const SEQUENCE_DONE: Self = Self::new(Operation::Sequence, Stage::Done);

    /// Create an event for an operation stage.
    pub const fn new(operation: Operation, stage: Stage) -> Self {
        Self { operation, stage }
    }

    /// DOM event name, e.g. `addClassActive`.
    pub fn name(&self) -> String {
        format!("{}{}", self.operation.as_str(), self.stage.as_str())
    }

    /// Parse a DOM event name back into an event.
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().find(|event| event.name() == name)
    }

    /// Every event the animator may dispatch.
    pub fn all() -> impl Iterator<Item = Self> {
        let per_operation = [
            Operation::Enter,
            Operation::Leave,
            Operation::AddClass,
            Operation::RemoveClass,
            Operation::Animate,
        ]
        .into_iter()
        .flat_map(|op| Stage::ALL.into_iter().map(move |stage| Self::new(op, stage)));
        per_operation.chain([Self::SEQUENCE_BEGIN, Self::SEQUENCE_DONE])
    }
}

impl fmt::Display for AnimatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operation.as_str(), self.stage.as_str())
    }
}
