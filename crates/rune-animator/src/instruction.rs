//! Declarative class-toggle tables for lifecycle runs.
//!
//! An [`AnimationInstruction`] lists which classes are added and removed at
//! each [`Phase`] of a run, plus the class predicates the engine checks
//! before running (`canAnimate`) and before scheduling activation
//! (`stagger`). Instructions are immutable once built.

use std::collections::HashMap;
use std::fmt;

use rune_config::ClassConfig;
use tracing::trace;

use crate::events::Operation;
use crate::platform::Platform;

/// Step of a lifecycle run at which classes change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Begin,
    Prepare,
    Start,
    Activate,
    End,
    Done,
    Clean,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Prepare => "prepare",
            Self::Start => "start",
            Self::Activate => "activate",
            Self::End => "end",
            Self::Done => "done",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named class predicate of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKey {
    /// Must pass before a run touches the element.
    CanAnimate,
    /// Opts the element into staggered activation.
    Stagger,
}

/// Class-list test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every class must be present.
    All(Vec<String>),
    /// At least one class must be present.
    Any(Vec<String>),
}

impl Predicate {
    pub fn classes(&self) -> &[String] {
        match self {
            Self::All(classes) | Self::Any(classes) => classes,
        }
    }

    /// Evaluate against an element. An empty class list never matches.
    pub fn matches<P: Platform>(&self, platform: &P, node: &P::Node) -> bool {
        match self {
            Self::All(classes) => {
                !classes.is_empty() && classes.iter().all(|class| platform.has_class(node, class))
            }
            Self::Any(classes) => classes.iter().any(|class| platform.has_class(node, class)),
        }
    }
}

/// Class toggles for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationInstruction {
    operation: Operation,
    add: HashMap<Phase, Vec<String>>,
    remove: HashMap<Phase, Vec<String>>,
    contains: HashMap<PredicateKey, Predicate>,
    suppress_events: bool,
    use_done_classes: bool,
    done_class: Option<String>,
}

impl AnimationInstruction {
    fn new(operation: Operation, suppress_events: bool) -> Self {
        Self {
            operation,
            add: HashMap::new(),
            remove: HashMap::new(),
            contains: HashMap::new(),
            suppress_events,
            use_done_classes: false,
            done_class: None,
        }
    }

    fn adding(mut self, phase: Phase, classes: &[&str]) -> Self {
        self.add.insert(phase, classes.iter().map(|c| c.to_string()).collect());
        self
    }

    fn removing(mut self, phase: Phase, classes: &[&str]) -> Self {
        self.remove.insert(phase, classes.iter().map(|c| c.to_string()).collect());
        self
    }

    fn requiring(mut self, key: PredicateKey, predicate: Predicate) -> Self {
        self.contains.insert(key, predicate);
        self
    }

    /// Enter/leave table: `au-enter` at prepare, `au-enter-active` at
    /// activate, both removed at end and clean.
    pub fn animate(operation: Operation, classes: &ClassConfig) -> Self {
        let name = operation.as_str();
        let class_name = format!("{}{}", classes.prefix, name);
        let active = format!("{class_name}-active");
        let done_class = match operation {
            Operation::Enter => Some(classes.entered.clone()),
            Operation::Leave => Some(classes.left.clone()),
            _ => None,
        };

        let mut instruction = Self::new(operation, false)
            .adding(Phase::Prepare, &[class_name.as_str()])
            .adding(Phase::Activate, &[active.as_str()])
            .removing(Phase::End, &[active.as_str(), class_name.as_str()])
            .removing(Phase::Clean, &[active.as_str(), class_name.as_str()])
            .requiring(
                PredicateKey::CanAnimate,
                Predicate::All(vec![classes.trigger.clone()]),
            )
            .requiring(
                PredicateKey::Stagger,
                Predicate::Any(vec![classes.stagger_class(), classes.stagger_class_for(name)]),
            );
        instruction.use_done_classes = true;
        instruction.done_class = done_class;
        instruction
    }

    /// `class_name` lands at end; `class_name-add` drives the animation.
    pub fn add_class(class_name: &str, suppress_events: bool) -> Self {
        let add = format!("{class_name}-add");
        Self::new(Operation::AddClass, suppress_events)
            .adding(Phase::End, &[class_name])
            .adding(Phase::Activate, &[add.as_str()])
            .removing(Phase::End, &[add.as_str()])
            .removing(Phase::Clean, &[add.as_str(), class_name])
    }

    /// `class_name-remove` drives the animation; only runs while the class
    /// (or its `-add` helper) is present.
    pub fn remove_class(class_name: &str, suppress_events: bool) -> Self {
        let add = format!("{class_name}-add");
        let remove = format!("{class_name}-remove");
        Self::new(Operation::RemoveClass, suppress_events)
            .adding(Phase::Start, &[class_name])
            .adding(Phase::End, &[class_name])
            .adding(Phase::Activate, &[remove.as_str()])
            .removing(Phase::Clean, &[remove.as_str(), class_name])
            .requiring(
                PredicateKey::CanAnimate,
                Predicate::Any(vec![class_name.to_string(), add]),
            )
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn suppress_events(&self) -> bool {
        self.suppress_events
    }

    pub fn use_done_classes(&self) -> bool {
        self.use_done_classes
    }

    /// Marker left after a completed run (`au-entered`).
    pub fn done_class(&self) -> Option<&str> {
        self.done_class.as_deref()
    }

    pub fn added_at(&self, phase: Phase) -> &[String] {
        self.add.get(&phase).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn removed_at(&self, phase: Phase) -> &[String] {
        self.remove.get(&phase).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn predicate(&self, key: PredicateKey) -> Option<&Predicate> {
        self.contains.get(&key)
    }

    /// Apply the add-set, then the remove-set, of `phase`.
    pub fn change_class<P: Platform>(&self, platform: &P, node: &P::Node, phase: Phase) {
        let added = self.added_at(phase);
        let removed = self.removed_at(phase);
        if added.is_empty() && removed.is_empty() {
            return;
        }
        trace!(operation = %self.operation, %phase, ?added, ?removed, "changing classes");
        if !added.is_empty() {
            platform.add_classes(node, added);
        }
        if !removed.is_empty() {
            platform.remove_classes(node, removed);
        }
    }

    /// Evaluate the predicate under `key`; undeclared predicates fail.
    pub fn contains_class<P: Platform>(&self, platform: &P, node: &P::Node, key: PredicateKey) -> bool {
        self.predicate(key)
            .is_some_and(|predicate| predicate.matches(platform, node))
    }
}
