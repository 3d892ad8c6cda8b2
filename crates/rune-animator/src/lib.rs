//! CSS animation orchestration for DOM lifecycle hooks.
//!
//! This crate bridges framework lifecycle operations (element enter/leave,
//! class add/remove) with native CSS animation events. Each operation toggles
//! classes in a fixed phase order, listens for the engine's animation start
//! and end events, and resolves a `bool` once the animation verifiably played
//! (or was found not to run at all). Lifecycle events such as `enterBegin`
//! and `addClassDone` are dispatched on the document for outside observers.
//!
//! # Features
//!
//! - `web`: [`platform::WebPlatform`], a `web-sys` binding to the real document.
//!   Without it only the in-memory [`HeadlessDom`] is available.

mod animator;
mod error;
mod events;
mod host;
mod instruction;
mod lifecycle;
pub mod platform;
pub mod property;
mod vendor;

pub use animator::{CssAnimation, CssAnimator};
pub use error::{AnimatorError, Result};
pub use events::{AnimatorEvent, Operation, Stage};
pub use host::{Animator, AnimatorContainer, configure};
pub use instruction::{AnimationInstruction, Phase, Predicate, PredicateKey};
pub use lifecycle::{
    Completion, CompletionLatch, LifecycleEngine, LifecycleInput, LifecycleState, Outcome,
};
pub use platform::{HeadlessDom, NodeId, Platform};
pub use vendor::{Vendor, VendorPrefix};

pub use rune_config::AnimatorConfig;
