//! The animator facade.
//!
//! [`CssAnimator`] is the public operation surface. It owns the
//! [`PropertyRegistry`], the [`LifecycleEngine`] and the instruction caches,
//! and turns lifecycle completions into plain `bool` results.
//!
//! Every operation starts its run when called: classes up to activation are
//! applied and listeners attached before the future is returned. The future
//! only waits for the outcome.
//!
//! # Usage
//!
//! ```ignore
//! let dom = Rc::new(HeadlessDom::new());
//! let animator = CssAnimator::new(Rc::clone(&dom))?;
//! let entered = animator.enter(&element);
//! dom.complete_animations();
//! assert!(entered.now_or_never() == Some(true));
//! ```

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::join_all;
use rune_config::AnimatorConfig;
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::{AnimatorEvent, Operation, Stage};
use crate::instruction::AnimationInstruction;
use crate::lifecycle::{Completion, LifecycleEngine};
use crate::platform::Platform;
use crate::property::PropertyRegistry;

/// One step of [`CssAnimator::run_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct CssAnimation<N> {
    pub element: N,
    pub class_name: String,
}

impl<N> CssAnimation<N> {
    pub fn new(element: N, class_name: impl Into<String>) -> Self {
        Self {
            element,
            class_name: class_name.into(),
        }
    }
}

type InstructionCache = RefCell<HashMap<(String, bool), Rc<AnimationInstruction>>>;

struct Inner<P: Platform> {
    platform: Rc<P>,
    config: Rc<AnimatorConfig>,
    registry: Rc<PropertyRegistry<P>>,
    engine: LifecycleEngine<P>,
    enter: OnceCell<Rc<AnimationInstruction>>,
    leave: OnceCell<Rc<AnimationInstruction>>,
    add_class: InstructionCache,
    remove_class: InstructionCache,
}

/// CSS animation animator bound to one platform.
///
/// Cloning is cheap and clones share caches and state.
pub struct CssAnimator<P: Platform> {
    inner: Rc<Inner<P>>,
}

impl<P: Platform> Clone for CssAnimator<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Platform> CssAnimator<P> {
    /// Create an animator with the default configuration.
    pub fn new(platform: Rc<P>) -> Result<Self> {
        Self::with_config(platform, AnimatorConfig::default())
    }

    /// Create an animator. Detects the vendor prefix and, if configured,
    /// starts the animation event prefix probe.
    pub fn with_config(platform: Rc<P>, config: AnimatorConfig) -> Result<Self> {
        let registry = Rc::new(PropertyRegistry::new(Rc::clone(&platform), &config.vendor)?);
        let config = Rc::new(config);
        let engine = LifecycleEngine::new(Rc::clone(&registry), Rc::clone(&config));
        debug!(prefix = %registry.prefix(), "animator ready");

        Ok(Self {
            inner: Rc::new(Inner {
                platform,
                config,
                registry,
                engine,
                enter: OnceCell::new(),
                leave: OnceCell::new(),
                add_class: RefCell::new(HashMap::new()),
                remove_class: RefCell::new(HashMap::new()),
            }),
        })
    }

    pub fn platform(&self) -> &Rc<P> {
        &self.inner.platform
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &PropertyRegistry<P> {
        &self.inner.registry
    }

    /// Whether a native animation started and has not completed yet.
    pub fn is_animating(&self) -> bool {
        self.inner.engine.is_animating()
    }

    /// Shared `enter` instruction, built on first use.
    pub fn enter_instruction(&self) -> Rc<AnimationInstruction> {
        Rc::clone(self.inner.enter.get_or_init(|| {
            Rc::new(AnimationInstruction::animate(Operation::Enter, &self.inner.config.classes))
        }))
    }

    /// Shared `leave` instruction, built on first use.
    pub fn leave_instruction(&self) -> Rc<AnimationInstruction> {
        Rc::clone(self.inner.leave.get_or_init(|| {
            Rc::new(AnimationInstruction::animate(Operation::Leave, &self.inner.config.classes))
        }))
    }

    /// Cached `addClass` instruction for `class_name`.
    pub fn add_class_instruction(&self, class_name: &str, suppress_events: bool) -> Rc<AnimationInstruction> {
        cached(&self.inner.add_class, class_name, suppress_events, AnimationInstruction::add_class)
    }

    /// Cached `removeClass` instruction for `class_name`.
    pub fn remove_class_instruction(&self, class_name: &str, suppress_events: bool) -> Rc<AnimationInstruction> {
        cached(&self.inner.remove_class, class_name, suppress_events, AnimationInstruction::remove_class)
    }

    /// Run the enter animation. Resolves `true` once it played.
    pub fn enter(&self, element: &P::Node) -> impl Future<Output = bool> + use<P> {
        settle(self.inner.engine.run(element, self.enter_instruction()))
    }

    /// Run the leave animation. Resolves `true` once it played.
    pub fn leave(&self, element: &P::Node) -> impl Future<Output = bool> + use<P> {
        settle(self.inner.engine.run(element, self.leave_instruction()))
    }

    /// Add `class_name` through its `-add` animation.
    pub fn add_class(
        &self,
        element: &P::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> impl Future<Output = bool> + use<P> {
        settle(self.start_add_class(element, class_name, suppress_events))
    }

    /// Remove `class_name` through its `-remove` animation.
    pub fn remove_class(
        &self,
        element: &P::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> impl Future<Output = bool> + use<P> {
        settle(self.start_remove_class(element, class_name, suppress_events))
    }

    fn start_add_class(&self, element: &P::Node, class_name: &str, suppress_events: bool) -> Completion {
        let instruction = self.add_class_instruction(class_name, suppress_events);
        self.inner.engine.run(element, instruction)
    }

    fn start_remove_class(&self, element: &P::Node, class_name: &str, suppress_events: bool) -> Completion {
        let instruction = self.remove_class_instruction(class_name, suppress_events);
        self.inner.engine.run(element, instruction)
    }

    fn dispatch(&self, stage: Stage, element: &P::Node) {
        let event = AnimatorEvent::new(Operation::Animate, stage);
        self.inner
            .platform
            .dispatch_custom_event(&event.name(), Some(element));
    }

    /// Add then remove `class_name`, announcing the pair with `animate*`
    /// events. Resolves `true` when the add stage animated and the remove
    /// stage ran.
    pub fn animate(&self, element: &P::Node, class_name: &str) -> impl Future<Output = bool> + use<P> {
        let animator = self.clone();
        let element = element.clone();
        let class_name = class_name.to_string();

        self.dispatch(Stage::Begin, &element);
        let added = self.start_add_class(&element, &class_name, true);

        async move {
            let added = match added.await {
                Ok(added) => added,
                Err(err) => {
                    warn!(%err, %class_name, "add stage failed");
                    animator.dispatch(Stage::Timeout, &element);
                    return false;
                }
            };

            animator.dispatch(Stage::Active, &element);
            if !added {
                return false;
            }

            match animator.start_remove_class(&element, &class_name, true).await {
                Ok(_) => {
                    animator.dispatch(Stage::Done, &element);
                    true
                }
                Err(err) => {
                    warn!(%err, %class_name, "remove stage failed");
                    animator.dispatch(Stage::Timeout, &element);
                    false
                }
            }
        }
    }

    /// [`animate`](Self::animate) every element independently.
    pub fn animate_all(
        &self,
        elements: &[P::Node],
        class_name: &str,
    ) -> impl Future<Output = Vec<bool>> + use<P> {
        join_all(
            elements
                .iter()
                .map(|element| self.animate(element, class_name))
                .collect::<Vec<_>>(),
        )
    }

    /// Animate each step after the previous one settled, between
    /// `sequenceBegin` and `sequenceDone`.
    pub fn run_sequence(
        &self,
        animations: Vec<CssAnimation<P::Node>>,
    ) -> impl Future<Output = bool> + use<P> {
        self.inner
            .platform
            .dispatch_custom_event(&AnimatorEvent::SEQUENCE_BEGIN.name(), None);
        let animator = self.clone();

        async move {
            for step in &animations {
                let played = animator.animate(&step.element, &step.class_name).await;
                debug!(class_name = %step.class_name, played, "sequence step settled");
            }
            animator
                .inner
                .platform
                .dispatch_custom_event(&AnimatorEvent::SEQUENCE_DONE.name(), None);
            true
        }
    }
}

fn cached(
    cache: &InstructionCache,
    class_name: &str,
    suppress_events: bool,
    build: fn(&str, bool) -> AnimationInstruction,
) -> Rc<AnimationInstruction> {
    let key = (class_name.to_string(), suppress_events);
    Rc::clone(
        cache
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| Rc::new(build(class_name, suppress_events))),
    )
}

async fn settle(completion: Completion) -> bool {
    let operation = completion.operation();
    match completion.await {
        Ok(value) => value,
        Err(err) => {
            warn!(%operation, %err, "lifecycle run did not resolve");
            false
        }
    }
}
