//! Lifecycle engine: drives one [`AnimationInstruction`] against one element.
//!
//! A run walks guard → begin → prepare → bind → activate synchronously when
//! it is started. From there two paths race to resolve its
//! [`CompletionLatch`]:
//!
//! - the native `end` event after a native `start` resolves `true`;
//! - activation (immediate, or after the stagger delay) finding no running
//!   animation cleans up and resolves `false`.
//!
//! Every input goes through the [`LifecycleState`] transition table. Reaching
//! a finished state resolves the latch once and detaches whatever listeners
//! are still bound, so a late native event can never resolve a run twice.

mod latch;
mod state;

pub use latch::{Completion, CompletionLatch};
pub use state::{LifecycleInput, LifecycleState, Outcome};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rune_config::AnimatorConfig;
use tracing::{debug, trace, warn};

use crate::events::{AnimatorEvent, Stage};
use crate::instruction::{AnimationInstruction, Phase, PredicateKey};
use crate::platform::{NativeEvent, Platform};
use crate::property::{FeatureEvent, FeatureProperty, PropertyRegistry, Subscription};

/// Starts lifecycle runs for one animator.
pub struct LifecycleEngine<P: Platform> {
    registry: Rc<PropertyRegistry<P>>,
    config: Rc<AnimatorConfig>,
    animating: Rc<Cell<bool>>,
}

impl<P: Platform> LifecycleEngine<P> {
    pub fn new(registry: Rc<PropertyRegistry<P>>, config: Rc<AnimatorConfig>) -> Self {
        Self {
            registry,
            config,
            animating: Rc::new(Cell::new(false)),
        }
    }

    /// Set when a native start event fires, cleared when a run completes.
    pub fn is_animating(&self) -> bool {
        self.animating.get()
    }

    /// Run `instruction` against `element`.
    ///
    /// Class changes up to activation happen before this returns; the
    /// returned completion resolves once either path settles the run.
    pub fn run(&self, element: &P::Node, instruction: Rc<AnimationInstruction>) -> Completion {
        let (latch, completion) = CompletionLatch::new(instruction.operation());
        let run = Rc::new(LifecycleRun {
            registry: Rc::clone(&self.registry),
            config: Rc::clone(&self.config),
            animating: Rc::clone(&self.animating),
            element: element.clone(),
            instruction,
            state: Cell::new(LifecycleState::Idle),
            latch,
            prev_names: RefCell::new(Vec::new()),
            start: RefCell::new(None),
            end: RefCell::new(None),
        });
        run.begin();
        completion
    }
}

/// State of one run, shared by its native listeners and activation timer.
struct LifecycleRun<P: Platform> {
    registry: Rc<PropertyRegistry<P>>,
    config: Rc<AnimatorConfig>,
    animating: Rc<Cell<bool>>,
    element: P::Node,
    instruction: Rc<AnimationInstruction>,
    state: Cell<LifecycleState>,
    latch: CompletionLatch,
    prev_names: RefCell<Vec<String>>,
    start: RefCell<Option<Subscription<P>>>,
    end: RefCell<Option<Subscription<P>>>,
}

impl<P: Platform> LifecycleRun<P> {
    fn platform(&self) -> &P {
        self.registry.platform()
    }

    fn animation(&self) -> &FeatureProperty<P> {
        self.registry.animation()
    }

    fn advance(&self, input: LifecycleInput) {
        let from = self.state.get();
        match from.transition(input) {
            Ok(next) => {
                self.state.set(next);
                trace!(operation = %self.instruction.operation(), ?from, ?input, ?next, "transition");
                if let LifecycleState::Finished(outcome) = next
                    && !from.is_finished()
                {
                    self.settle(outcome);
                }
            }
            Err(err) => warn!(operation = %self.instruction.operation(), %err, "ignoring lifecycle input"),
        }
    }

    fn settle(&self, outcome: Outcome) {
        self.dispose_subscriptions();
        debug!(operation = %self.instruction.operation(), ?outcome, element = ?self.element, "run finished");
        self.latch.resolve(outcome.resolved_value());
    }

    fn dispose_subscriptions(&self) {
        for slot in [&self.start, &self.end] {
            if let Some(subscription) = slot.borrow().as_ref() {
                subscription.dispose();
            }
        }
    }

    fn dispatch(&self, stage: Stage) {
        if self.instruction.suppress_events() {
            return;
        }
        let event = AnimatorEvent::new(self.instruction.operation(), stage);
        self.platform()
            .dispatch_custom_event(&event.name(), Some(&self.element));
    }

    fn change(&self, phase: Phase) {
        self.instruction.change_class(self.platform(), &self.element, phase);
    }

    fn done_classes_enabled(&self) -> bool {
        self.instruction.use_done_classes() && self.config.lifecycle.use_done_classes
    }

    fn begin(self: &Rc<Self>) {
        let platform = self.platform();
        let guard_passed = self
            .instruction
            .predicate(PredicateKey::CanAnimate)
            .is_none_or(|predicate| predicate.matches(platform, &self.element));
        if !guard_passed {
            trace!(operation = %self.instruction.operation(), element = ?self.element, "guard rejected run");
            self.advance(LifecycleInput::GuardFailed);
            return;
        }
        self.advance(LifecycleInput::GuardPassed);

        self.dispatch(Stage::Begin);
        self.change(Phase::Begin);
        if self.done_classes_enabled() {
            let classes = &self.config.classes;
            platform.remove_classes(&self.element, &[classes.entered.clone(), classes.left.clone()]);
        }

        self.change(Phase::Prepare);
        *self.prev_names.borrow_mut() = self.animation().get_names(&self.element).unwrap_or_default();
        self.advance(LifecycleInput::Prepared);

        self.bind();
        self.advance(LifecycleInput::ListenersBound);

        self.schedule_activation();
    }

    fn bind(self: &Rc<Self>) {
        let run = Rc::clone(self);
        let start = self.animation().subscribe(
            &self.element,
            FeatureEvent::Start.alias(),
            move |event| run.on_start(event),
            false,
        );
        *self.start.borrow_mut() = Some(start);

        let run = Rc::clone(self);
        let end = self.animation().subscribe(
            &self.element,
            FeatureEvent::End.alias(),
            move |event| run.on_end(event),
            false,
        );
        *self.end.borrow_mut() = Some(end);
    }

    fn on_start(&self, event: &dyn NativeEvent) {
        if self.state.get().is_finished() {
            return;
        }
        self.animating.set(true);
        self.dispatch(Stage::Active);
        // keep ancestors running their own lifecycle from seeing this start
        event.stop_propagation();
        self.change(Phase::Start);
        if let Some(start) = self.start.borrow().as_ref() {
            start.dispose();
        }
        self.advance(LifecycleInput::NativeStart);
    }

    fn on_end(&self, event: &dyn NativeEvent) {
        if self.state.get().is_finished() {
            return;
        }
        let started = self
            .start
            .borrow()
            .as_ref()
            .is_some_and(Subscription::triggered);
        if !started {
            debug!(operation = %self.instruction.operation(), element = ?self.element, "end before start; detaching listeners");
            self.dispose_subscriptions();
            self.advance(LifecycleInput::NativeEnd);
            return;
        }

        event.stop_propagation();
        self.change(Phase::End);
        if let Some(end) = self.end.borrow().as_ref() {
            end.dispose();
        }

        self.change(Phase::Done);
        if self.done_classes_enabled()
            && let Some(done_class) = self.instruction.done_class()
        {
            self.platform()
                .add_classes(&self.element, &[done_class.to_string()]);
        }
        self.animating.set(false);
        self.dispatch(Stage::Done);
        self.advance(LifecycleInput::NativeEnd);
    }

    fn schedule_activation(self: &Rc<Self>) {
        let platform = self.platform();
        let staggered = platform.parent(&self.element).is_some()
            && self
                .instruction
                .contains_class(platform, &self.element, PredicateKey::Stagger);

        let delay = if staggered {
            let position = platform.child_index(&self.element).unwrap_or(0);
            self.animation().get_delay(&self.element) * position as f64
        } else {
            0.0
        };

        if delay > 0.0 {
            trace!(operation = %self.instruction.operation(), delay, "staggering activation");
            let run = Rc::clone(self);
            platform.set_timeout(delay, Box::new(move || run.activate()));
        } else {
            self.activate();
        }
    }

    fn activate(&self) {
        if self.state.get().is_finished() {
            trace!(operation = %self.instruction.operation(), "run finished before activation");
            return;
        }
        self.change(Phase::Activate);
        self.cleanup();
    }

    fn cleanup(&self) {
        let names = self.animation().get_names(&self.element).unwrap_or_default();
        let animations_present = if self.config.lifecycle.strict_keyframe_check {
            self.animation_change_with_valid_keyframe(&names)
        } else {
            !names.is_empty()
        };

        if !animations_present {
            self.change(Phase::Clean);
            self.dispatch(Stage::Timeout);
        }
        self.advance(LifecycleInput::Activated { animations_present });
    }

    /// A name appeared since prepare and, if verification is on, has a
    /// matching `@keyframes` rule.
    fn animation_change_with_valid_keyframe(&self, names: &[String]) -> bool {
        let prev = self.prev_names.borrow();
        let new_names: Vec<String> = names
            .iter()
            .filter(|name| !prev.contains(name))
            .cloned()
            .collect();

        if new_names.is_empty() {
            false
        } else if !self.config.lifecycle.verify_keyframes_exist {
            true
        } else {
            self.registry
                .keyframes()
                .get_keyframe_by_animation_names(&new_names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Operation;
    use crate::platform::HeadlessDom;
    use futures::FutureExt;
    use rune_config::ClassConfig;

    fn engine(dom: &Rc<HeadlessDom>, config: AnimatorConfig) -> LifecycleEngine<HeadlessDom> {
        let mut config = config;
        config.vendor.probe_event_prefix = false;
        let registry = PropertyRegistry::new(Rc::clone(dom), &config.vendor).unwrap();
        LifecycleEngine::new(Rc::new(registry), Rc::new(config))
    }

    fn enter() -> Rc<AnimationInstruction> {
        Rc::new(AnimationInstruction::animate(Operation::Enter, &ClassConfig::default()))
    }

    #[test]
    fn test_guard_rejects_without_side_effects() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let engine = engine(&dom, AnimatorConfig::default());

        let completion = engine.run(&el, enter());
        assert_eq!(completion.now_or_never(), Some(Ok(false)));
        assert!(dom.classes(el).is_empty());
        assert!(dom.dispatched().is_empty());
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_timeout_when_nothing_animates() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.set_classes(el, &["au-animate", "au-left"]);
        let engine = engine(&dom, AnimatorConfig::default());

        let completion = engine.run(&el, enter());
        assert_eq!(completion.now_or_never(), Some(Ok(false)));
        assert_eq!(dom.classes(el), vec!["au-animate".to_string()]);
        assert_eq!(dom.dispatched_names(), vec!["enterBegin", "enterTimeout"]);
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_native_pair_resolves_true() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.set_classes(el, &["au-animate"]);
        dom.define_class_style("au-enter-active", "animation-name", "fade-in");
        let engine = engine(&dom, AnimatorConfig::default());

        let mut completion = engine.run(&el, enter());
        assert!((&mut completion).now_or_never().is_none());
        assert_eq!(dom.listener_count(el, "animationstart"), 1);

        dom.fire(el, "animationstart");
        assert!(engine.is_animating());
        dom.fire(el, "animationend");

        assert_eq!(completion.now_or_never(), Some(Ok(true)));
        assert!(!engine.is_animating());
        assert_eq!(dom.classes(el), vec!["au-animate".to_string(), "au-entered".to_string()]);
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_stray_end_detaches_and_abandons() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.set_classes(el, &["au-animate"]);
        dom.define_class_style("au-enter-active", "animation-name", "fade-in");
        let engine = engine(&dom, AnimatorConfig::default());

        let completion = engine.run(&el, enter());
        dom.fire(el, "animationend");

        assert_eq!(dom.total_listeners(), 0);
        assert_eq!(
            completion.now_or_never(),
            Some(Err(crate::error::AnimatorError::Abandoned(Operation::Enter)))
        );
        assert_eq!(dom.dispatched_names(), vec!["enterBegin"]);
    }

    #[test]
    fn test_done_classes_disabled() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.set_classes(el, &["au-animate", "au-left"]);
        dom.define_class_style("au-enter", "animation-name", "fade-in");
        let mut config = AnimatorConfig::default();
        config.lifecycle.use_done_classes = false;
        let engine = engine(&dom, config);

        let completion = engine.run(&el, enter());
        dom.complete_animations();

        assert_eq!(completion.now_or_never(), Some(Ok(true)));
        assert_eq!(dom.classes(el), vec!["au-animate".to_string(), "au-left".to_string()]);
    }

    #[test]
    fn test_strict_mode_requires_new_keyframed_name() {
        use crate::platform::{CssRule, StyleSheet};

        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.set_classes(el, &["au-animate", "spinning"]);
        // already running before the run starts
        dom.define_class_style("spinning", "animation-name", "spin");
        let mut config = AnimatorConfig::default();
        config.lifecycle.strict_keyframe_check = true;
        let engine = engine(&dom, config);

        let completion = engine.run(&el, enter());
        assert_eq!(completion.now_or_never(), Some(Ok(false)));

        dom.define_class_style("au-enter-active", "animation-name", "spin, fade-in");
        let mut completion = engine.run(&el, enter());
        // fade-in is new but has no keyframes rule
        assert_eq!((&mut completion).now_or_never(), Some(Ok(false)));

        dom.add_style_sheet(StyleSheet::new(vec![CssRule::keyframes("fade-in")]));
        let mut completion = engine.run(&el, enter());
        assert!((&mut completion).now_or_never().is_none());
        dom.complete_animations();
        assert_eq!(completion.now_or_never(), Some(Ok(true)));
    }
}
