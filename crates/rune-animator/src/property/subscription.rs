use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::platform::{ListenerId, Platform};

/// A native listener attached through [`FeatureProperty::subscribe`](super::FeatureProperty::subscribe).
///
/// Tracks whether the event fired at least once (`triggered`) and whether the
/// listener is still attached (`bound`). [`dispose`](Self::dispose) may be
/// called any number of times.
pub struct Subscription<P: Platform> {
    platform: Rc<P>,
    element: P::Node,
    event_name: String,
    listener: ListenerId,
    capture: bool,
    flags: Rc<Flags>,
}

#[derive(Default)]
pub(super) struct Flags {
    pub(super) triggered: Cell<bool>,
    pub(super) bound: Cell<bool>,
}

impl<P: Platform> Subscription<P> {
    pub(super) fn new(
        platform: Rc<P>,
        element: P::Node,
        event_name: String,
        listener: ListenerId,
        capture: bool,
        flags: Rc<Flags>,
    ) -> Self {
        flags.bound.set(true);
        Self {
            platform,
            element,
            event_name,
            listener,
            capture,
            flags,
        }
    }

    /// Engine spelling of the subscribed event.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn element(&self) -> &P::Node {
        &self.element
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener
    }

    /// The event fired at least once.
    pub fn triggered(&self) -> bool {
        self.flags.triggered.get()
    }

    /// The listener is still attached.
    pub fn bound(&self) -> bool {
        self.flags.bound.get()
    }

    /// Detach the listener. No-op once unbound.
    pub fn dispose(&self) {
        if !self.flags.bound.replace(false) {
            return;
        }
        trace!(event = %self.event_name, listener = self.listener.0, "disposing subscription");
        self.platform.remove_event_listener(
            &self.element,
            &self.event_name,
            self.listener,
            self.capture,
        );
    }
}

impl<P: Platform> From<&Subscription<P>> for ListenerId {
    fn from(subscription: &Subscription<P>) -> Self {
        subscription.listener
    }
}

impl<P: Platform> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("element", &self.element)
            .field("event_name", &self.event_name)
            .field("listener", &self.listener)
            .field("triggered", &self.triggered())
            .field("bound", &self.bound())
            .finish()
    }
}
