//! Integration with a host UI framework.
//!
//! The host knows animators only through [`Animator`]. Its dependency
//! container hands out the animator instance and registers it with the
//! templating engine ([`AnimatorContainer`]); [`configure`] wires the two.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::animator::{CssAnimation, CssAnimator};
use crate::error::Result;
use crate::platform::Platform;

/// Animator contract expected by the host's templating engine.
pub trait Animator {
    type Node;

    fn enter(&self, element: &Self::Node) -> LocalBoxFuture<'static, bool>;

    fn leave(&self, element: &Self::Node) -> LocalBoxFuture<'static, bool>;

    fn add_class(
        &self,
        element: &Self::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> LocalBoxFuture<'static, bool>;

    fn remove_class(
        &self,
        element: &Self::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> LocalBoxFuture<'static, bool>;

    fn animate(&self, element: &Self::Node, class_name: &str) -> LocalBoxFuture<'static, bool>;

    fn run_sequence(&self, animations: Vec<CssAnimation<Self::Node>>) -> LocalBoxFuture<'static, bool>;
}

impl<P: Platform> Animator for CssAnimator<P> {
    type Node = P::Node;

    fn enter(&self, element: &P::Node) -> LocalBoxFuture<'static, bool> {
        CssAnimator::enter(self, element).boxed_local()
    }

    fn leave(&self, element: &P::Node) -> LocalBoxFuture<'static, bool> {
        CssAnimator::leave(self, element).boxed_local()
    }

    fn add_class(
        &self,
        element: &P::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> LocalBoxFuture<'static, bool> {
        CssAnimator::add_class(self, element, class_name, suppress_events).boxed_local()
    }

    fn remove_class(
        &self,
        element: &P::Node,
        class_name: &str,
        suppress_events: bool,
    ) -> LocalBoxFuture<'static, bool> {
        CssAnimator::remove_class(self, element, class_name, suppress_events).boxed_local()
    }

    fn animate(&self, element: &P::Node, class_name: &str) -> LocalBoxFuture<'static, bool> {
        CssAnimator::animate(self, element, class_name).boxed_local()
    }

    fn run_sequence(&self, animations: Vec<CssAnimation<P::Node>>) -> LocalBoxFuture<'static, bool> {
        CssAnimator::run_sequence(self, animations).boxed_local()
    }
}

/// The host's dependency container.
pub trait AnimatorContainer {
    type Animator: Animator + Clone;

    /// Resolve (or construct) the animator instance.
    fn resolve_animator(&self) -> Result<Self::Animator>;

    /// Make `animator` the templating engine's active animator.
    fn register_animator(&self, animator: Self::Animator);
}

/// Resolve the animator from `container`, register it, then hand it to
/// `callback`.
pub fn configure<C, F>(container: &C, callback: Option<F>) -> Result<()>
where
    C: AnimatorContainer,
    F: FnOnce(&C::Animator),
{
    let animator = container.resolve_animator()?;
    container.register_animator(animator.clone());
    if let Some(callback) = callback {
        callback(&animator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessDom, NodeId};
    use rune_config::AnimatorConfig;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Container {
        dom: Rc<HeadlessDom>,
        registered: RefCell<Option<CssAnimator<HeadlessDom>>>,
    }

    impl AnimatorContainer for Container {
        type Animator = CssAnimator<HeadlessDom>;

        fn resolve_animator(&self) -> Result<Self::Animator> {
            let mut config = AnimatorConfig::default();
            config.vendor.probe_event_prefix = false;
            CssAnimator::with_config(Rc::clone(&self.dom), config)
        }

        fn register_animator(&self, animator: Self::Animator) {
            *self.registered.borrow_mut() = Some(animator);
        }
    }

    #[test]
    fn test_configure_registers_and_calls_back() {
        let container = Container {
            dom: Rc::new(HeadlessDom::new()),
            registered: RefCell::new(None),
        };
        let called = Cell::new(false);

        configure(&container, Some(|_: &CssAnimator<HeadlessDom>| called.set(true))).unwrap();

        assert!(called.get());
        assert!(container.registered.borrow().is_some());
    }

    #[test]
    fn test_configure_without_callback() {
        let container = Container {
            dom: Rc::new(HeadlessDom::new()),
            registered: RefCell::new(None),
        };
        configure(&container, None::<fn(&CssAnimator<HeadlessDom>)>).unwrap();
        assert!(container.registered.borrow().is_some());
    }

    #[test]
    fn test_trait_object_surface() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let mut config = AnimatorConfig::default();
        config.vendor.probe_event_prefix = false;
        let animator: Box<dyn Animator<Node = NodeId>> =
            Box::new(CssAnimator::with_config(Rc::clone(&dom), config).unwrap());

        assert_eq!(animator.enter(&el).now_or_never(), Some(false));
        assert_eq!(animator.add_class(&el, "foo", true).now_or_never(), Some(false));
        assert!(dom.dispatched().is_empty());
    }
}
