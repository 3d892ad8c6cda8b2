//! DOM capability consumed by the animator.
//!
//! Everything the animator needs from a browser-like environment goes
//! through [`Platform`]: element creation, class lists, inline and computed
//! style, stylesheet enumeration, native event listeners, custom event
//! dispatch and timers. [`HeadlessDom`] implements it in memory; the `web`
//! feature adds a `web-sys` implementation bound to the real document.

pub mod headless;
#[cfg(feature = "web")]
pub mod web;

pub use headless::{DispatchedEvent, FiredEvent, HeadlessDom, NodeId};
#[cfg(feature = "web")]
pub use web::WebPlatform;

use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// `CSSRule.STYLE_RULE`
pub const STYLE_RULE: u16 = 1;
/// `CSSRule.KEYFRAMES_RULE`
pub const KEYFRAMES_RULE: u16 = 7;

/// Identifies a native listener registered through [`Platform::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A native event as seen by a listener.
pub trait NativeEvent {
    /// Native event type, e.g. `webkitAnimationStart`.
    fn event_type(&self) -> String;
    /// Keep the event from reaching ancestors of the current target.
    fn stop_propagation(&self);
}

/// Callback invoked for native events.
pub type NativeListener = Rc<dyn Fn(&dyn NativeEvent)>;

/// One rule of a stylesheet, reduced to what the keyframes inspector reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    /// Numeric `CSSRule.type`.
    pub rule_type: u16,
    /// Rule name, present for `@keyframes` rules.
    pub name: Option<String>,
}

impl CssRule {
    /// An `@keyframes <name>` rule.
    pub fn keyframes(name: impl Into<String>) -> Self {
        Self {
            rule_type: KEYFRAMES_RULE,
            name: Some(name.into()),
        }
    }

    /// A plain style rule.
    pub fn style() -> Self {
        Self {
            rule_type: STYLE_RULE,
            name: None,
        }
    }
}

/// A loaded stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    /// Rules in document order.
    pub rules: Vec<CssRule>,
}

impl StyleSheet {
    /// Sheet holding the given rules.
    pub fn new(rules: Vec<CssRule>) -> Self {
        Self { rules }
    }
}

/// Browser-like environment the animator runs against.
///
/// All calls happen on one thread; listener and timer callbacks are invoked
/// later by the platform's own event loop.
pub trait Platform: 'static {
    /// Handle to an element.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Result<Self::Node>;
    /// Append a node to the document head.
    fn append_to_head(&self, node: &Self::Node) -> Result<()>;
    /// Append a node to the document body.
    fn append_to_body(&self, node: &Self::Node) -> Result<()>;
    /// Detach a node from its parent.
    fn remove_node(&self, node: &Self::Node);
    /// Replace the text content of a node.
    fn set_text_content(&self, node: &Self::Node, text: &str);
    /// Append to the text content of a node.
    fn append_text_content(&self, node: &Self::Node, text: &str);
    /// Set an attribute.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Add classes to the element's class list.
    fn add_classes(&self, node: &Self::Node, classes: &[String]);
    /// Remove classes from the element's class list.
    fn remove_classes(&self, node: &Self::Node, classes: &[String]);
    /// Whether the element's class list contains `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Parent element, if attached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Position among the parent's child nodes.
    fn child_index(&self, node: &Self::Node) -> Option<usize>;

    /// Whether the element's style object knows the DOM property `dom_name`.
    fn supports_style_property(&self, node: &Self::Node, dom_name: &str) -> bool;
    /// Write an inline style property by its DOM name.
    fn set_style_property(&self, node: &Self::Node, dom_name: &str, value: &str);
    /// Read a computed style value by its CSS name; empty when unset.
    fn computed_style_value(&self, node: &Self::Node, css_name: &str) -> String;

    /// All stylesheets currently loaded in the document.
    fn style_sheets(&self) -> Vec<StyleSheet>;
    /// Rule type reported for `@keyframes` rules.
    fn keyframes_rule_type(&self) -> u16 {
        KEYFRAMES_RULE
    }

    /// Attach a native listener.
    fn add_event_listener(
        &self,
        node: &Self::Node,
        event_type: &str,
        listener: NativeListener,
        capture: bool,
    ) -> ListenerId;
    /// Detach a native listener; unknown ids are ignored.
    fn remove_event_listener(
        &self,
        node: &Self::Node,
        event_type: &str,
        listener: ListenerId,
        capture: bool,
    );

    /// Dispatch a bubbling, cancelable custom event with an element detail.
    fn dispatch_custom_event(&self, name: &str, detail: Option<&Self::Node>);

    /// Run `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: f64, callback: Box<dyn FnOnce()>);
}
