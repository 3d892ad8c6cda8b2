//! In-memory DOM implementing [`Platform`].
//!
//! Computed styles come from per-class declarations registered with
//! [`HeadlessDom::define_class_style`] plus inline styles, timers run on a
//! virtual clock driven by [`HeadlessDom::advance`], and native events are
//! fired explicitly with [`HeadlessDom::fire`] (or in bulk with
//! [`HeadlessDom::complete_animations`]). Dispatched custom events are kept in
//! a log for inspection.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use super::{ListenerId, NativeEvent, NativeListener, Platform, StyleSheet};
use crate::error::Result;

const VENDOR_SPELLINGS: [&str; 7] = ["webkit", "Webkit", "moz", "Moz", "ms", "o", "O"];

/// Handle to a headless element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A custom event recorded by [`Platform::dispatch_custom_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    /// Event name.
    pub name: String,
    /// Element passed as detail.
    pub detail: Option<NodeId>,
}

/// Result of firing a native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiredEvent {
    /// Listeners invoked along the propagation path.
    pub listeners_invoked: usize,
    /// Whether a listener stopped propagation.
    pub propagation_stopped: bool,
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    inline_style: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    event_type: String,
    capture: bool,
    listener: NativeListener,
}

struct Timer {
    due_ms: f64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct ClassStyle {
    class: String,
    property: String,
    value: String,
}

#[derive(Default)]
struct DomState {
    nodes: Vec<NodeData>,
    class_styles: Vec<ClassStyle>,
    style_sheets: Vec<StyleSheet>,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
    dispatched: Vec<DispatchedEvent>,
    timers: Vec<Timer>,
    next_timer: u64,
    now_ms: f64,
}

impl DomState {
    fn push_node(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn computed(&self, node: NodeId, css_name: &str) -> String {
        let key = canonical_key(css_name);
        let data = &self.nodes[node.0];

        if let Some((_, value)) = data
            .inline_style
            .iter()
            .rev()
            .find(|(name, _)| canonical_key(name) == key)
        {
            return value.clone();
        }

        self.class_styles
            .iter()
            .rev()
            .find(|style| data.classes.contains(&style.class) && canonical_key(&style.property) == key)
            .map(|style| style.value.clone())
            .unwrap_or_default()
    }
}

const ROOT: NodeId = NodeId(0);

/// Native event instance handed to listeners.
struct HeadlessEvent {
    event_type: String,
    stopped: Cell<bool>,
}

impl NativeEvent for HeadlessEvent {
    fn event_type(&self) -> String {
        self.event_type.clone()
    }

    fn stop_propagation(&self) {
        self.stopped.set(true);
    }
}

/// In-memory document with a head, a body and a virtual clock.
pub struct HeadlessDom {
    state: RefCell<DomState>,
    vendor_prefix: Option<String>,
    head: NodeId,
    body: NodeId,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    /// A document whose style objects only know unprefixed properties.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A document whose style objects know properties prefixed with `prefix`
    /// (e.g. `webkit` → `webkitAnimationName`) and whose animation events use
    /// that prefix.
    pub fn with_vendor_prefix(prefix: &str) -> Self {
        Self::build(Some(prefix.to_string()))
    }

    fn build(vendor_prefix: Option<String>) -> Self {
        let mut state = DomState::default();
        let root = state.push_node("html");
        let head = state.push_node("head");
        let body = state.push_node("body");
        state.append(root, head);
        state.append(root, body);
        Self {
            state: RefCell::new(state),
            vendor_prefix,
            head,
            body,
        }
    }

    /// The `<head>` element.
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Vendor prefix this document emulates.
    pub fn vendor_prefix(&self) -> Option<&str> {
        self.vendor_prefix.as_deref()
    }

    /// Create an element and append it to the body.
    pub fn element(&self, tag: &str) -> NodeId {
        self.create_child(self.body, tag)
    }

    /// Create an element and append it to `parent`.
    pub fn create_child(&self, parent: NodeId, tag: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        let node = state.push_node(tag);
        state.append(parent, node);
        node
    }

    /// Move `child` under `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.state.borrow_mut().append(parent, child);
    }

    /// Tag name of a node.
    pub fn tag(&self, node: NodeId) -> String {
        self.state.borrow().nodes[node.0].tag.clone()
    }

    /// Class list of a node, in insertion order.
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.state.borrow().nodes[node.0].classes.clone()
    }

    /// Replace the class list of a node.
    pub fn set_classes(&self, node: NodeId, classes: &[&str]) {
        self.state.borrow_mut().nodes[node.0].classes =
            classes.iter().map(|class| class.to_string()).collect();
    }

    /// Text content of a node.
    pub fn text(&self, node: NodeId) -> String {
        self.state.borrow().nodes[node.0].text.clone()
    }

    /// Attribute value of a node.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().nodes[node.0]
            .attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.clone())
    }

    /// Inline style value written under exactly `name`.
    pub fn inline_style(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().nodes[node.0]
            .inline_style
            .iter()
            .rev()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value.clone())
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.state.borrow().is_attached(node)
    }

    /// Attached nodes carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        (0..state.nodes.len())
            .map(NodeId)
            .filter(|node| state.is_attached(*node))
            .filter(|node| state.nodes[node.0].classes.iter().any(|c| c == class))
            .collect()
    }

    /// Register a declaration applied to every element carrying `class`.
    /// Later registrations win over earlier ones.
    pub fn define_class_style(&self, class: &str, css_property: &str, value: &str) {
        self.state.borrow_mut().class_styles.push(ClassStyle {
            class: class.to_string(),
            property: css_property.to_string(),
            value: value.to_string(),
        });
    }

    /// Load a stylesheet into the document.
    pub fn add_style_sheet(&self, sheet: StyleSheet) {
        self.state.borrow_mut().style_sheets.push(sheet);
    }

    /// Listeners registered on `node` for `event_type`.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.node == node && entry.event_type == event_type)
            .count()
    }

    /// Listeners registered anywhere in the document.
    pub fn total_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.state.borrow().listeners.iter().any(|entry| entry.id == id)
    }

    /// Fire a native event at `node` and bubble it towards the root.
    ///
    /// Listeners removed while the event is in flight are skipped.
    pub fn fire(&self, node: NodeId, event_type: &str) -> FiredEvent {
        let event = HeadlessEvent {
            event_type: event_type.to_string(),
            stopped: Cell::new(false),
        };
        let event_ref: &dyn NativeEvent = &event;
        let mut invoked = 0;
        let mut target = Some(node);

        while let Some(current) = target {
            let snapshot: Vec<(ListenerId, NativeListener)> = self
                .state
                .borrow()
                .listeners
                .iter()
                .filter(|entry| entry.node == current && entry.event_type == event_type)
                .map(|entry| (entry.id, Rc::clone(&entry.listener)))
                .collect();

            for (id, listener) in snapshot {
                if !self.is_registered(id) {
                    continue;
                }
                listener(event_ref);
                invoked += 1;
            }

            if event.stopped.get() {
                break;
            }
            target = self.state.borrow().nodes[current.0].parent;
        }

        trace!(node = node.0, event_type, invoked, "fired native event");
        FiredEvent {
            listeners_invoked: invoked,
            propagation_stopped: event.stopped.get(),
        }
    }

    /// Native animation event names for this document's vendor.
    pub fn animation_event_names(&self) -> (String, String) {
        match &self.vendor_prefix {
            Some(prefix) => (
                format!("{prefix}AnimationStart"),
                format!("{prefix}AnimationEnd"),
            ),
            None => ("animationstart".to_string(), "animationend".to_string()),
        }
    }

    /// Play every animation currently applied: fire start then end on each
    /// attached element that computes a non-empty `animation-name` and has a
    /// listener for either event. Returns the number of elements played.
    pub fn complete_animations(&self) -> usize {
        let (start, end) = self.animation_event_names();
        let candidates: Vec<NodeId> = {
            let state = self.state.borrow();
            let mut nodes: Vec<NodeId> = state
                .listeners
                .iter()
                .filter(|entry| entry.event_type == start || entry.event_type == end)
                .map(|entry| entry.node)
                .filter(|node| state.is_attached(*node))
                .collect();
            nodes.sort();
            nodes.dedup();
            nodes
                .into_iter()
                .filter(|node| {
                    let names = state.computed(*node, "animation-name");
                    !names.trim().is_empty() && names.trim() != "none"
                })
                .collect()
        };

        for node in &candidates {
            self.fire(*node, &start);
            self.fire(*node, &end);
        }
        candidates.len()
    }

    /// Custom events dispatched so far.
    pub fn dispatched(&self) -> Vec<DispatchedEvent> {
        self.state.borrow().dispatched.clone()
    }

    /// Names of the custom events dispatched so far.
    pub fn dispatched_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .dispatched
            .iter()
            .map(|event| event.name.clone())
            .collect()
    }

    /// Drain the dispatched event log.
    pub fn take_dispatched(&self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.state.borrow_mut().dispatched)
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }

    /// Timers waiting to run.
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Move the virtual clock forward, running due timers in order.
    /// Returns the number of timers run.
    pub fn advance(&self, ms: f64) -> usize {
        let target = self.state.borrow().now_ms + ms;
        let mut ran = 0;

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let due = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due_ms <= target)
                    .min_by(|(_, a), (_, b)| {
                        a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq))
                    })
                    .map(|(index, _)| index);
                due.map(|index| {
                    let timer = state.timers.remove(index);
                    state.now_ms = state.now_ms.max(timer.due_ms);
                    timer.callback
                })
            };

            match next {
                Some(callback) => {
                    callback();
                    ran += 1;
                }
                None => break,
            }
        }

        self.state.borrow_mut().now_ms = target;
        ran
    }

    /// Run every pending timer, including ones scheduled along the way.
    pub fn run_timers(&self) -> usize {
        let mut ran = 0;
        loop {
            let latest = {
                let state = self.state.borrow();
                state
                    .timers
                    .iter()
                    .map(|timer| timer.due_ms)
                    .max_by(f64::total_cmp)
                    .map(|due| (due - state.now_ms).max(0.0))
            };
            match latest {
                Some(delta) => ran += self.advance(delta),
                None => break,
            }
        }
        ran
    }
}

impl Platform for HeadlessDom {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        Ok(self.state.borrow_mut().push_node(tag))
    }

    fn append_to_head(&self, node: &NodeId) -> Result<()> {
        self.state.borrow_mut().append(self.head, *node);
        Ok(())
    }

    fn append_to_body(&self, node: &NodeId) -> Result<()> {
        self.state.borrow_mut().append(self.body, *node);
        Ok(())
    }

    fn remove_node(&self, node: &NodeId) {
        self.state.borrow_mut().detach(*node);
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        self.state.borrow_mut().nodes[node.0].text = text.to_string();
    }

    fn append_text_content(&self, node: &NodeId, text: &str) {
        self.state.borrow_mut().nodes[node.0].text.push_str(text);
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let data = &mut state.nodes[node.0];
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_string).collect();
            return;
        }
        match data.attributes.iter_mut().find(|(attr, _)| attr == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn add_classes(&self, node: &NodeId, classes: &[String]) {
        let mut state = self.state.borrow_mut();
        let list = &mut state.nodes[node.0].classes;
        for class in classes {
            if !list.contains(class) {
                list.push(class.clone());
            }
        }
    }

    fn remove_classes(&self, node: &NodeId, classes: &[String]) {
        self.state.borrow_mut().nodes[node.0]
            .classes
            .retain(|class| !classes.contains(class));
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.state.borrow().nodes[node.0]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.state.borrow().nodes[node.0].parent
    }

    fn child_index(&self, node: &NodeId) -> Option<usize> {
        let state = self.state.borrow();
        let parent = state.nodes[node.0].parent?;
        state.nodes[parent.0]
            .children
            .iter()
            .position(|child| child == node)
    }

    fn supports_style_property(&self, _node: &NodeId, dom_name: &str) -> bool {
        match VENDOR_SPELLINGS
            .iter()
            .find(|spelling| is_prefixed_with(dom_name, spelling))
        {
            Some(spelling) => self.vendor_prefix.as_deref() == Some(*spelling),
            None => true,
        }
    }

    fn set_style_property(&self, node: &NodeId, dom_name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let inline = &mut state.nodes[node.0].inline_style;
        match inline.iter_mut().find(|(name, _)| name == dom_name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => inline.push((dom_name.to_string(), value.to_string())),
        }
    }

    fn computed_style_value(&self, node: &NodeId, css_name: &str) -> String {
        self.state.borrow().computed(*node, css_name)
    }

    fn style_sheets(&self) -> Vec<StyleSheet> {
        self.state.borrow().style_sheets.clone()
    }

    fn add_event_listener(
        &self,
        node: &NodeId,
        event_type: &str,
        listener: NativeListener,
        capture: bool,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push(ListenerEntry {
            id,
            node: *node,
            event_type: event_type.to_string(),
            capture,
            listener,
        });
        id
    }

    fn remove_event_listener(
        &self,
        node: &NodeId,
        event_type: &str,
        listener: ListenerId,
        capture: bool,
    ) {
        // Take the entry out before dropping it: its closure may own the last
        // reference to state that re-enters the document when dropped.
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .listeners
                .iter()
                .position(|entry| {
                    entry.id == listener
                        && entry.node == *node
                        && entry.event_type == event_type
                        && entry.capture == capture
                })
                .map(|index| state.listeners.remove(index))
        };
        drop(removed);
    }

    fn dispatch_custom_event(&self, name: &str, detail: Option<&NodeId>) {
        trace!(name, detail = ?detail, "dispatched custom event");
        self.state.borrow_mut().dispatched.push(DispatchedEvent {
            name: name.to_string(),
            detail: detail.copied(),
        });
    }

    fn set_timeout(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) {
        let mut state = self.state.borrow_mut();
        state.next_timer += 1;
        let timer = Timer {
            due_ms: state.now_ms + delay_ms.max(0.0),
            seq: state.next_timer,
            callback,
        };
        state.timers.push(timer);
    }
}

fn is_prefixed_with(dom_name: &str, spelling: &str) -> bool {
    dom_name
        .strip_prefix(spelling)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Lowercase dashed property name without vendor prefix:
/// `webkitAnimationName`, `-webkit-animation-name` and `animationName` all
/// map to `animation-name`.
fn canonical_key(name: &str) -> String {
    let mut dashed = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            dashed.push('-');
            dashed.push(c.to_ascii_lowercase());
        } else {
            dashed.push(c);
        }
    }
    let dashed = dashed.trim_start_matches('-');
    for vendor in ["webkit-", "moz-", "ms-", "o-"] {
        if let Some(rest) = dashed.strip_prefix(vendor) {
            return rest.to_string();
        }
    }
    dashed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("webkitAnimationName"), "animation-name");
        assert_eq!(canonical_key("-moz-animation-delay"), "animation-delay");
        assert_eq!(canonical_key("OAnimationName"), "animation-name");
        assert_eq!(canonical_key("animationFillMode"), "animation-fill-mode");
        assert_eq!(canonical_key("opacity"), "opacity");
    }

    #[test]
    fn test_computed_style_prefers_inline() {
        let dom = HeadlessDom::new();
        let el = dom.element("div");
        dom.define_class_style("spin", "animation-name", "rotate");
        dom.add_classes(&el, &["spin".to_string()]);
        assert_eq!(dom.computed_style_value(&el, "animation-name"), "rotate");

        dom.set_style_property(&el, "animationName", "wobble");
        assert_eq!(dom.computed_style_value(&el, "animation-name"), "wobble");

        dom.remove_classes(&el, &["spin".to_string()]);
        assert_eq!(dom.computed_style_value(&el, "transition-delay"), "");
    }

    #[test]
    fn test_vendor_support() {
        let dom = HeadlessDom::with_vendor_prefix("Moz");
        let el = dom.element("div");
        assert!(dom.supports_style_property(&el, "MozAnimationName"));
        assert!(!dom.supports_style_property(&el, "webkitAnimationName"));
        assert!(dom.supports_style_property(&el, "animationName"));

        let plain = HeadlessDom::new();
        assert!(!plain.supports_style_property(&el, "MozAnimationName"));
    }

    #[test]
    fn test_fire_bubbles_until_stopped() {
        let dom = HeadlessDom::new();
        let parent = dom.element("ul");
        let child = dom.create_child(parent, "li");
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        dom.add_event_listener(
            &parent,
            "animationend",
            Rc::new(move |_| counter.set(counter.get() + 1)),
            false,
        );
        let fired = dom.fire(child, "animationend");
        assert_eq!(fired.listeners_invoked, 1);
        assert_eq!(hits.get(), 1);

        dom.add_event_listener(&child, "animationend", Rc::new(|e| e.stop_propagation()), false);
        let fired = dom.fire(child, "animationend");
        assert!(fired.propagation_stopped);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let second_hit = Rc::new(Cell::new(false));
        let second_id = Rc::new(Cell::new(None));

        let dom_ref = Rc::clone(&dom);
        let id_ref = Rc::clone(&second_id);
        dom.add_event_listener(
            &el,
            "animationstart",
            Rc::new(move |_| {
                if let Some(id) = id_ref.get() {
                    dom_ref.remove_event_listener(&el, "animationstart", id, false);
                }
            }),
            false,
        );
        let hit = Rc::clone(&second_hit);
        let id = dom.add_event_listener(
            &el,
            "animationstart",
            Rc::new(move |_| hit.set(true)),
            false,
        );
        second_id.set(Some(id));

        dom.fire(el, "animationstart");
        assert!(!second_hit.get());
        assert_eq!(dom.listener_count(el, "animationstart"), 1);
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let dom = HeadlessDom::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (label, delay) in [("b", 20.0), ("a", 10.0), ("c", 20.0)] {
            let order = Rc::clone(&order);
            dom.set_timeout(delay, Box::new(move || order.borrow_mut().push(label)));
        }

        assert_eq!(dom.advance(5.0), 0);
        assert_eq!(dom.advance(10.0), 1);
        assert_eq!(dom.run_timers(), 2);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert_eq!(dom.now_ms(), 20.0);
    }

    #[test]
    fn test_child_index_and_detach() {
        let dom = HeadlessDom::new();
        let list = dom.element("ul");
        let first = dom.create_child(list, "li");
        let second = dom.create_child(list, "li");
        assert_eq!(dom.child_index(&second), Some(1));

        dom.remove_node(&first);
        assert_eq!(dom.child_index(&second), Some(0));
        assert!(!dom.is_attached(first));
        assert_eq!(dom.parent(&first), None);
    }
}
