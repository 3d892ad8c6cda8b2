//! [`Platform`] bound to the browser document through `web-sys`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::{trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssKeyframesRule, CssStyleSheet, CustomEvent, CustomEventInit, Document, Element, Event,
    HtmlElement, Window,
};

use super::{CssRule, KEYFRAMES_RULE, ListenerId, NativeEvent, NativeListener, Platform, StyleSheet};
use crate::error::{AnimatorError, Result};

type EventClosure = Closure<dyn FnMut(Event)>;

impl NativeEvent for Event {
    fn event_type(&self) -> String {
        self.type_()
    }

    fn stop_propagation(&self) {
        Event::stop_propagation(self);
    }
}

fn js_error(context: &str, err: JsValue) -> AnimatorError {
    AnimatorError::Platform(format!("{context}: {err:?}"))
}

/// The live browser document.
pub struct WebPlatform {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<ListenerId, EventClosure>>,
    next_listener: Cell<u64>,
}

impl WebPlatform {
    /// Bind to the global `window` and its document.
    pub fn new() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| AnimatorError::Platform("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| AnimatorError::Platform("window has no document".to_string()))?;
        Ok(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    fn style(&self, node: &Element) -> Option<web_sys::CssStyleDeclaration> {
        node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }

    fn sheet_rules(sheet: &CssStyleSheet) -> Vec<CssRule> {
        // cross-origin sheets refuse cssRules access
        let Ok(rules) = sheet.css_rules() else {
            return Vec::new();
        };
        (0..rules.length())
            .filter_map(|index| rules.item(index))
            .map(|rule| {
                let rule_type = rule.type_();
                let name = (rule_type == KEYFRAMES_RULE)
                    .then(|| rule.dyn_ref::<CssKeyframesRule>().map(CssKeyframesRule::name))
                    .flatten();
                CssRule { rule_type, name }
            })
            .collect()
    }

    /// Drop a listener closure once the current dispatch has unwound.
    fn retire(&self, closure: EventClosure) {
        let release = Closure::once_into_js(move || drop(closure));
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(release.unchecked_ref(), 0)
        {
            warn!(?err, "failed to schedule listener release");
        }
    }
}

impl Platform for WebPlatform {
    type Node = Element;

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document
            .create_element(tag)
            .map_err(|err| js_error("createElement", err))
    }

    fn append_to_head(&self, node: &Element) -> Result<()> {
        let head = self
            .document
            .head()
            .ok_or_else(|| AnimatorError::Platform("document has no head".to_string()))?;
        head.append_child(node)
            .map(|_| ())
            .map_err(|err| js_error("appendChild", err))
    }

    fn append_to_body(&self, node: &Element) -> Result<()> {
        let body = self
            .document
            .body()
            .ok_or_else(|| AnimatorError::Platform("document has no body".to_string()))?;
        body.append_child(node)
            .map(|_| ())
            .map_err(|err| js_error("appendChild", err))
    }

    fn remove_node(&self, node: &Element) {
        node.remove();
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn append_text_content(&self, node: &Element, text: &str) {
        let mut content = node.text_content().unwrap_or_default();
        content.push_str(text);
        node.set_text_content(Some(&content));
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(err) = node.set_attribute(name, value) {
            warn!(name, ?err, "setAttribute failed");
        }
    }

    fn add_classes(&self, node: &Element, classes: &[String]) {
        let list = node.class_list();
        for class in classes {
            if let Err(err) = list.add_1(class) {
                warn!(class, ?err, "classList.add failed");
            }
        }
    }

    fn remove_classes(&self, node: &Element, classes: &[String]) {
        let list = node.class_list();
        for class in classes {
            if let Err(err) = list.remove_1(class) {
                warn!(class, ?err, "classList.remove failed");
            }
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn child_index(&self, node: &Element) -> Option<usize> {
        let target: &web_sys::Node = node;
        let children = target.parent_node()?.child_nodes();
        (0..children.length()).position(|index| {
            children
                .get(index)
                .is_some_and(|child| child.is_same_node(Some(target)))
        })
    }

    fn supports_style_property(&self, node: &Element, dom_name: &str) -> bool {
        let Some(style) = self.style(node) else {
            return false;
        };
        let key = JsValue::from_str(dom_name);
        js_sys::Reflect::has(&style, &key).unwrap_or(false)
            && js_sys::Reflect::get(&style, &key).is_ok_and(|value| !value.is_null())
    }

    fn set_style_property(&self, node: &Element, dom_name: &str, value: &str) {
        let Some(style) = self.style(node) else {
            return;
        };
        if let Err(err) = js_sys::Reflect::set(
            &style,
            &JsValue::from_str(dom_name),
            &JsValue::from_str(value),
        ) {
            warn!(dom_name, ?err, "style write failed");
        }
    }

    fn computed_style_value(&self, node: &Element, css_name: &str) -> String {
        match self.window.get_computed_style(node) {
            Ok(Some(computed)) => computed.get_property_value(css_name).unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn style_sheets(&self) -> Vec<StyleSheet> {
        let sheets = self.document.style_sheets();
        (0..sheets.length())
            .filter_map(|index| sheets.item(index))
            .filter_map(|sheet| sheet.dyn_into::<CssStyleSheet>().ok())
            .map(|sheet| StyleSheet::new(Self::sheet_rules(&sheet)))
            .collect()
    }

    fn add_event_listener(
        &self,
        node: &Element,
        event_type: &str,
        listener: NativeListener,
        capture: bool,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.get() + 1);
        self.next_listener.set(id.0);

        let closure = EventClosure::new(move |event: Event| listener(&event));
        if let Err(err) = node.add_event_listener_with_callback_and_bool(
            event_type,
            closure.as_ref().unchecked_ref(),
            capture,
        ) {
            warn!(event_type, ?err, "addEventListener failed");
        }
        trace!(event_type, listener = id.0, "added listener");
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn remove_event_listener(
        &self,
        node: &Element,
        event_type: &str,
        listener: ListenerId,
        capture: bool,
    ) {
        let Some(closure) = self.listeners.borrow_mut().remove(&listener) else {
            return;
        };
        if let Err(err) = node.remove_event_listener_with_callback_and_bool(
            event_type,
            closure.as_ref().unchecked_ref(),
            capture,
        ) {
            warn!(event_type, ?err, "removeEventListener failed");
        }
        // the closure may be the one currently running
        self.retire(closure);
    }

    fn dispatch_custom_event(&self, name: &str, detail: Option<&Element>) {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        match detail {
            Some(element) => init.set_detail(element),
            None => init.set_detail(&JsValue::NULL),
        }

        let event = match CustomEvent::new_with_event_init_dict(name, &init) {
            Ok(event) => event,
            Err(err) => {
                warn!(name, ?err, "failed to create custom event");
                return;
            }
        };
        if let Err(err) = self.window.dispatch_event(&event) {
            warn!(name, ?err, "dispatchEvent failed");
        }
    }

    fn set_timeout(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) {
        let callback = Closure::once_into_js(move || callback());
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms.round() as i32,
            )
        {
            warn!(?err, "setTimeout failed");
        }
    }
}
