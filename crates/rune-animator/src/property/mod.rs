//! Vendor-normalized access to CSS feature properties and events.
//!
//! A [`PropertyRegistry`] detects the vendor prefix once and owns one
//! [`FeatureProperty`] per feature plus the [`KeyframesProperty`]. Callers
//! always speak canonical names (`animation-name`, `start`); the feature
//! property translates them to whatever the engine understands.
//!
//! # Usage
//!
//! ```ignore
//! let registry = PropertyRegistry::new(platform, &config.vendor)?;
//! let animation = registry.animation();
//! animation.set_style(&node, "animation-duration", "250ms");
//! let handle = animation.subscribe(&node, "end", |_| println!("done"), false);
//! handle.dispose();
//! ```

mod events;
mod keyframes;
mod names;
mod registry;
mod subscription;

pub use events::{EventMap, FeatureEvent};
pub use keyframes::{KEYFRAMES_SHEET_ID, KeyframesProperty};
pub use names::{Feature, FeatureDescriptor, PropertyMap, PropertySuffix, StyleProperty};
pub use registry::PropertyRegistry;
pub use subscription::Subscription;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::platform::{ListenerId, NativeEvent, Platform};
use crate::vendor::VendorPrefix;

use subscription::Flags;

/// Style and event operations for one CSS feature.
pub struct FeatureProperty<P: Platform> {
    feature: Feature,
    platform: Rc<P>,
    map: PropertyMap,
    events: RefCell<EventMap>,
    events_resolved: Cell<bool>,
}

impl<P: Platform> FeatureProperty<P> {
    /// Build the property map for `feature` under `prefix`. Events start out
    /// unresolved with the unprefixed map.
    pub fn new(feature: Feature, platform: Rc<P>, prefix: VendorPrefix) -> Self {
        let descriptor = feature.descriptor();
        Self {
            feature,
            platform,
            map: PropertyMap::build(descriptor, prefix),
            events: RefCell::new(EventMap::build(descriptor, VendorPrefix::None)),
            events_resolved: Cell::new(false),
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn property_map(&self) -> &PropertyMap {
        &self.map
    }

    /// Install the event map for `event_prefix` and mark events resolved.
    pub fn install_events(&self, event_prefix: VendorPrefix) {
        trace!(feature = %self.feature, prefix = %event_prefix, "installing event map");
        *self.events.borrow_mut() = EventMap::build(self.feature.descriptor(), event_prefix);
        self.events_resolved.set(true);
    }

    /// Whether the event map reflects the engine's real event spelling.
    pub fn events_resolved(&self) -> bool {
        self.events_resolved.get()
    }

    /// Translate a canonical or alias event name.
    pub fn event_name(&self, name: &str) -> String {
        self.events.borrow().translate(name)
    }

    /// Write `name` and, when it maps to a different vendor name, the vendor
    /// property too.
    pub fn set_style(&self, node: &P::Node, name: &str, value: &str) {
        self.platform.set_style_property(node, name, value);
        if let Some(property) = StyleProperty::parse(name)
            && let Some(vendor_name) = self.map.dom_name(property)
            && vendor_name != name
        {
            self.platform.set_style_property(node, vendor_name, value);
        }
    }

    /// [`set_style`](Self::set_style) for every pair.
    pub fn assign_style<'a>(
        &self,
        node: &P::Node,
        styles: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        for (name, value) in styles {
            self.set_style(node, name, value);
        }
    }

    /// Computed value under the vendor CSS name, falling back to `name`.
    /// Empty when unset.
    pub fn get_computed_value(&self, node: &P::Node, name: &str) -> String {
        let vendor_value = StyleProperty::parse(name)
            .and_then(|property| self.map.css_name(property))
            .map(|css_name| self.platform.computed_style_value(node, css_name))
            .unwrap_or_default();

        if vendor_value.is_empty() {
            self.platform.computed_style_value(node, name)
        } else {
            vendor_value
        }
    }

    /// Attach `callback` for the translated event. The returned handle
    /// detaches it again.
    pub fn subscribe(
        &self,
        element: &P::Node,
        event_name: &str,
        callback: impl Fn(&dyn NativeEvent) + 'static,
        capture: bool,
    ) -> Subscription<P> {
        let native_name = self.event_name(event_name);
        let flags = Rc::new(Flags::default());

        let handler_flags = Rc::clone(&flags);
        let listener = self.platform.add_event_listener(
            element,
            &native_name,
            Rc::new(move |event: &dyn NativeEvent| {
                handler_flags.triggered.set(true);
                callback(event);
            }),
            capture,
        );

        trace!(feature = %self.feature, event = %native_name, listener = listener.0, "subscribed");
        Subscription::new(
            Rc::clone(&self.platform),
            element.clone(),
            native_name,
            listener,
            capture,
            flags,
        )
    }

    /// Detach a listener by id or by the handle that attached it.
    pub fn unsubscribe(
        &self,
        element: &P::Node,
        event_name: &str,
        listener: impl Into<ListenerId>,
        capture: bool,
    ) {
        let native_name = self.event_name(event_name);
        self.platform
            .remove_event_listener(element, &native_name, listener.into(), capture);
    }

    /// Feature delay in milliseconds; 0 when unset, unparsable, or the
    /// feature has no delay.
    pub fn get_delay(&self, node: &P::Node) -> f64 {
        if !self
            .feature
            .descriptor()
            .property_suffixes
            .contains(&PropertySuffix::Delay)
        {
            return 0.0;
        }
        let property = StyleProperty::new(self.feature, PropertySuffix::Delay);
        parse_delay_ms(&self.get_computed_value(node, &property.css_key()))
    }

    /// Active animation names; `None` when the property is absent.
    ///
    /// An explicit `none` yields an empty list.
    pub fn get_names(&self, node: &P::Node) -> Option<Vec<String>> {
        if !self
            .feature
            .descriptor()
            .property_suffixes
            .contains(&PropertySuffix::Name)
        {
            return None;
        }
        let property = StyleProperty::new(self.feature, PropertySuffix::Name);
        let value = self.get_computed_value(node, &property.css_key());
        if value.trim().is_empty() {
            return None;
        }
        Some(
            value
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|name| !name.is_empty() && *name != "none")
                .map(str::to_string)
                .collect(),
        )
    }
}

/// First entry of a delay list in milliseconds (`0.1s, 2s` → 100).
fn parse_delay_ms(value: &str) -> f64 {
    let first = value.split(',').next().unwrap_or_default().trim();
    let numeric: String = first
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let Ok(number) = numeric.parse::<f64>() else {
        return 0.0;
    };
    if first.ends_with("ms") { number } else { number * 1000.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessDom;
    use crate::vendor::Vendor;

    fn animation(dom: &Rc<HeadlessDom>, prefix: VendorPrefix) -> FeatureProperty<HeadlessDom> {
        FeatureProperty::new(Feature::Animation, Rc::clone(dom), prefix)
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay_ms("0.25s"), 250.0);
        assert_eq!(parse_delay_ms("40ms"), 40.0);
        assert_eq!(parse_delay_ms("1s, 3s"), 1000.0);
        assert_eq!(parse_delay_ms(""), 0.0);
        assert_eq!(parse_delay_ms("auto"), 0.0);
    }

    #[test]
    fn test_set_style_writes_both_names() {
        let dom = Rc::new(HeadlessDom::with_vendor_prefix("webkit"));
        let el = dom.element("div");
        let property = animation(&dom, VendorPrefix::Lowercase(Vendor::Webkit));

        property.set_style(&el, "animationDuration", "10ms");
        assert_eq!(dom.inline_style(el, "animationDuration").as_deref(), Some("10ms"));
        assert_eq!(dom.inline_style(el, "webkitAnimationDuration").as_deref(), Some("10ms"));

        property.set_style(&el, "opacity", "0");
        assert_eq!(dom.inline_style(el, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_assign_style() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let property = animation(&dom, VendorPrefix::None);
        property.assign_style(&el, [("animation-name", "spin"), ("animation-delay", "1s")]);
        assert_eq!(property.get_computed_value(&el, "animation-name"), "spin");
        assert_eq!(property.get_delay(&el), 1000.0);
    }

    #[test]
    fn test_get_names() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let property = animation(&dom, VendorPrefix::None);
        assert_eq!(property.get_names(&el), None);

        dom.define_class_style("busy", "animation-name", "spin, fade");
        dom.add_classes(&el, &["busy".to_string()]);
        assert_eq!(
            property.get_names(&el),
            Some(vec!["spin".to_string(), "fade".to_string()])
        );

        property.set_style(&el, "animation-name", "none");
        assert_eq!(property.get_names(&el), Some(vec![]));
    }

    #[test]
    fn test_computed_value_falls_back_to_canonical() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        dom.define_class_style("slow", "transition-delay", "200ms");
        dom.add_classes(&el, &["slow".to_string()]);

        let transition = FeatureProperty::new(
            Feature::Transition,
            Rc::clone(&dom),
            VendorPrefix::Capitalized(Vendor::O),
        );
        assert_eq!(transition.get_delay(&el), 200.0);

        let transform = FeatureProperty::new(Feature::Transform, Rc::clone(&dom), VendorPrefix::None);
        assert_eq!(transform.get_delay(&el), 0.0);
        assert_eq!(transform.get_names(&el), None);
    }

    #[test]
    fn test_subscribe_tracks_trigger_and_dispose() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let property = animation(&dom, VendorPrefix::None);
        property.install_events(VendorPrefix::None);
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let handle = property.subscribe(&el, "start", move |_| counter.set(counter.get() + 1), false);
        assert_eq!(handle.event_name(), "animationstart");
        assert!(handle.bound());
        assert!(!handle.triggered());

        dom.fire(el, "animationstart");
        assert!(handle.triggered());
        assert_eq!(hits.get(), 1);

        handle.dispose();
        handle.dispose();
        assert!(!handle.bound());
        dom.fire(el, "animationstart");
        assert_eq!(hits.get(), 1);
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_unsubscribe_by_handle() {
        let dom = Rc::new(HeadlessDom::new());
        let el = dom.element("div");
        let property = animation(&dom, VendorPrefix::None);
        let handle = property.subscribe(&el, "end", |_| {}, false);

        property.unsubscribe(&el, "end", &handle, false);
        assert_eq!(dom.listener_count(el, "animationend"), 0);
    }
}
