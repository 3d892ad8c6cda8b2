use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rune_config::VendorConfig;
use tracing::{debug, warn};

use crate::error::Result;
use crate::platform::{ListenerId, NativeListener, Platform};
use crate::vendor::VendorPrefix;

use super::{Feature, FeatureProperty, KeyframesProperty};

/// Class of the throwaway element used by the event prefix probe.
pub const PROBE_ELEMENT_CLASS: &str = "au-animated-test";

/// Start event spellings the probe listens for, with the prefix each implies.
const PROBE_EVENTS: [(&str, &str); 5] = [
    ("", "animationstart"),
    ("webkit", "webkitAnimationStart"),
    ("Webkit", "WebkitAnimationStart"),
    ("Moz", "MozAnimationStart"),
    ("O", "OAnimationStart"),
];

/// Vendor-specific property access shared by every lifecycle run of one
/// animator.
///
/// Construction detects the style property prefix, builds the feature
/// property maps and, unless disabled, starts the animation event prefix
/// probe. Until the probe settles the animation feature subscribes with
/// unprefixed event names.
pub struct PropertyRegistry<P: Platform> {
    platform: Rc<P>,
    prefix: VendorPrefix,
    animation: Rc<FeatureProperty<P>>,
    transition: FeatureProperty<P>,
    transform: FeatureProperty<P>,
    keyframes: KeyframesProperty<P>,
    probe: Option<Rc<EventPrefixProbe<P>>>,
}

impl<P: Platform> PropertyRegistry<P> {
    pub fn new(platform: Rc<P>, config: &VendorConfig) -> Result<Self> {
        let prefix = VendorPrefix::detect(platform.as_ref())?;

        let animation = Rc::new(FeatureProperty::new(
            Feature::Animation,
            Rc::clone(&platform),
            prefix,
        ));
        let transition = FeatureProperty::new(Feature::Transition, Rc::clone(&platform), prefix);
        // transitionend has no start-event ambiguity
        transition.install_events(VendorPrefix::None);
        let transform = FeatureProperty::new(Feature::Transform, Rc::clone(&platform), prefix);
        let keyframes = KeyframesProperty::new(Rc::clone(&platform), prefix);

        let probe = if config.probe_event_prefix {
            Some(EventPrefixProbe::start(&platform, &animation, config)?)
        } else {
            animation.install_events(VendorPrefix::None);
            None
        };

        Ok(Self {
            platform,
            prefix,
            animation,
            transition,
            transform,
            keyframes,
            probe,
        })
    }

    pub fn platform(&self) -> &Rc<P> {
        &self.platform
    }

    /// Style property prefix detected at construction.
    pub fn prefix(&self) -> VendorPrefix {
        self.prefix
    }

    pub fn animation(&self) -> &FeatureProperty<P> {
        &self.animation
    }

    pub fn transition(&self) -> &FeatureProperty<P> {
        &self.transition
    }

    pub fn transform(&self) -> &FeatureProperty<P> {
        &self.transform
    }

    pub fn keyframes(&self) -> &KeyframesProperty<P> {
        &self.keyframes
    }

    pub fn feature(&self, feature: Feature) -> Option<&FeatureProperty<P>> {
        match feature {
            Feature::Animation => Some(&self.animation),
            Feature::Transition => Some(&self.transition),
            Feature::Transform => Some(&self.transform),
            Feature::Keyframes => None,
        }
    }

    /// Event prefix learned by the probe, once it fired.
    pub fn event_prefix(&self) -> Option<VendorPrefix> {
        self.probe.as_ref().and_then(|probe| probe.detected.get())
    }

    /// Whether animation events are translated with their final spelling.
    pub fn events_resolved(&self) -> bool {
        self.animation.events_resolved()
    }
}

impl<P: Platform> Drop for PropertyRegistry<P> {
    fn drop(&mut self) {
        if let Some(probe) = &self.probe {
            probe.teardown();
        }
    }
}

/// Injected test animation that reveals the engine's animation event prefix.
struct EventPrefixProbe<P: Platform> {
    platform: Weak<P>,
    animation: Weak<FeatureProperty<P>>,
    element: P::Node,
    style: P::Node,
    listeners: RefCell<Vec<(&'static str, ListenerId)>>,
    detected: Cell<Option<VendorPrefix>>,
    torn_down: Cell<bool>,
}

impl<P: Platform> EventPrefixProbe<P> {
    fn start(
        platform: &Rc<P>,
        animation: &Rc<FeatureProperty<P>>,
        config: &VendorConfig,
    ) -> Result<Rc<Self>> {
        let name = &config.probe_animation_name;
        let frames = "0% { height: 0; } 100% { height: 0; }";
        let keyframes: String = ["-webkit-", "-moz-", "-ms-", "-o-", ""]
            .iter()
            .map(|vendor| format!("@{vendor}keyframes {name} {{ {frames} }} "))
            .collect();

        let style = platform.create_element("style")?;
        platform.set_attribute(&style, "type", "text/css");
        platform.set_text_content(&style, &keyframes);

        let element = platform.create_element("div")?;
        platform.set_attribute(&element, "class", PROBE_ELEMENT_CLASS);
        platform.set_style_property(&element, "width", "0");
        platform.set_style_property(&element, "height", "0");
        platform.set_style_property(&element, "overflow", "hidden");
        animation.set_style(&element, "animation-name", name);
        animation.set_style(
            &element,
            "animation-duration",
            &format!("{}ms", config.probe_duration_ms),
        );

        platform.append_to_head(&style)?;

        let probe = Rc::new(Self {
            platform: Rc::downgrade(platform),
            animation: Rc::downgrade(animation),
            element: element.clone(),
            style,
            listeners: RefCell::new(Vec::new()),
            detected: Cell::new(None),
            torn_down: Cell::new(false),
        });

        for (dom_prefix, event_type) in PROBE_EVENTS {
            let handler_probe = Rc::downgrade(&probe);
            let listener: NativeListener = Rc::new(move |_| {
                if let Some(probe) = handler_probe.upgrade() {
                    probe.settle(dom_prefix);
                }
            });
            let id = platform.add_event_listener(&element, event_type, listener, false);
            probe.listeners.borrow_mut().push((event_type, id));
        }

        platform.append_to_body(&element)?;
        debug!(animation = %name, "started event prefix probe");
        Ok(probe)
    }

    fn settle(&self, dom_prefix: &str) {
        if self.detected.get().is_some() {
            return;
        }
        let Some(prefix) = VendorPrefix::from_dom_prefix(dom_prefix) else {
            warn!(dom_prefix, "probe fired with unknown prefix");
            return;
        };
        self.detected.set(Some(prefix));
        if let Some(animation) = self.animation.upgrade() {
            animation.install_events(prefix);
        }
        debug!(prefix = %prefix, "animation event prefix resolved");
        self.teardown();
    }

    fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        let Some(platform) = self.platform.upgrade() else {
            return;
        };
        for (event_type, id) in self.listeners.borrow_mut().drain(..) {
            platform.remove_event_listener(&self.element, event_type, id, false);
        }
        platform.remove_node(&self.element);
        platform.remove_node(&self.style);
    }
}
