//! Native event name translation.

use std::collections::HashMap;

use crate::vendor::VendorPrefix;

use super::names::FeatureDescriptor;

/// Native event raised by an animation or transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureEvent {
    Start,
    Iteration,
    End,
}

impl FeatureEvent {
    /// Short alias accepted by [`EventMap::translate`] (`start`).
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Iteration => "iteration",
            Self::End => "end",
        }
    }

    fn capitalized(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Iteration => "Iteration",
            Self::End => "End",
        }
    }
}

/// Alias and lowercase event names mapped to the engine's spelling.
///
/// For the animation feature with a `webkit` event prefix, `start` and
/// `animationstart` both map to `webkitAnimationStart`. Without a prefix
/// every name maps to its lowercase form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMap {
    names: HashMap<String, String>,
    resolved: HashMap<FeatureEvent, String>,
}

impl EventMap {
    pub fn build(descriptor: &FeatureDescriptor, event_prefix: VendorPrefix) -> Self {
        let mut map = Self::default();
        for event in descriptor.event_suffixes {
            let camel = format!("{}{}", descriptor.capitalized_name, event.capitalized());
            let lowercase = camel.to_lowercase();
            let vendor_name = if event_prefix.is_none() {
                lowercase.clone()
            } else {
                format!("{}{camel}", event_prefix.dom_prefix())
            };

            map.names.insert(event.alias().to_string(), vendor_name.clone());
            map.names.insert(lowercase, vendor_name.clone());
            map.resolved.insert(*event, vendor_name);
        }
        map
    }

    /// Translate a canonical or alias name; unknown names pass through.
    pub fn translate(&self, name: &str) -> String {
        self.names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Engine spelling of a declared event.
    pub fn resolve(&self, event: FeatureEvent) -> Option<&str> {
        self.resolved.get(&event).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::names::Feature;
    use crate::vendor::Vendor;

    #[test]
    fn test_unprefixed_events() {
        let map = EventMap::build(Feature::Animation.descriptor(), VendorPrefix::None);
        assert_eq!(map.translate("start"), "animationstart");
        assert_eq!(map.translate("animationiteration"), "animationiteration");
        assert_eq!(map.resolve(FeatureEvent::End), Some("animationend"));
        assert_eq!(map.translate("click"), "click");
    }

    #[test]
    fn test_prefixed_events() {
        let map = EventMap::build(
            Feature::Animation.descriptor(),
            VendorPrefix::Lowercase(Vendor::Webkit),
        );
        assert_eq!(map.translate("start"), "webkitAnimationStart");
        assert_eq!(map.translate("animationend"), "webkitAnimationEnd");
    }

    #[test]
    fn test_transition_and_transform_events() {
        let map = EventMap::build(Feature::Transition.descriptor(), VendorPrefix::None);
        assert_eq!(map.translate("end"), "transitionend");
        assert_eq!(map.resolve(FeatureEvent::Start), None);

        assert!(EventMap::build(Feature::Transform.descriptor(), VendorPrefix::None).is_empty());
    }
}
