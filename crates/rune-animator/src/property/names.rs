//! Closed vocabulary of CSS features and their style properties, and the
//! vendor-specific [`PropertyMap`] built from it.

use std::collections::HashMap;
use std::fmt;

use crate::vendor::VendorPrefix;

use super::events::FeatureEvent;

/// CSS feature with vendor-prefixed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Animation,
    Transition,
    Transform,
    Keyframes,
}

/// Static description of a feature's property and event names.
#[derive(Debug)]
pub struct FeatureDescriptor {
    /// Feature this descriptor belongs to.
    pub feature: Feature,
    /// `animation`
    pub canonical_name: &'static str,
    /// `Animation`
    pub capitalized_name: &'static str,
    /// Declared property suffixes, in declaration order.
    pub property_suffixes: &'static [PropertySuffix],
    /// Declared native events, in declaration order.
    pub event_suffixes: &'static [FeatureEvent],
}

static ANIMATION: FeatureDescriptor = FeatureDescriptor {
    feature: Feature::Animation,
    canonical_name: "animation",
    capitalized_name: "Animation",
    property_suffixes: &[
        PropertySuffix::Name,
        PropertySuffix::Delay,
        PropertySuffix::FillMode,
        PropertySuffix::Duration,
        PropertySuffix::Direction,
        PropertySuffix::PlayState,
        PropertySuffix::IterationCount,
        PropertySuffix::TimingFunction,
    ],
    event_suffixes: &[FeatureEvent::Start, FeatureEvent::Iteration, FeatureEvent::End],
};

static TRANSITION: FeatureDescriptor = FeatureDescriptor {
    feature: Feature::Transition,
    canonical_name: "transition",
    capitalized_name: "Transition",
    property_suffixes: &[
        PropertySuffix::Delay,
        PropertySuffix::Duration,
        PropertySuffix::Property,
        PropertySuffix::TimingFunction,
    ],
    event_suffixes: &[FeatureEvent::End],
};

static TRANSFORM: FeatureDescriptor = FeatureDescriptor {
    feature: Feature::Transform,
    canonical_name: "transform",
    capitalized_name: "Transform",
    property_suffixes: &[PropertySuffix::Box, PropertySuffix::Style, PropertySuffix::Origin],
    event_suffixes: &[],
};

static KEYFRAMES: FeatureDescriptor = FeatureDescriptor {
    feature: Feature::Keyframes,
    canonical_name: "keyframes",
    capitalized_name: "Keyframes",
    property_suffixes: &[],
    event_suffixes: &[],
};

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Animation,
        Feature::Transition,
        Feature::Transform,
        Feature::Keyframes,
    ];

    pub fn descriptor(&self) -> &'static FeatureDescriptor {
        match self {
            Self::Animation => &ANIMATION,
            Self::Transition => &TRANSITION,
            Self::Transform => &TRANSFORM,
            Self::Keyframes => &KEYFRAMES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.descriptor().canonical_name
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-property of a feature (`animation-fill-mode` → `FillMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertySuffix {
    Name,
    Delay,
    FillMode,
    Duration,
    Direction,
    PlayState,
    IterationCount,
    TimingFunction,
    Property,
    Box,
    Style,
    Origin,
}

impl PropertySuffix {
    const ALL: [PropertySuffix; 12] = [
        Self::Name,
        Self::Delay,
        Self::FillMode,
        Self::Duration,
        Self::Direction,
        Self::PlayState,
        Self::IterationCount,
        Self::TimingFunction,
        Self::Property,
        Self::Box,
        Self::Style,
        Self::Origin,
    ];

    /// DOM spelling: `FillMode`.
    pub fn dom(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Delay => "Delay",
            Self::FillMode => "FillMode",
            Self::Duration => "Duration",
            Self::Direction => "Direction",
            Self::PlayState => "PlayState",
            Self::IterationCount => "IterationCount",
            Self::TimingFunction => "TimingFunction",
            Self::Property => "Property",
            Self::Box => "Box",
            Self::Style => "Style",
            Self::Origin => "Origin",
        }
    }

    /// CSS spelling: `fill-mode`.
    pub fn css(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Delay => "delay",
            Self::FillMode => "fill-mode",
            Self::Duration => "duration",
            Self::Direction => "direction",
            Self::PlayState => "play-state",
            Self::IterationCount => "iteration-count",
            Self::TimingFunction => "timing-function",
            Self::Property => "property",
            Self::Box => "box",
            Self::Style => "style",
            Self::Origin => "origin",
        }
    }
}

/// A canonical style property: a feature, optionally narrowed by a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleProperty {
    pub feature: Feature,
    pub suffix: Option<PropertySuffix>,
}

impl StyleProperty {
    pub const fn new(feature: Feature, suffix: PropertySuffix) -> Self {
        Self {
            feature,
            suffix: Some(suffix),
        }
    }

    /// The bare feature shorthand (`animation`).
    pub const fn shorthand(feature: Feature) -> Self {
        Self {
            feature,
            suffix: None,
        }
    }

    /// Parse a canonical name in camelCase (`animationFillMode`) or dashed
    /// (`animation-fill-mode`) form. Suffixes the feature does not declare
    /// are rejected.
    pub fn parse(name: &str) -> Option<Self> {
        Feature::ALL.into_iter().find_map(|feature| {
            let descriptor = feature.descriptor();
            let rest = name.strip_prefix(descriptor.canonical_name)?;
            if rest.is_empty() {
                return Some(Self::shorthand(feature));
            }
            let suffix = match rest.strip_prefix('-') {
                Some(dashed) => PropertySuffix::ALL.into_iter().find(|s| s.css() == dashed),
                None => PropertySuffix::ALL.into_iter().find(|s| s.dom() == rest),
            }?;
            descriptor
                .property_suffixes
                .contains(&suffix)
                .then(|| Self::new(feature, suffix))
        })
    }

    /// Canonical camelCase name: `animationFillMode`.
    pub fn dom_key(&self) -> String {
        let base = self.feature.as_str();
        match self.suffix {
            Some(suffix) => format!("{base}{}", suffix.dom()),
            None => base.to_string(),
        }
    }

    /// Canonical dashed name: `animation-fill-mode`.
    pub fn css_key(&self) -> String {
        let base = self.feature.as_str();
        match self.suffix {
            Some(suffix) => format!("{base}-{}", suffix.css()),
            None => base.to_string(),
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_key())
    }
}

/// Browser-specific DOM and CSS names for every property of one feature.
///
/// Built once from a [`FeatureDescriptor`] and the detected prefix; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMap {
    dom: HashMap<StyleProperty, String>,
    css: HashMap<StyleProperty, String>,
}

impl PropertyMap {
    pub fn build(descriptor: &FeatureDescriptor, prefix: VendorPrefix) -> Self {
        let (dom_base, css_base) = if prefix.is_none() {
            (
                descriptor.canonical_name.to_string(),
                descriptor.canonical_name.to_string(),
            )
        } else {
            (
                format!("{}{}", prefix.dom_prefix(), descriptor.capitalized_name),
                format!("{}{}", prefix.css_prefix(), descriptor.canonical_name),
            )
        };

        let mut dom = HashMap::new();
        let mut css = HashMap::new();
        let shorthand = StyleProperty::shorthand(descriptor.feature);
        dom.insert(shorthand, dom_base.clone());
        css.insert(shorthand, css_base.clone());

        for suffix in descriptor.property_suffixes {
            let property = StyleProperty::new(descriptor.feature, *suffix);
            dom.insert(property, format!("{dom_base}{}", suffix.dom()));
            css.insert(property, format!("{css_base}-{}", suffix.css()));
        }

        Self { dom, css }
    }

    /// Style object property name (`webkitAnimationName`).
    pub fn dom_name(&self, property: StyleProperty) -> Option<&str> {
        self.dom.get(&property).map(String::as_str)
    }

    /// CSS property name (`-webkit-animation-name`).
    pub fn css_name(&self, property: StyleProperty) -> Option<&str> {
        self.css.get(&property).map(String::as_str)
    }

    /// Number of mapped properties.
    pub fn len(&self) -> usize {
        self.dom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dom.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::Vendor;

    #[test]
    fn test_parse_style_property() {
        let fill = StyleProperty::new(Feature::Animation, PropertySuffix::FillMode);
        assert_eq!(StyleProperty::parse("animationFillMode"), Some(fill));
        assert_eq!(StyleProperty::parse("animation-fill-mode"), Some(fill));
        assert_eq!(
            StyleProperty::parse("transition"),
            Some(StyleProperty::shorthand(Feature::Transition))
        );
        // transitions declare no play state
        assert_eq!(StyleProperty::parse("transitionPlayState"), None);
        assert_eq!(StyleProperty::parse("opacity"), None);
    }

    #[test]
    fn test_property_map_unprefixed() {
        let map = PropertyMap::build(Feature::Transition.descriptor(), VendorPrefix::None);
        let delay = StyleProperty::new(Feature::Transition, PropertySuffix::Delay);
        assert_eq!(map.dom_name(delay), Some("transitionDelay"));
        assert_eq!(map.css_name(delay), Some("transition-delay"));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_property_map_prefixed() {
        let map = PropertyMap::build(
            Feature::Transform.descriptor(),
            VendorPrefix::Capitalized(Vendor::Moz),
        );
        let origin = StyleProperty::new(Feature::Transform, PropertySuffix::Origin);
        assert_eq!(map.dom_name(origin), Some("MozTransformOrigin"));
        assert_eq!(map.css_name(origin), Some("-moz-transform-origin"));
        assert_eq!(
            map.css_name(StyleProperty::shorthand(Feature::Transform)),
            Some("-moz-transform")
        );
    }
}
