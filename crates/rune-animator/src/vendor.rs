//! Browser vendor prefix detection.
//!
//! Legacy engines expose animation properties only under a prefixed name
//! (`webkitAnimationName`, `MozAnimationName`, ...). The prefix is probed once
//! per [`PropertyRegistry`](crate::property::PropertyRegistry) and never
//! changes afterwards.

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;

/// Browser engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Webkit,
    Moz,
    Ms,
    O,
}

impl Vendor {
    /// Every known vendor, in probe order.
    pub const ALL: [Vendor; 4] = [Vendor::Webkit, Vendor::Moz, Vendor::Ms, Vendor::O];

    /// Lowercase spelling (`webkit`).
    pub fn lowercase(&self) -> &'static str {
        match self {
            Self::Webkit => "webkit",
            Self::Moz => "moz",
            Self::Ms => "ms",
            Self::O => "o",
        }
    }

    /// Capitalized spelling (`Webkit`), if the engine ever used one.
    pub fn capitalized(&self) -> Option<&'static str> {
        match self {
            Self::Webkit => Some("Webkit"),
            Self::Moz => Some("Moz"),
            Self::Ms => None,
            Self::O => Some("O"),
        }
    }
}

/// Prefix under which the current engine exposes animation style properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VendorPrefix {
    /// Unprefixed standard names.
    #[default]
    None,
    /// `webkitAnimationName` style.
    Lowercase(Vendor),
    /// `WebkitAnimationName` style.
    Capitalized(Vendor),
}

impl VendorPrefix {
    /// Prefixes in detection order: the lowercase set first, then the
    /// capitalized set.
    pub fn candidates() -> impl Iterator<Item = VendorPrefix> {
        let lowercase = Vendor::ALL.into_iter().map(VendorPrefix::Lowercase);
        let capitalized = Vendor::ALL
            .into_iter()
            .filter(|vendor| vendor.capitalized().is_some())
            .map(VendorPrefix::Capitalized);
        lowercase.chain(capitalized)
    }

    /// Probe a throwaway element for a prefixed `AnimationName` style property.
    pub fn detect<P: Platform>(platform: &P) -> Result<Self> {
        let probe = platform.create_element("div")?;
        let detected = Self::candidates()
            .find(|candidate| {
                let name = format!("{}AnimationName", candidate.dom_prefix());
                platform.supports_style_property(&probe, &name)
            })
            .unwrap_or_default();

        debug!(prefix = %detected, "detected vendor prefix");
        Ok(detected)
    }

    /// Parse a DOM spelling (`webkit`, `Moz`, `O`); empty means unprefixed.
    pub fn from_dom_prefix(prefix: &str) -> Option<Self> {
        if prefix.is_empty() {
            return Some(Self::None);
        }
        Self::candidates().find(|candidate| candidate.dom_prefix() == prefix)
    }

    /// Prefix for DOM style property and event names (`webkit`, `Moz`, or empty).
    pub fn dom_prefix(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Lowercase(vendor) => vendor.lowercase(),
            Self::Capitalized(vendor) => vendor.capitalized().unwrap_or(vendor.lowercase()),
        }
    }

    /// Prefix for CSS property names (`-webkit-`, or empty).
    pub fn css_prefix(&self) -> String {
        match self.vendor() {
            Some(vendor) => format!("-{}-", vendor.lowercase()),
            None => String::new(),
        }
    }

    /// The engine family, if prefixed.
    pub fn vendor(&self) -> Option<Vendor> {
        match self {
            Self::None => None,
            Self::Lowercase(vendor) | Self::Capitalized(vendor) => Some(*vendor),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for VendorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            other => f.write_str(other.dom_prefix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessDom;

    #[test]
    fn test_candidate_order() {
        let order: Vec<&str> = VendorPrefix::candidates().map(|p| p.dom_prefix()).collect();
        assert_eq!(order, vec!["webkit", "moz", "ms", "o", "Webkit", "Moz", "O"]);
    }

    #[test]
    fn test_detect() {
        let dom = HeadlessDom::with_vendor_prefix("Moz");
        assert_eq!(
            VendorPrefix::detect(&dom).unwrap(),
            VendorPrefix::Capitalized(Vendor::Moz)
        );

        let dom = HeadlessDom::with_vendor_prefix("webkit");
        assert_eq!(
            VendorPrefix::detect(&dom).unwrap(),
            VendorPrefix::Lowercase(Vendor::Webkit)
        );

        assert_eq!(VendorPrefix::detect(&HeadlessDom::new()).unwrap(), VendorPrefix::None);
    }

    #[test]
    fn test_prefix_spellings() {
        let prefix = VendorPrefix::Capitalized(Vendor::Webkit);
        assert_eq!(prefix.dom_prefix(), "Webkit");
        assert_eq!(prefix.css_prefix(), "-webkit-");
        assert_eq!(VendorPrefix::None.css_prefix(), "");
        assert_eq!(VendorPrefix::from_dom_prefix("O"), Some(VendorPrefix::Capitalized(Vendor::O)));
        assert_eq!(VendorPrefix::from_dom_prefix(""), Some(VendorPrefix::None));
        assert_eq!(VendorPrefix::from_dom_prefix("khtml"), None);
    }
}
