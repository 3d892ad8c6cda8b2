use anyhow::Result;
use futures::FutureExt;
use rune_animator::property::{
    Feature, FeatureEvent, PropertyMap, PropertyRegistry, PropertySuffix, StyleProperty,
};
use rune_animator::platform::{CssRule, StyleSheet};
use rune_animator::{AnimatorConfig, CssAnimator, HeadlessDom, Vendor, VendorPrefix};
use rune_config::VendorConfig;
use std::rc::Rc;

#[test]
fn animation_name_for_every_prefix() {
    let name = StyleProperty::new(Feature::Animation, PropertySuffix::Name);
    let cases = [
        (VendorPrefix::None, "animationName", "animation-name"),
        (VendorPrefix::Lowercase(Vendor::Webkit), "webkitAnimationName", "-webkit-animation-name"),
        (VendorPrefix::Lowercase(Vendor::Moz), "mozAnimationName", "-moz-animation-name"),
        (VendorPrefix::Lowercase(Vendor::Ms), "msAnimationName", "-ms-animation-name"),
        (VendorPrefix::Lowercase(Vendor::O), "oAnimationName", "-o-animation-name"),
        (VendorPrefix::Capitalized(Vendor::Webkit), "WebkitAnimationName", "-webkit-animation-name"),
        (VendorPrefix::Capitalized(Vendor::Moz), "MozAnimationName", "-moz-animation-name"),
        (VendorPrefix::Capitalized(Vendor::O), "OAnimationName", "-o-animation-name"),
    ];

    for (prefix, dom, css) in cases {
        let map = PropertyMap::build(Feature::Animation.descriptor(), prefix);
        assert_eq!(map.dom_name(name), Some(dom), "dom name for {prefix}");
        assert_eq!(map.css_name(name), Some(css), "css name for {prefix}");
    }
}

#[test]
fn detects_prefix_from_style_support() -> Result<()> {
    for (spelling, expected) in [
        ("webkit", VendorPrefix::Lowercase(Vendor::Webkit)),
        ("Moz", VendorPrefix::Capitalized(Vendor::Moz)),
        ("ms", VendorPrefix::Lowercase(Vendor::Ms)),
    ] {
        let dom = HeadlessDom::with_vendor_prefix(spelling);
        assert_eq!(VendorPrefix::detect(&dom)?, expected);
    }
    assert_eq!(VendorPrefix::detect(&HeadlessDom::new())?, VendorPrefix::None);
    Ok(())
}

#[test]
fn styles_written_canonically_land_on_prefixed_properties() -> Result<()> {
    let dom = Rc::new(HeadlessDom::with_vendor_prefix("webkit"));
    let config = VendorConfig {
        probe_event_prefix: false,
        ..VendorConfig::default()
    };
    let registry = PropertyRegistry::new(Rc::clone(&dom), &config)?;
    let el = dom.create_child(dom.body(), "div");

    registry
        .animation()
        .assign_style(&el, [("animation-name", "spin"), ("animationDuration", "2s")]);

    assert_eq!(dom.inline_style(el, "webkitAnimationName").as_deref(), Some("spin"));
    assert_eq!(dom.inline_style(el, "webkitAnimationDuration").as_deref(), Some("2s"));
    assert_eq!(
        registry.animation().get_computed_value(&el, "animation-name"),
        "spin"
    );
    assert_eq!(registry.animation().get_names(&el), Some(vec!["spin".to_string()]));
    Ok(())
}

#[test]
fn prefixed_engine_runs_enter_after_probe_settles() -> Result<()> {
    let dom = Rc::new(HeadlessDom::with_vendor_prefix("webkit"));
    let animator = CssAnimator::with_config(Rc::clone(&dom), AnimatorConfig::default())?;
    assert!(!animator.registry().events_resolved());

    // the probe element is the only thing animating
    assert_eq!(dom.complete_animations(), 1);
    assert!(animator.registry().events_resolved());
    assert_eq!(
        animator.registry().animation().event_name(FeatureEvent::End.alias()),
        "webkitAnimationEnd"
    );

    dom.define_class_style("au-enter-active", "-webkit-animation-name", "fade-in");
    let el = dom.create_child(dom.body(), "section");
    dom.set_classes(el, &["au-animate"]);

    let entered = animator.enter(&el);
    assert_eq!(dom.listener_count(el, "webkitAnimationStart"), 1);
    assert_eq!(dom.complete_animations(), 1);

    assert_eq!(entered.now_or_never(), Some(true));
    assert_eq!(dom.dispatched_names(), vec!["enterBegin", "enterActive", "enterDone"]);
    Ok(())
}

#[test]
fn keyframes_lookup_across_sheets() -> Result<()> {
    let dom = Rc::new(HeadlessDom::new());
    let config = VendorConfig {
        probe_event_prefix: false,
        ..VendorConfig::default()
    };
    let registry = PropertyRegistry::new(Rc::clone(&dom), &config)?;
    dom.add_style_sheet(StyleSheet::new(vec![CssRule::style()]));
    dom.add_style_sheet(StyleSheet::new(vec![CssRule::style(), CssRule::keyframes("fade")]));

    let keyframes = registry.keyframes();
    assert_eq!(keyframes.css_name(), "@keyframes");
    assert!(keyframes.get_keyframe_by_animation_names(&["slide".to_string(), "fade".to_string()]));
    assert!(!keyframes.get_keyframe_by_animation_names(&["slide".to_string()]));
    assert!(!keyframes.get_keyframe_by_animation_names(&[]));
    Ok(())
}
