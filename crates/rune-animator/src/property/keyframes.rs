use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;
use crate::vendor::VendorPrefix;

/// `id` of the `<style>` element holding injected keyframes.
pub const KEYFRAMES_SHEET_ID: &str = "au-keyframes-sheet";

/// `@keyframes` inspection and injection.
pub struct KeyframesProperty<P: Platform> {
    platform: Rc<P>,
    rule_type: u16,
    css_name: String,
    sheet: RefCell<Option<P::Node>>,
}

impl<P: Platform> KeyframesProperty<P> {
    pub fn new(platform: Rc<P>, prefix: VendorPrefix) -> Self {
        let rule_type = platform.keyframes_rule_type();
        let css_name = format!("@{}keyframes", prefix.css_prefix());
        Self {
            platform,
            rule_type,
            css_name,
            sheet: RefCell::new(None),
        }
    }

    /// Rule type reported for `@keyframes` rules.
    pub fn rule_type(&self) -> u16 {
        self.rule_type
    }

    /// At-rule spelling for this engine (`@-webkit-keyframes`).
    pub fn css_name(&self) -> &str {
        &self.css_name
    }

    /// The injected keyframes sheet, created and appended to the head on
    /// first use.
    pub fn ensure_sheet(&self) -> Result<P::Node> {
        if let Some(sheet) = self.sheet.borrow().as_ref() {
            return Ok(sheet.clone());
        }

        let sheet = self.platform.create_element("style")?;
        self.platform.set_attribute(&sheet, "type", "text/css");
        self.platform.set_attribute(&sheet, "id", KEYFRAMES_SHEET_ID);
        self.platform.append_to_head(&sheet)?;
        debug!("created keyframes sheet");

        *self.sheet.borrow_mut() = Some(sheet.clone());
        Ok(sheet)
    }

    /// Append `@keyframes name { frames }` to the injected sheet.
    pub fn insert_keyframes(&self, name: &str, frames: &str) -> Result<()> {
        let sheet = self.ensure_sheet()?;
        let rule = format!("{} {name} {{ {frames} }}\n", self.css_name);
        self.platform.append_text_content(&sheet, &rule);
        Ok(())
    }

    /// Whether any loaded stylesheet defines a keyframes rule named in `names`.
    ///
    /// Stylesheets are scanned on every call since they may change between
    /// animations.
    pub fn get_keyframe_by_animation_names(&self, names: &[String]) -> bool {
        self.platform.style_sheets().iter().any(|sheet| {
            sheet.rules.iter().any(|rule| {
                rule.rule_type == self.rule_type
                    && rule.name.as_ref().is_some_and(|name| names.contains(name))
            })
        })
    }
}
