//! Rune animator configuration
//!
//! This crate provides centralized configuration for the CSS animator,
//! loading settings from `rune.toml` with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "rune.toml";

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// The file is not valid TOML for [`AnimatorConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure for the animator
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AnimatorConfig {
    /// CSS class contract shared with page stylesheets
    pub classes: ClassConfig,
    /// Lifecycle engine behavior
    pub lifecycle: LifecycleConfig,
    /// Vendor prefix detection
    pub vendor: VendorConfig,
}

/// Class names the animator adds, removes or checks for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassConfig {
    /// Prefix for enter/leave lifecycle classes (`au-enter`, `au-leave-active`, ...)
    pub prefix: String,
    /// Class an element must carry before enter/leave may run
    pub trigger: String,
    /// Done-marker left on an element after a completed enter
    pub entered: String,
    /// Done-marker left on an element after a completed leave
    pub left: String,
}

/// Lifecycle engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Add/strip the done-marker classes around enter and leave
    pub use_done_classes: bool,
    /// In strict mode, require an `@keyframes` rule for newly applied animation names
    pub verify_keyframes_exist: bool,
    /// Only count animation names that appeared since the prepare phase
    pub strict_keyframe_check: bool,
}

/// Vendor detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VendorConfig {
    /// Inject a throwaway animation to learn the animation event prefix
    pub probe_event_prefix: bool,
    /// Keyframes name used by the probe animation
    pub probe_animation_name: String,
    /// Duration of the probe animation in milliseconds
    pub probe_duration_ms: u32,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            prefix: "au-".to_string(),
            trigger: "au-animate".to_string(),
            entered: "au-entered".to_string(),
            left: "au-left".to_string(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            use_done_classes: true,
            verify_keyframes_exist: true,
            strict_keyframe_check: false,
        }
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            probe_event_prefix: true,
            probe_animation_name: "au-test-animation".to_string(),
            probe_duration_ms: 10,
        }
    }
}

impl ClassConfig {
    /// Class opting every element into staggered activation.
    pub fn stagger_class(&self) -> String {
        format!("{}stagger", self.prefix)
    }

    /// Class opting an element into staggering for one operation (`au-stagger-enter`).
    pub fn stagger_class_for(&self, operation: &str) -> String {
        format!("{}stagger-{}", self.prefix, operation)
    }
}

impl AnimatorConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the rune.toml configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location (rune.toml in the current directory)
    /// or return default configuration if the file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(prefix) = std::env::var("RUNE_ANIMATOR_PREFIX") {
            self.classes.prefix = prefix;
        }
        if let Ok(trigger) = std::env::var("RUNE_ANIMATOR_TRIGGER_CLASS") {
            self.classes.trigger = trigger;
        }
        if let Some(flag) = env_flag("RUNE_ANIMATOR_DONE_CLASSES") {
            self.lifecycle.use_done_classes = flag;
        }
        if let Some(flag) = env_flag("RUNE_ANIMATOR_VERIFY_KEYFRAMES") {
            self.lifecycle.verify_keyframes_exist = flag;
        }
        if let Some(flag) = env_flag("RUNE_ANIMATOR_STRICT_KEYFRAMES") {
            self.lifecycle.strict_keyframe_check = flag;
        }
        if let Some(flag) = env_flag("RUNE_ANIMATOR_PROBE_EVENTS") {
            self.vendor.probe_event_prefix = flag;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnimatorConfig::default();
        assert_eq!(config.classes.prefix, "au-");
        assert_eq!(config.classes.trigger, "au-animate");
        assert!(config.lifecycle.use_done_classes);
        assert!(!config.lifecycle.strict_keyframe_check);
        assert!(config.vendor.probe_event_prefix);
        assert_eq!(config.vendor.probe_duration_ms, 10);
    }

    #[test]
    fn test_stagger_classes() {
        let classes = ClassConfig::default();
        assert_eq!(classes.stagger_class(), "au-stagger");
        assert_eq!(classes.stagger_class_for("leave"), "au-stagger-leave");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnimatorConfig::from_toml_str(
            r#"
            [classes]
            prefix = "fx-"

            [lifecycle]
            strict_keyframe_check = true
            "#,
        )
        .unwrap();

        assert_eq!(config.classes.prefix, "fx-");
        assert_eq!(config.classes.entered, "au-entered");
        assert!(config.lifecycle.strict_keyframe_check);
        assert!(config.lifecycle.verify_keyframes_exist);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = AnimatorConfig::from_toml_str("[classes\nprefix = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = AnimatorConfig::load_from_file("does-not-exist/rune.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AnimatorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AnimatorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("RUNE_ANIMATOR_PREFIX", "x-");
            std::env::set_var("RUNE_ANIMATOR_DONE_CLASSES", "false");
            std::env::set_var("RUNE_ANIMATOR_STRICT_KEYFRAMES", "1");
        }

        let mut config = AnimatorConfig::default();
        config.merge_with_env();

        assert_eq!(config.classes.prefix, "x-");
        assert!(!config.lifecycle.use_done_classes);
        assert!(config.lifecycle.strict_keyframe_check);

        unsafe {
            std::env::remove_var("RUNE_ANIMATOR_PREFIX");
            std::env::remove_var("RUNE_ANIMATOR_DONE_CLASSES");
            std::env::remove_var("RUNE_ANIMATOR_STRICT_KEYFRAMES");
        }
    }
}
