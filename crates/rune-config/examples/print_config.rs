/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    // rune.toml plus RUNE_ANIMATOR_* overrides
    let config = rune_config::AnimatorConfig::load();

    println!("=== Rune Animator Configuration ===\n");

    println!("Classes:");
    println!("  Prefix: {:?}", config.classes.prefix);
    println!("  Trigger: {:?}", config.classes.trigger);
    println!("  Entered: {:?}", config.classes.entered);
    println!("  Left: {:?}", config.classes.left);
    println!("  Stagger: {:?}", config.classes.stagger_class());
    println!();

    println!("Lifecycle:");
    println!("  Done Classes: {}", config.lifecycle.use_done_classes);
    println!("  Verify Keyframes: {}", config.lifecycle.verify_keyframes_exist);
    println!("  Strict Keyframe Check: {}", config.lifecycle.strict_keyframe_check);
    println!();

    println!("Vendor:");
    println!("  Probe Events: {}", config.vendor.probe_event_prefix);
    println!("  Probe Animation: {:?}", config.vendor.probe_animation_name);
    println!("  Probe Duration: {}ms", config.vendor.probe_duration_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
