use std::cell::RefCell;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rune_animator::platform::{CssRule, StyleSheet};
use rune_animator::{CssAnimation, CssAnimator, HeadlessDom, NodeId};
use rune_config::{AnimatorConfig, ClassConfig};

/// Upper bound on play/poll rounds before giving up on a scenario.
const MAX_ROUNDS: usize = 256;

#[derive(Parser)]
#[command(name = "rune-animate")]
#[command(author, version, about = "Trace CSS animation lifecycles against an in-memory document")]
struct Cli {
    /// Lifecycle to run
    #[arg(short, long, value_enum, default_value_t = Scenario::Enter)]
    scenario: Scenario,

    /// Configuration file (defaults to ./rune.toml with environment overrides)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of sibling elements; more than one opts them into staggering
    #[arg(long, default_value_t = 1)]
    stagger: usize,

    /// DOM vendor prefix the document requires (`webkit`, `Moz`, ...)
    #[arg(long)]
    vendor: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Enter every element
    Enter,
    /// Leave every element
    Leave,
    /// Add then remove `pulse` on every element
    Animate,
    /// Animate the elements one after another
    Sequence,
    /// Enter in strict mode without any `@keyframes` rules loaded
    MissingKeyframes,
}

type Outcomes = Rc<RefCell<Vec<(String, bool)>>>;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnimatorConfig::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AnimatorConfig::load(),
    };
    if cli.scenario == Scenario::MissingKeyframes {
        config.lifecycle.strict_keyframe_check = true;
        config.lifecycle.verify_keyframes_exist = true;
    }

    let dom = Rc::new(match &cli.vendor {
        Some(prefix) => HeadlessDom::with_vendor_prefix(prefix),
        None => HeadlessDom::new(),
    });
    let count = cli.stagger.max(1);
    install_styles(&dom, &config.classes, cli.scenario != Scenario::MissingKeyframes);
    let elements = populate(&dom, &config.classes, count);

    let animator = CssAnimator::with_config(Rc::clone(&dom), config)?;
    info!(prefix = %animator.registry().prefix(), scenario = ?cli.scenario, elements = count, "running scenario");

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let outcomes: Outcomes = Rc::new(RefCell::new(Vec::new()));

    match cli.scenario {
        Scenario::Enter | Scenario::MissingKeyframes => {
            for element in &elements {
                track(&spawner, &outcomes, format!("enter #{}", element.0), animator.enter(element))?;
            }
        }
        Scenario::Leave => {
            for element in &elements {
                track(&spawner, &outcomes, format!("leave #{}", element.0), animator.leave(element))?;
            }
        }
        Scenario::Animate => {
            for element in &elements {
                track(
                    &spawner,
                    &outcomes,
                    format!("animate #{}", element.0),
                    animator.animate(element, "pulse"),
                )?;
            }
        }
        Scenario::Sequence => {
            let steps = elements
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    let class_name = if index % 2 == 0 { "pulse" } else { "shake" };
                    CssAnimation::new(*element, class_name)
                })
                .collect();
            track(&spawner, &outcomes, "sequence".to_string(), animator.run_sequence(steps))?;
        }
    }

    drive(&dom, &mut pool);
    report(&dom, &elements, &outcomes.borrow());
    Ok(())
}

/// Sample stylesheet: lifecycle classes carry animations, the stagger class
/// carries a delay.
fn install_styles(dom: &HeadlessDom, classes: &ClassConfig, with_keyframes: bool) {
    let prefix = &classes.prefix;
    let animated = [
        (format!("{prefix}enter-active"), "fade-in"),
        (format!("{prefix}leave-active"), "fade-out"),
        ("pulse-add".to_string(), "pulse"),
        ("shake-add".to_string(), "shake"),
    ];
    for (class, animation) in &animated {
        dom.define_class_style(class, "animation-name", animation);
        dom.define_class_style(class, "animation-duration", "200ms");
    }
    dom.define_class_style(&classes.stagger_class(), "animation-delay", "40ms");

    if with_keyframes {
        let mut rules = vec![CssRule::style()];
        rules.extend(animated.iter().map(|(_, animation)| CssRule::keyframes(*animation)));
        dom.add_style_sheet(StyleSheet::new(rules));
    }
}

fn populate(dom: &HeadlessDom, classes: &ClassConfig, count: usize) -> Vec<NodeId> {
    let list = dom.create_child(dom.body(), "ul");
    let stagger = classes.stagger_class();
    (0..count)
        .map(|_| {
            let item = dom.create_child(list, "li");
            if count > 1 {
                dom.set_classes(item, &[classes.trigger.as_str(), stagger.as_str()]);
            } else {
                dom.set_classes(item, &[classes.trigger.as_str()]);
            }
            item
        })
        .collect()
}

fn track(
    spawner: &LocalSpawner,
    outcomes: &Outcomes,
    label: String,
    future: impl Future<Output = bool> + 'static,
) -> Result<()> {
    let outcomes = Rc::clone(outcomes);
    spawner.spawn_local(async move {
        let played = future.await;
        outcomes.borrow_mut().push((label, played));
    })?;
    Ok(())
}

/// Poll until stalled, then let the document play pending animations and
/// timers; repeat until nothing moves.
fn drive(dom: &HeadlessDom, pool: &mut LocalPool) {
    for round in 0..MAX_ROUNDS {
        pool.run_until_stalled();
        let played = dom.complete_animations();
        let timers = dom.run_timers();
        debug!(round, played, timers, now_ms = dom.now_ms(), "document settled a round");
        if played == 0 && timers == 0 {
            pool.run_until_stalled();
            return;
        }
    }
    warn!(rounds = MAX_ROUNDS, "scenario did not settle");
}

fn report(dom: &HeadlessDom, elements: &[NodeId], outcomes: &[(String, bool)]) {
    println!("events:");
    for event in dom.dispatched() {
        match event.detail {
            Some(node) => println!("  {:<22} #{}", event.name, node.0),
            None => println!("  {}", event.name),
        }
    }

    println!("outcomes:");
    for (label, played) in outcomes {
        println!("  {label}: {}", if *played { "played" } else { "skipped" });
    }

    println!("classes:");
    for element in elements {
        println!("  #{}: {}", element.0, dom.classes(*element).join(" "));
    }
    println!("virtual time: {}ms", dom.now_ms());
}
