/// Content Linter: validates every event, item and node file under a content root.
///
/// Usage: content_linter <root> [--events <dir>] [--items <dir>] [--nodes <dir>] [--verbose]
use anyhow::Result;
use clap::Parser;
use saga_engine::core::content::{ContentPaths, GameContent};
use saga_engine::core::template::TemplateContext;
use saga_engine::core::validate::validate_content;
use saga_engine::schema::vocabulary::Effect;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "content_linter")]
#[command(about = "Check saga content files for errors and weak spots", version)]
struct Cli {
    /// Content root holding events/, items/ and nodes/
    root: PathBuf,

    /// Events directory, instead of <root>/events
    #[arg(long)]
    events: Option<PathBuf>,

    /// Items directory, instead of <root>/items
    #[arg(long)]
    items: Option<PathBuf>,

    /// Nodes directory, instead of <root>/nodes
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let mut paths = ContentPaths::from_root(&cli.root);
    if let Some(dir) = cli.events {
        paths.events = dir;
    }
    if cli.items.is_some() {
        paths.items = cli.items;
    }
    if cli.nodes.is_some() {
        paths.nodes = cli.nodes;
    }

    let report = validate_content(&paths, &TemplateContext::default());
    let warnings = if report.is_ok() {
        let content = GameContent::builder().paths(paths).build()?;
        lint_content(&content)
    } else {
        Vec::new()
    };

    println!("\n=== Content Lint Report ===\n");

    if report.is_ok() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {warning}");
    }

    for diagnostic in &report.diagnostics {
        println!("ERROR: {diagnostic}");
    }

    println!(
        "\nSummary: {} events, {} items, {} nodes; {} errors, {} warnings",
        report.events,
        report.items,
        report.nodes,
        report.diagnostics.len(),
        warnings.len()
    );

    if !report.is_ok() {
        process::exit(1);
    }
    Ok(())
}

/// Problems that do not stop the content from loading but that an author
/// probably wants to know about.
fn lint_content(content: &GameContent) -> Vec<String> {
    let mut warnings = Vec::new();

    for event in content.events().all() {
        if event.options.is_empty() {
            warnings.push(format!(
                "Event '{}' has no options; the player cannot leave it",
                event.id
            ));
        }
        for option in &event.options {
            if !option.costs.is_empty() && !option.display_cost {
                warnings.push(format!(
                    "Event '{}' option {} costs {} but does not show it (DisplayCost is false)",
                    event.id,
                    option.order,
                    option.cost_text()
                ));
            }
        }
    }

    // Entry points only exist once there are nodes to arrive at.
    if content.nodes().is_empty() {
        return warnings;
    }

    let mut reachable: HashSet<&str> = HashSet::new();
    for node in content.nodes().all() {
        reachable.extend(node.event_ids());
    }
    let item_effects = content.items().all().iter().flat_map(|item| {
        item.effects_on_use
            .iter()
            .chain(&item.effects_on_equip)
            .chain(&item.effects_on_unequip)
    });
    let option_effects = content
        .events()
        .all()
        .iter()
        .flat_map(|event| &event.options)
        .flat_map(|option| &option.effects);
    for effect in item_effects.chain(option_effects) {
        if let Effect::TriggerEvent(id) = effect {
            reachable.insert(id);
        }
    }
    for event in content.events().all() {
        for option in &event.options {
            if let Some(next) = &option.next_event_id {
                reachable.insert(next);
            }
        }
    }

    for event in content.events().all() {
        if !reachable.contains(event.id.as_str()) {
            warnings.push(format!(
                "Event '{}' is never reached from a node, a chain or a trigger",
                event.id
            ));
        }
    }

    warnings
}
