/// Playtest: interactive shell for walking through saga content.
///
/// Usage: playtest <root> [--name <name>] [--birth boy|girl|omen] [--seed <n>]
///                 [--start <node kind>]
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use saga_engine::core::content::{ContentPaths, GameContent};
use saga_engine::core::evaluator::{
    apply, is_affordable, unequip_item, use_item, visible_options, EvaluationContext, Resolution,
};
use saga_engine::core::template::BirthChoice;
use saga_engine::schema::player::{Player, StartingTitle};
use saga_engine::schema::stats::StatId;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, ValueEnum)]
enum Birth {
    Boy,
    Girl,
    Omen,
}

impl From<Birth> for BirthChoice {
    fn from(birth: Birth) -> Self {
        match birth {
            Birth::Boy => BirthChoice::Boy,
            Birth::Girl => BirthChoice::Girl,
            Birth::Omen => BirthChoice::ChildOfOmen,
        }
    }
}

#[derive(Parser)]
#[command(name = "playtest")]
#[command(about = "Play through saga content from the terminal", version)]
struct Cli {
    /// Content root holding events/, items/ and nodes/
    root: PathBuf,

    /// Hero name
    #[arg(long, default_value = "Bjorn")]
    name: String,

    /// How the hero was born; picks the pronouns used in text
    #[arg(long, value_enum, default_value_t = Birth::Boy)]
    birth: Birth,

    /// Seed for title rolls, node picks and auto play
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Node kind to start at
    #[arg(long)]
    start: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct Session {
    content: GameContent,
    player: Player,
    node_kind: Option<String>,
    current: Option<String>,
    rng: StdRng,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let title = StartingTitle::roll(&mut rng);
    let player = Player::from_prologue(&cli.name, cli.birth.into(), title);
    let content = GameContent::builder()
        .paths(ContentPaths::from_root(&cli.root))
        .template_context(player.template_context())
        .build()
        .with_context(|| format!("loading content from '{}'", cli.root.display()))?;

    println!(
        "Loaded {} events, {} items, {} nodes",
        content.events().len(),
        content.items().len(),
        content.nodes().len()
    );
    println!("You are {} {}. Seed: {}", player.name, player.title, cli.seed);
    println!("Type 'help' for commands.\n");

    let mut session = Session {
        content,
        player,
        node_kind: None,
        current: None,
        rng,
    };
    if let Some(kind) = cli.start {
        session.arrive(&kind);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("saga> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        if let Ok(order) = cmd.parse::<i32>() {
            session.choose(order);
            continue;
        }

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "look" | "l" => session.show_event(),
            "event" => match parts.get(1) {
                Some(id) => session.start_event(id),
                None => println!("Usage: event <id>"),
            },
            "node" => match parts.get(1) {
                Some(kind) => session.arrive(kind),
                None => println!("Usage: node <kind>"),
            },
            "travel" => session.travel(),
            "auto" => {
                let steps = parts.get(1).and_then(|n| n.parse().ok()).unwrap_or(1);
                session.auto(steps);
            }
            "stats" => session.show_stats(),
            "inv" | "inventory" => session.show_inventory(),
            "use" => match parts.get(1).and_then(|n| n.parse().ok()) {
                Some(slot) => session.use_slot(slot),
                None => println!("Usage: use <slot>"),
            },
            "unequip" => match parts.get(1).and_then(|n| n.parse().ok()) {
                Some(slot) => session.unequip_slot(slot),
                None => println!("Usage: unequip <slot>"),
            },
            "reload" => match session.content.reload_with(session.player.template_context()) {
                Ok(()) => println!(
                    "Reloaded {} events, {} items, {} nodes",
                    session.content.events().len(),
                    session.content.items().len(),
                    session.content.nodes().len()
                ),
                Err(e) => println!("ERROR: {e}\nKeeping the previous content."),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help' for commands."),
        }
    }

    Ok(())
}

impl Session {
    fn context(&mut self) -> EvaluationContext<'_> {
        EvaluationContext::new(&mut self.player, self.content.items(), self.node_kind.as_deref())
    }

    fn arrive(&mut self, kind: &str) {
        if self.content.nodes().try_get_by_kind(kind).is_none() {
            println!("No node of kind '{kind}'.");
            return;
        }
        self.node_kind = Some(kind.to_string());
        println!("You arrive at {kind}.");
        match self.content.nodes().pick_event(kind, &mut self.rng) {
            Some(id) => {
                let id = id.to_string();
                self.start_event(&id);
            }
            None => println!("Nothing happens here."),
        }
    }

    fn travel(&mut self) {
        let Some(kind) = self.node_kind.clone() else {
            println!("You are not at any node. Use 'node <kind>' first.");
            return;
        };
        match self.content.nodes().pick_neighbour(&kind, &mut self.rng) {
            Some(next) => {
                let next = next.to_string();
                self.arrive(&next);
            }
            None => println!("There is nowhere to go from {kind}."),
        }
    }

    fn start_event(&mut self, id: &str) {
        if self.content.events().try_get_by_id(id).is_none() {
            println!("No event with id '{id}'.");
            return;
        }
        self.current = Some(id.to_string());
        self.show_event();
    }

    fn show_event(&mut self) {
        let Some(id) = self.current.clone() else {
            println!("No event in progress.");
            return;
        };
        let content = &self.content;
        let Ok(event) = content.events().get_by_id(&id) else {
            return;
        };
        let ctx =
            EvaluationContext::new(&mut self.player, content.items(), self.node_kind.as_deref());

        println!("\n=== {} ===", event.name);
        println!("{}\n", event.description);
        for option in visible_options(event, &ctx) {
            let cost = if option.display_cost && !option.costs.is_empty() {
                format!(" [{}]", option.cost_text())
            } else {
                String::new()
            };
            let locked = if is_affordable(option, &ctx) { "" } else { " (cannot afford)" };
            println!("  {}. {}{}{}", option.order, option.display_text, cost, locked);
        }
        println!();
    }

    fn choose(&mut self, order: i32) {
        let Some(id) = self.current.clone() else {
            println!("No event in progress.");
            return;
        };
        let content = &self.content;
        let Ok(event) = content.events().get_by_id(&id) else {
            return;
        };
        let mut ctx =
            EvaluationContext::new(&mut self.player, content.items(), self.node_kind.as_deref());
        let visible = visible_options(event, &ctx);
        let Some(option) = visible.into_iter().find(|o| o.order == order) else {
            println!("No visible option {order}.");
            return;
        };
        if !is_affordable(option, &ctx) {
            println!("You cannot afford that: {}.", option.cost_text());
            return;
        }
        match apply(option, &mut ctx) {
            Ok(resolution) => self.resolve(resolution),
            Err(e) => println!("ERROR: {e}"),
        }
    }

    fn resolve(&mut self, resolution: Resolution) {
        println!("\n{}", resolution.resolution_text);
        for line in &resolution.effect_lines {
            let mark = if line.is_positive { "+" } else { "-" };
            println!("  {mark} {}", line.text);
        }
        println!();

        if self.player.title != self.content.template_context().title {
            if let Err(e) = self.content.reload_with(self.player.template_context()) {
                println!("ERROR: {e}");
            }
        }

        if self.player.stats.is_game_over() {
            println!("Your saga ends here.");
            self.current = None;
            return;
        }
        match resolution.next_event_id {
            Some(next) => self.start_event(&next),
            None => {
                self.current = None;
                println!("The event ends. Type 'travel' to move on.");
            }
        }
    }

    /// Resolve `steps` events with random affordable choices.
    fn auto(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.current.is_none() {
                if self.node_kind.is_none() {
                    println!("Use 'node <kind>' or 'event <id>' before auto play.");
                    return;
                }
                self.travel();
                if self.current.is_none() {
                    return;
                }
            }
            let Some(id) = self.current.clone() else {
                return;
            };
            let content = &self.content;
            let Ok(event) = content.events().get_by_id(&id) else {
                return;
            };
            let ctx =
            EvaluationContext::new(&mut self.player, content.items(), self.node_kind.as_deref());
            let choices: Vec<i32> = visible_options(event, &ctx)
                .into_iter()
                .filter(|option| is_affordable(option, &ctx))
                .map(|option| option.order)
                .collect();
            let Some(&order) = choices.choose(&mut self.rng) else {
                println!("No affordable option; stuck at '{id}'.");
                return;
            };
            println!("> auto picks {order}");
            self.choose(order);
            if self.player.stats.is_game_over() {
                return;
            }
        }
    }

    fn show_stats(&self) {
        println!("{} {}", self.player.name, self.player.title);
        for stat in StatId::ALL {
            println!("  {:<12} {}", stat.name(), self.player.stats.get(stat));
        }
        if let Some(kind) = &self.node_kind {
            println!("  At: {kind}");
        }
    }

    fn show_inventory(&self) {
        for (slot, entry) in self.player.inventory.slots().iter().enumerate() {
            match entry {
                Some(item) => {
                    let charges = item
                        .remaining_charges
                        .map(|c| format!(" ({c} uses left)"))
                        .unwrap_or_default();
                    let cursed = if item.is_cursed { " [cursed]" } else { "" };
                    println!("  {slot}: {}{charges}{cursed}", item.name);
                }
                None => println!("  {slot}: (empty)"),
            }
        }
    }

    fn use_slot(&mut self, slot: usize) {
        let mut ctx = self.context();
        match use_item(&mut ctx, slot) {
            Ok(()) => self.show_inventory(),
            Err(e) => println!("ERROR: {e}"),
        }
    }

    fn unequip_slot(&mut self, slot: usize) {
        let mut ctx = self.context();
        match unequip_item(&mut ctx, slot) {
            Ok(Some(item)) => println!("You put away {}.", item.name),
            Ok(None) => println!("Slot {slot} is empty."),
            Err(e) => println!("ERROR: {e}"),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <n>             Choose option n of the current event");
    println!("  look            Show the current event again");
    println!("  event <id>      Start an event");
    println!("  node <kind>     Arrive at a node and fire its event");
    println!("  travel          Move to a neighbouring node");
    println!("  auto [steps]    Let the seeded rng choose for a while");
    println!("  stats           Show stats");
    println!("  inv             Show inventory");
    println!("  use <slot>      Use the item in a slot");
    println!("  unequip <slot>  Take off the item in a slot");
    println!("  reload          Reload content from disk");
    println!("  quit            Exit");
}
