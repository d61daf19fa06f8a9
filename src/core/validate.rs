/// Whole-content validation for authoring tools and content tests.
///
/// Unlike the repository loaders this never stops at the first problem:
/// every file is compiled on its own and every diagnostic is collected,
/// followed by the cross-reference checks between events, items and nodes.
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::compiler::CompileError;
use crate::core::content::ContentPaths;
use crate::core::repository::{
    check_event_file, check_item_file, check_node_file, content_files, LoadError,
};
use crate::core::template::TemplateContext;
use crate::schema::event::GameEvent;
use crate::schema::item::Item;
use crate::schema::node::MapNode;
use crate::schema::vocabulary::{Condition, Effect};

/// One problem found in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the problem was found in, when it belongs to one.
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    fn new(path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Everything `validate_content` found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentReport {
    pub events: usize,
    pub items: usize,
    pub nodes: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ContentReport {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push_at(&mut self, path: &Path, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(Some(path), message));
    }

    fn push_global(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(None, message));
    }

    fn push_load_error(&mut self, err: LoadError) {
        match err {
            LoadError::Compile {
                path,
                source: CompileError::InvalidEntries { messages, .. },
            } => {
                for message in messages {
                    self.push_at(&path, message);
                }
            }
            LoadError::Compile { path, source } => self.push_at(&path, source.to_string()),
            LoadError::Syntax { path, source } => {
                self.push_at(&path, format!("malformed content: {source}"))
            }
            LoadError::Io { path, source } => self.push_at(&path, source.to_string()),
            LoadError::MissingField { path, field } => {
                self.push_at(&path, format!("missing required field '{field}'."))
            }
            LoadError::EmptyField { path, field } => {
                self.push_at(&path, format!("required field '{field}' is empty."))
            }
            other => self.push_global(other.to_string()),
        }
    }
}

impl fmt::Display for ContentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        write!(
            f,
            "{} events, {} items, {} nodes checked: {} problem(s)",
            self.events,
            self.items,
            self.nodes,
            self.diagnostics.len()
        )
    }
}

/// Compile every file under `dir` independently, keeping the ones that
/// compile and reporting the rest along with duplicate ids.
fn load_all<T>(
    report: &mut ContentReport,
    dir: &Path,
    kind: &'static str,
    id_of: impl Fn(&T) -> &str,
    load: impl Fn(&Path) -> Result<T, Vec<LoadError>>,
) -> Vec<(PathBuf, T)> {
    let files = match content_files(dir) {
        Ok(files) => files,
        Err(err) => {
            report.push_load_error(err);
            return Vec::new();
        }
    };
    let mut seen = FxHashSet::default();
    let mut loaded = Vec::with_capacity(files.len());
    for path in files {
        match load(&path) {
            Ok(entry) => {
                if !seen.insert(id_of(&entry).to_string()) {
                    report.push_at(&path, format!("Duplicate {kind} id '{}'.", id_of(&entry)));
                    continue;
                }
                loaded.push((path, entry));
            }
            Err(errors) => {
                for err in errors {
                    report.push_load_error(err);
                }
            }
        }
    }
    loaded
}

struct KnownIds<'a> {
    events: FxHashSet<&'a str>,
    items: FxHashSet<&'a str>,
    nodes: FxHashSet<&'a str>,
}

impl KnownIds<'_> {
    /// Problems with the targets of `effect`, phrased for `owner`.
    fn check_effect(&self, owner: &str, effect: &Effect) -> Option<String> {
        match effect {
            Effect::GrantItem(id) if !self.items.contains(id.as_str()) => {
                Some(format!("{owner}: GrantItem '{id}' does not match any loaded item."))
            }
            Effect::TriggerEvent(id) if !self.events.contains(id.as_str()) => {
                Some(format!("{owner}: TriggerEvent '{id}' does not match any loaded event."))
            }
            _ => None,
        }
    }

    fn check_condition(&self, owner: &str, condition: &Condition) -> Option<String> {
        match condition {
            Condition::HasItem(id) if !self.items.contains(id.as_str()) => {
                Some(format!("{owner}: HasItem '{id}' does not match any loaded item."))
            }
            Condition::AtNodeKind(kind) if !self.nodes.contains(kind.as_str()) => {
                Some(format!("{owner}: node kind '{kind}' does not match any loaded node."))
            }
            _ => None,
        }
    }
}

fn check_events(report: &mut ContentReport, known: &KnownIds<'_>, events: &[(PathBuf, GameEvent)]) {
    for (path, event) in events {
        for option in &event.options {
            let owner = format!("Event '{}' option {}", event.id, option.order);
            if let Some(target) = &option.next_event_id {
                if !known.events.contains(target.as_str()) {
                    let err = LoadError::DanglingChain {
                        event_id: event.id.clone(),
                        order: option.order,
                        target: target.clone(),
                    };
                    report.push_at(path, err.to_string());
                }
            }
            let problems: Vec<String> = option
                .conditions
                .iter()
                .filter_map(|condition| known.check_condition(&owner, condition))
                .chain(
                    option
                        .effects
                        .iter()
                        .filter_map(|effect| known.check_effect(&owner, effect)),
                )
                .collect();
            for problem in problems {
                report.push_at(path, problem);
            }
        }
    }
}

fn check_items(report: &mut ContentReport, known: &KnownIds<'_>, items: &[(PathBuf, Item)]) {
    for (path, item) in items {
        let owner = format!("Item '{}'", item.id);
        let effects = item
            .effects_on_use
            .iter()
            .chain(&item.effects_on_equip)
            .chain(&item.effects_on_unequip);
        for effect in effects {
            if let Some(problem) = known.check_effect(&owner, effect) {
                report.push_at(path, problem);
            }
        }
    }
}

fn check_nodes(report: &mut ContentReport, known: &KnownIds<'_>, nodes: &[(PathBuf, MapNode)]) {
    for (path, node) in nodes {
        for event_id in node.event_ids() {
            if !known.events.contains(event_id) {
                report.push_at(
                    path,
                    format!(
                        "Node '{}': event '{event_id}' does not match any loaded event.",
                        node.kind
                    ),
                );
            }
        }
        for neighbour in node.possible_neighbours.keys() {
            if !known.nodes.contains(neighbour.as_str()) {
                let err = LoadError::UnknownNeighbour {
                    kind: node.kind.clone(),
                    neighbour: neighbour.clone(),
                };
                report.push_at(path, err.to_string());
            }
        }
    }
}

/// Load and check every content file under `paths`, reporting every problem.
pub fn validate_content(paths: &ContentPaths, context: &TemplateContext) -> ContentReport {
    let mut report = ContentReport::default();

    let events = load_all(&mut report, &paths.events, "event", |e: &GameEvent| e.id.as_str(), |path| {
        check_event_file(path, context)
    });
    let items = match &paths.items {
        Some(dir) => load_all(&mut report, dir, "item", |i: &Item| i.id.as_str(), check_item_file),
        None => Vec::new(),
    };
    let nodes = match &paths.nodes {
        Some(dir) => {
            load_all(&mut report, dir, "node", |n: &MapNode| n.kind.as_str(), check_node_file)
        }
        None => Vec::new(),
    };

    let known = KnownIds {
        events: events.iter().map(|(_, e)| e.id.as_str()).collect(),
        items: items.iter().map(|(_, i)| i.id.as_str()).collect(),
        nodes: nodes.iter().map(|(_, n)| n.kind.as_str()).collect(),
    };
    check_events(&mut report, &known, &events);
    check_items(&mut report, &known, &items);
    check_nodes(&mut report, &known, &nodes);

    report.events = events.len();
    report.items = items.len();
    report.nodes = nodes.len();
    tracing::info!(
        events = report.events,
        items = report.items,
        nodes = report.nodes,
        problems = report.diagnostics.len(),
        "content validated"
    );
    report
}
