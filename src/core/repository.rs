/// Directory-backed content repositories.
///
/// Each repository scans one directory of `.ron` files in file-name order,
/// compiles every file and indexes the results by id. Loading is all or
/// nothing: a repository is only handed out once every file compiled and
/// every cross-file check passed, and `reload` swaps the whole set at once.
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::compiler::{compile_event, compile_item, compile_node, CompileError};
use crate::core::template::TemplateContext;
use crate::schema::definition::{GameEventDefinition, ItemDefinition, MapNodeDefinition};
use crate::schema::event::{GameEvent, GameEventOption};
use crate::schema::item::Item;
use crate::schema::node::MapNode;
use crate::schema::vocabulary::Effect;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Content directory '{}' does not exist.", .0.display())]
    MissingDirectory(PathBuf),
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed content in '{}': {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("'{}' is missing required field '{field}'.", path.display())]
    MissingField { path: PathBuf, field: String },
    #[error("'{}' has an empty required field '{field}'.", path.display())]
    EmptyField { path: PathBuf, field: &'static str },
    #[error("'{}': {source}", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },
    #[error("Duplicate {kind} id '{id}'{}.", located(.path))]
    DuplicateId {
        kind: &'static str,
        id: String,
        path: Option<PathBuf>,
    },
    #[error("Event '{event_id}' option {order}: NextEventId '{target}' does not match any loaded event.")]
    DanglingChain {
        event_id: String,
        order: i32,
        target: String,
    },
    #[error("Item '{item_id}' grants unknown item '{target}'.")]
    UnknownItemGrant { item_id: String, target: String },
    #[error("Node '{kind}' lists unknown neighbour kind '{neighbour}'.")]
    UnknownNeighbour { kind: String, neighbour: String },
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" in '{}'", path.display()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No event found with id '{0}'.")]
    EventNotFound(String),
    #[error("No item found with id '{0}'.")]
    ItemNotFound(String),
    #[error("No node found with kind '{0}'.")]
    NodeNotFound(String),
}

/// `.ron` files directly inside `dir`, sorted by file name.
pub(crate) fn content_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_definition<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| {
        if let ron::Error::MissingStructField { field, .. } = &source.code {
            return LoadError::MissingField {
                path: path.to_path_buf(),
                field: field.to_string(),
            };
        }
        LoadError::Syntax {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// One `EmptyField` per blank entry in `fields`, in order.
fn blank_fields<'a>(
    path: &Path,
    fields: impl IntoIterator<Item = (&'static str, &'a str)>,
) -> Vec<LoadError> {
    fields
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| LoadError::EmptyField {
            path: path.to_path_buf(),
            field,
        })
        .collect()
}

fn event_fields(definition: &GameEventDefinition) -> Vec<(&'static str, &str)> {
    let mut fields = vec![
        ("Id", definition.id.as_str()),
        ("Name", definition.name.as_str()),
        ("Description", definition.description.as_str()),
    ];
    for option in &definition.options {
        fields.push(("DisplayText", option.display_text.as_str()));
        fields.push(("ResolutionText", option.resolution_text.as_str()));
    }
    fields
}

fn item_fields(definition: &ItemDefinition) -> [(&'static str, &str); 3] {
    [
        ("Id", definition.id.as_str()),
        ("Name", definition.name.as_str()),
        ("Description", definition.description.as_str()),
    ]
}

fn node_fields(definition: &MapNodeDefinition) -> [(&'static str, &str); 3] {
    [
        ("Kind", definition.kind.as_str()),
        ("Name", definition.name.as_str()),
        ("Description", definition.description.as_str()),
    ]
}

fn compiled<T>(path: &Path, result: Result<T, CompileError>) -> Result<T, LoadError> {
    result.map_err(|source| LoadError::Compile {
        path: path.to_path_buf(),
        source,
    })
}

/// Blank-field errors first, then the compile error. A missing id is
/// already reported as a blank field and is not repeated.
fn gather_errors<T>(
    path: &Path,
    mut errors: Vec<LoadError>,
    result: Result<T, CompileError>,
) -> Result<T, Vec<LoadError>> {
    match result {
        Ok(entry) if errors.is_empty() => return Ok(entry),
        Ok(_) => {}
        Err(CompileError::MissingEventId)
        | Err(CompileError::MissingItemId)
        | Err(CompileError::MissingNodeKind)
            if !errors.is_empty() => {}
        Err(source) => errors.push(LoadError::Compile {
            path: path.to_path_buf(),
            source,
        }),
    }
    Err(errors)
}

/// Read, check and compile one event file, stopping at the first problem.
fn load_event_file(
    path: &Path,
    context: &TemplateContext,
) -> Result<GameEvent, LoadError> {
    let definition: GameEventDefinition = read_definition(path)?;
    if let Some(err) = blank_fields(path, event_fields(&definition)).into_iter().next() {
        return Err(err);
    }
    let event = compiled(path, compile_event(&definition, context))?;
    tracing::debug!(
        path = %path.display(),
        id = %event.id,
        options = event.options.len(),
        "compiled event"
    );
    Ok(event)
}

/// Like `load_event_file`, but reports every blank field and every bad
/// entry in the file together.
pub(crate) fn check_event_file(
    path: &Path,
    context: &TemplateContext,
) -> Result<GameEvent, Vec<LoadError>> {
    let definition: GameEventDefinition = read_definition(path).map_err(|err| vec![err])?;
    let errors = blank_fields(path, event_fields(&definition));
    gather_errors(path, errors, compile_event(&definition, context))
}

fn load_item_file(path: &Path) -> Result<Item, LoadError> {
    let definition: ItemDefinition = read_definition(path)?;
    if let Some(err) = blank_fields(path, item_fields(&definition)).into_iter().next() {
        return Err(err);
    }
    let item = compiled(path, compile_item(&definition))?;
    tracing::debug!(path = %path.display(), id = %item.id, "compiled item");
    Ok(item)
}

pub(crate) fn check_item_file(path: &Path) -> Result<Item, Vec<LoadError>> {
    let definition: ItemDefinition = read_definition(path).map_err(|err| vec![err])?;
    let errors = blank_fields(path, item_fields(&definition));
    gather_errors(path, errors, compile_item(&definition))
}

fn load_node_file(path: &Path) -> Result<MapNode, LoadError> {
    let definition: MapNodeDefinition = read_definition(path)?;
    if let Some(err) = blank_fields(path, node_fields(&definition)).into_iter().next() {
        return Err(err);
    }
    let node = compiled(path, compile_node(&definition))?;
    tracing::debug!(path = %path.display(), kind = %node.kind, "compiled node");
    Ok(node)
}

pub(crate) fn check_node_file(path: &Path) -> Result<MapNode, Vec<LoadError>> {
    let definition: MapNodeDefinition = read_definition(path).map_err(|err| vec![err])?;
    let errors = blank_fields(path, node_fields(&definition));
    gather_errors(path, errors, compile_node(&definition))
}

/// Entries in load order plus an id index.
#[derive(Debug, Clone)]
struct Catalog<T> {
    entries: Vec<T>,
    index: FxHashMap<String, usize>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T> Catalog<T> {
    /// Hands the entry back when the id is already taken.
    fn insert(&mut self, id: &str, entry: T) -> Result<(), T> {
        if self.index.contains_key(id) {
            return Err(entry);
        }
        self.index.insert(id.to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

fn duplicate(kind: &'static str, id: &str, path: Option<&Path>) -> LoadError {
    LoadError::DuplicateId {
        kind,
        id: id.to_string(),
        path: path.map(Path::to_path_buf),
    }
}

/// Compiled events, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct EventRepository {
    events: Catalog<GameEvent>,
}

impl EventRepository {
    /// Load every event file in `dir`, rendering text with `context`.
    pub fn load_from_dir(
        dir: impl AsRef<Path>,
        context: &TemplateContext,
    ) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let mut events = Catalog::default();
        for path in content_files(dir)? {
            let event = load_event_file(&path, context)?;
            let id = event.id.clone();
            events
                .insert(&id, event)
                .map_err(|_| duplicate("event", &id, Some(&path)))?;
        }
        let repository = Self { events };
        repository.validate_chains()?;
        tracing::info!(dir = %dir.display(), events = repository.len(), "loaded events");
        Ok(repository)
    }

    /// Build from already compiled events, with the same checks as a load.
    pub fn from_events(events: impl IntoIterator<Item = GameEvent>) -> Result<Self, LoadError> {
        let mut catalog = Catalog::default();
        for event in events {
            let id = event.id.clone();
            catalog.insert(&id, event).map_err(|_| duplicate("event", &id, None))?;
        }
        let repository = Self { events: catalog };
        repository.validate_chains()?;
        Ok(repository)
    }

    /// Replace the whole set with the contents of `dir`. On failure the
    /// current set is left as it was.
    pub fn reload(
        &mut self,
        dir: impl AsRef<Path>,
        context: &TemplateContext,
    ) -> Result<(), LoadError> {
        *self = Self::load_from_dir(dir, context)?;
        Ok(())
    }

    fn validate_chains(&self) -> Result<(), LoadError> {
        for event in &self.events.entries {
            for option in &event.options {
                if let Some(target) = &option.next_event_id {
                    if !self.events.contains(target) {
                        return Err(LoadError::DanglingChain {
                            event_id: event.id.clone(),
                            order: option.order,
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Every event, in load order.
    pub fn all(&self) -> &[GameEvent] {
        &self.events.entries
    }

    pub fn len(&self) -> usize {
        self.events.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.entries.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&GameEvent, LookupError> {
        self.try_get_by_id(id)
            .ok_or_else(|| LookupError::EventNotFound(id.to_string()))
    }

    pub fn try_get_by_id(&self, id: &str) -> Option<&GameEvent> {
        self.events.get(id)
    }

    /// The event `option` chains to, if it chains at all.
    pub fn try_get_next_event(&self, option: &GameEventOption) -> Option<&GameEvent> {
        option
            .next_event_id
            .as_deref()
            .and_then(|id| self.try_get_by_id(id))
    }
}

/// Compiled items, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ItemRepository {
    items: Catalog<Item>,
}

impl ItemRepository {
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let mut items = Catalog::default();
        for path in content_files(dir)? {
            let item = load_item_file(&path)?;
            let id = item.id.clone();
            items
                .insert(&id, item)
                .map_err(|_| duplicate("item", &id, Some(&path)))?;
        }
        let repository = Self { items };
        repository.validate_grants()?;
        tracing::info!(dir = %dir.display(), items = repository.len(), "loaded items");
        Ok(repository)
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Result<Self, LoadError> {
        let mut catalog = Catalog::default();
        for item in items {
            let id = item.id.clone();
            catalog.insert(&id, item).map_err(|_| duplicate("item", &id, None))?;
        }
        let repository = Self { items: catalog };
        repository.validate_grants()?;
        Ok(repository)
    }

    pub fn reload(&mut self, dir: impl AsRef<Path>) -> Result<(), LoadError> {
        *self = Self::load_from_dir(dir)?;
        Ok(())
    }

    // Items that grant items must name items in this set, so an item's own
    // effects can always be applied.
    fn validate_grants(&self) -> Result<(), LoadError> {
        for item in &self.items.entries {
            let effects = item
                .effects_on_use
                .iter()
                .chain(&item.effects_on_equip)
                .chain(&item.effects_on_unequip);
            for effect in effects {
                if let Effect::GrantItem(target) = effect {
                    if !self.items.contains(target) {
                        return Err(LoadError::UnknownItemGrant {
                            item_id: item.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn all(&self) -> &[Item] {
        &self.items.entries
    }

    pub fn len(&self) -> usize {
        self.items.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.entries.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Item, LookupError> {
        self.try_get_by_id(id)
            .ok_or_else(|| LookupError::ItemNotFound(id.to_string()))
    }

    pub fn try_get_by_id(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }
}

/// Compiled map nodes, indexed by kind.
#[derive(Debug, Clone, Default)]
pub struct NodeRepository {
    nodes: Catalog<MapNode>,
}

impl NodeRepository {
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let mut nodes = Catalog::default();
        for path in content_files(dir)? {
            let node = load_node_file(&path)?;
            let kind = node.kind.clone();
            nodes
                .insert(&kind, node)
                .map_err(|_| duplicate("node", &kind, Some(&path)))?;
        }
        let repository = Self { nodes };
        repository.validate_neighbours()?;
        tracing::info!(dir = %dir.display(), nodes = repository.len(), "loaded nodes");
        Ok(repository)
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = MapNode>) -> Result<Self, LoadError> {
        let mut catalog = Catalog::default();
        for node in nodes {
            let kind = node.kind.clone();
            catalog.insert(&kind, node).map_err(|_| duplicate("node", &kind, None))?;
        }
        let repository = Self { nodes: catalog };
        repository.validate_neighbours()?;
        Ok(repository)
    }

    pub fn reload(&mut self, dir: impl AsRef<Path>) -> Result<(), LoadError> {
        *self = Self::load_from_dir(dir)?;
        Ok(())
    }

    fn validate_neighbours(&self) -> Result<(), LoadError> {
        for node in &self.nodes.entries {
            if let Some(neighbour) = node
                .possible_neighbours
                .keys()
                .find(|neighbour| !self.nodes.contains(neighbour))
            {
                return Err(LoadError::UnknownNeighbour {
                    kind: node.kind.clone(),
                    neighbour: neighbour.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn all(&self) -> &[MapNode] {
        &self.nodes.entries
    }

    pub fn len(&self) -> usize {
        self.nodes.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.entries.is_empty()
    }

    pub fn get_by_kind(&self, kind: &str) -> Result<&MapNode, LookupError> {
        self.try_get_by_kind(kind)
            .ok_or_else(|| LookupError::NodeNotFound(kind.to_string()))
    }

    pub fn try_get_by_kind(&self, kind: &str) -> Option<&MapNode> {
        self.nodes.get(kind)
    }

    /// The event to fire on arriving at a node of `kind`: the forced first
    /// event if there is one, otherwise a uniform pick from the pool.
    pub fn pick_event<R: Rng + ?Sized>(&self, kind: &str, rng: &mut R) -> Option<&str> {
        let node = self.try_get_by_kind(kind)?;
        if let Some(forced) = &node.forced_first_event {
            return Some(forced.as_str());
        }
        node.events_pool.choose(rng).map(String::as_str)
    }

    /// Weighted pick of the kind of node that lies next to `kind`. `None`
    /// when the node has no neighbours or every weight is zero.
    pub fn pick_neighbour<R: Rng + ?Sized>(&self, kind: &str, rng: &mut R) -> Option<&str> {
        let node = self.try_get_by_kind(kind)?;
        let weights = WeightedIndex::new(node.possible_neighbours.values().copied()).ok()?;
        node.possible_neighbours
            .keys()
            .nth(weights.sample(rng))
            .map(String::as_str)
    }
}
