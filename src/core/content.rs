/// The full content set a game runs on, and where it comes from.
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::evaluator::EvaluationError;
use crate::core::repository::{
    EventRepository, ItemRepository, LoadError, LookupError, NodeRepository,
};
use crate::core::template::TemplateContext;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("No events directory configured.")]
    NoEventsDir,
}

/// Content directories. Only events are mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPaths {
    pub events: PathBuf,
    pub items: Option<PathBuf>,
    pub nodes: Option<PathBuf>,
}

impl ContentPaths {
    pub const EVENTS_DIR: &'static str = "events";
    pub const ITEMS_DIR: &'static str = "items";
    pub const NODES_DIR: &'static str = "nodes";

    /// `root/events`, plus `root/items` and `root/nodes` when they exist.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let optional = |name: &str| Some(root.join(name)).filter(|dir| dir.is_dir());
        Self {
            events: root.join(Self::EVENTS_DIR),
            items: optional(Self::ITEMS_DIR),
            nodes: optional(Self::NODES_DIR),
        }
    }
}

/// Loaded events, items and nodes. Built via `GameContent::builder()`.
#[derive(Debug, Clone)]
pub struct GameContent {
    paths: ContentPaths,
    template_context: TemplateContext,
    events: EventRepository,
    items: ItemRepository,
    nodes: NodeRepository,
}

#[derive(Debug, Default)]
pub struct GameContentBuilder {
    events_dir: Option<PathBuf>,
    items_dir: Option<PathBuf>,
    nodes_dir: Option<PathBuf>,
    template_context: Option<TemplateContext>,
}

impl GameContent {
    pub fn builder() -> GameContentBuilder {
        GameContentBuilder::default()
    }

    fn load(paths: ContentPaths, template_context: TemplateContext) -> Result<Self, ContentError> {
        let items = match &paths.items {
            Some(dir) => ItemRepository::load_from_dir(dir)?,
            None => ItemRepository::default(),
        };
        let nodes = match &paths.nodes {
            Some(dir) => NodeRepository::load_from_dir(dir)?,
            None => NodeRepository::default(),
        };
        let events = EventRepository::load_from_dir(&paths.events, &template_context)?;
        Ok(Self {
            paths,
            template_context,
            events,
            items,
            nodes,
        })
    }

    /// Load everything again from the same directories. On failure the
    /// current content stays in place.
    pub fn reload(&mut self) -> Result<(), ContentError> {
        self.reload_with(self.template_context.clone())
    }

    /// Reload, rendering event text for a different hero.
    pub fn reload_with(&mut self, template_context: TemplateContext) -> Result<(), ContentError> {
        match Self::load(self.paths.clone(), template_context) {
            Ok(content) => {
                *self = content;
                tracing::info!(
                    events = self.events.len(),
                    items = self.items.len(),
                    nodes = self.nodes.len(),
                    "content reloaded"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "reload failed, keeping previous content");
                Err(err)
            }
        }
    }

    pub fn events(&self) -> &EventRepository {
        &self.events
    }

    pub fn items(&self) -> &ItemRepository {
        &self.items
    }

    pub fn nodes(&self) -> &NodeRepository {
        &self.nodes
    }

    pub fn paths(&self) -> &ContentPaths {
        &self.paths
    }

    pub fn template_context(&self) -> &TemplateContext {
        &self.template_context
    }
}

impl GameContentBuilder {
    /// Take every directory from `paths`.
    pub fn paths(mut self, paths: ContentPaths) -> Self {
        self.events_dir = Some(paths.events);
        self.items_dir = paths.items;
        self.nodes_dir = paths.nodes;
        self
    }

    pub fn events_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.events_dir = Some(path.into());
        self
    }

    pub fn items_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.items_dir = Some(path.into());
        self
    }

    pub fn nodes_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.nodes_dir = Some(path.into());
        self
    }

    pub fn template_context(mut self, context: TemplateContext) -> Self {
        self.template_context = Some(context);
        self
    }

    pub fn build(self) -> Result<GameContent, ContentError> {
        let paths = ContentPaths {
            events: self.events_dir.ok_or(ContentError::NoEventsDir)?,
            items: self.items_dir,
            nodes: self.nodes_dir,
        };
        let content = GameContent::load(paths, self.template_context.unwrap_or_default())?;
        tracing::info!(
            events = content.events.len(),
            items = content.items.len(),
            nodes = content.nodes.len(),
            "content loaded"
        );
        Ok(content)
    }
}
