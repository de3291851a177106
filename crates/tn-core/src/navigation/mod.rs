use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;

mod command;
mod engine;
mod handler;
mod identity;
mod stacks;

pub use command::{Command, CommandWithCallback};
pub use engine::Navigator;
pub use handler::TransactionHandler;
pub use identity::{ForeignTag, Identity, Transitions, TAG_PREFIX};
pub use stacks::StackOfStacks;

use crate::container::ViewRef;
use crate::error::{NavigatorError, Result};
use crate::state::NavigatorSettings;

/// Anything usable as a tab key
pub trait TabKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> TabKey for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Something that changed in the navigator
#[derive(Debug, Clone)]
pub enum NavigatorEvent<K> {
    /// The active tab changed
    TabSwitched { previous_tab: K, new_tab: K },
    /// A view was created and added to a stack
    ViewAdded { view: ViewRef, identity: Identity },
    /// A view left its stack
    ViewRemoved { view: ViewRef, identity: Identity },
    /// A view was popped and handed a result back to whoever is listening
    ViewRemovedWithResult {
        view: ViewRef,
        identity: Identity,
        result: serde_json::Value,
    },
}

impl<K> NavigatorEvent<K> {
    /// The view the event is about, if any
    pub fn view(&self) -> Option<&ViewRef> {
        match self {
            NavigatorEvent::TabSwitched { .. } => None,
            NavigatorEvent::ViewAdded { view, .. }
            | NavigatorEvent::ViewRemoved { view, .. }
            | NavigatorEvent::ViewRemovedWithResult { view, .. } => Some(view),
        }
    }
}

/// A root view and whether it detaches when its tab is not shown
#[derive(Debug, Clone)]
pub struct RootView {
    pub view: ViewRef,
    pub detachable: bool,
}

impl RootView {
    pub fn new(view: ViewRef, detachable: bool) -> Self {
        Self { view, detachable }
    }
}

/// Optional knobs for a push
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    pub transitions: Option<Transitions>,
    /// Falls back to [`NavigatorSettings::detach_by_default`]
    pub detachable: Option<bool>,
}

impl PushOptions {
    pub fn with_transitions(mut self, transitions: Transitions) -> Self {
        self.transitions = Some(transitions);
        self
    }

    pub fn detachable(mut self, detachable: bool) -> Self {
        self.detachable = Some(detachable);
        self
    }
}

#[derive(Clone)]
enum TabFactory {
    Plain(Arc<dyn Fn() -> ViewRef + Send + Sync>),
    WithDetachability(Arc<dyn Fn() -> RootView + Send + Sync>),
}

impl TabFactory {
    fn create(&self, settings: &NavigatorSettings) -> RootView {
        match self {
            TabFactory::Plain(factory) => RootView::new(factory(), settings.detach_by_default),
            TabFactory::WithDetachability(factory) => factory(),
        }
    }
}

/// Configures the tabs of a [`Navigator`]
pub struct NavigatorBuilder<K> {
    default_tab: K,
    tabs: IndexMap<K, TabFactory>,
    settings: NavigatorSettings,
}

impl<K: TabKey> NavigatorBuilder<K> {
    pub fn new(default_tab: K) -> Self {
        Self {
            default_tab,
            tabs: IndexMap::new(),
            settings: NavigatorSettings::default(),
        }
    }

    /// Add a tab whose root detachability follows the settings
    pub fn tab<F>(mut self, key: K, factory: F) -> Self
    where
        F: Fn() -> ViewRef + Send + Sync + 'static,
    {
        self.tabs.insert(key, TabFactory::Plain(Arc::new(factory)));
        self
    }

    /// Add a tab whose factory decides detachability per root
    pub fn tab_with_detachability<F>(mut self, key: K, factory: F) -> Self
    where
        F: Fn() -> RootView + Send + Sync + 'static,
    {
        self.tabs.insert(key, TabFactory::WithDetachability(Arc::new(factory)));
        self
    }

    pub fn settings(mut self, settings: NavigatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<Navigator<K>> {
        if !self.tabs.contains_key(&self.default_tab) {
            return Err(NavigatorError::UnknownTab(format!("{:?}", self.default_tab)));
        }
        Ok(Navigator::from_parts(self.default_tab, self.tabs, self.settings))
    }
}
