//! Navigator implementation

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use super::command::{Command, CommandWithCallback};
use super::handler::TransactionHandler;
use super::identity::Identity;
use super::stacks::StackOfStacks;
use super::{NavigatorBuilder, NavigatorEvent, PushOptions, RootView, TabFactory, TabKey};
use crate::container::{ViewContainer, ViewRef};
use crate::error::{NavigatorError, Result};
use crate::events::EventStream;
use crate::state::NavigatorSettings;

/// Navigation state stored internally
struct NavigatorState<K> {
    stacks: StackOfStacks<K, Identity>,
    /// Consecutive selector taps on the active tab
    same_tab_taps: usize,
}

enum Step<K> {
    Emit(NavigatorEvent<K>),
    Apply(Command, Vec<NavigatorEvent<K>>),
}

/// What one operation wants done once the state lock is released
struct Plan<K> {
    steps: Vec<Step<K>>,
}

impl<K> Plan<K> {
    fn new() -> Self {
        Self { steps: Vec::new() }
    }

    fn emit(&mut self, event: NavigatorEvent<K>) {
        self.steps.push(Step::Emit(event));
    }

    fn apply(&mut self, command: Command, events: Vec<NavigatorEvent<K>>) {
        self.steps.push(Step::Apply(command, events));
    }
}

/// Tab navigator: one view stack per tab, one active tab.
///
/// Every operation first updates the stacks, then releases its lock and
/// hands commands to the attached container. Events are delivered after all
/// of an operation's commands committed, so subscribers may call back into
/// the navigator.
///
/// Share it as an `Arc<Navigator<K>>`, but drive it from one thread: the
/// stacks are updated under a lock while commits happen after it is
/// released, so operations racing on two threads may reach the container
/// in a different order than they changed the stacks.
pub struct Navigator<K: TabKey> {
    default_tab: K,
    tabs: IndexMap<K, TabFactory>,
    settings: NavigatorSettings,
    state: Mutex<NavigatorState<K>>,
    handler: RwLock<Option<TransactionHandler>>,
    events: EventStream<NavigatorEvent<K>>,
    scroll_to_top: EventStream<ViewRef>,
}

impl<K: TabKey> Navigator<K> {
    /// Start configuring a navigator
    pub fn builder(default_tab: K) -> NavigatorBuilder<K> {
        NavigatorBuilder::new(default_tab)
    }

    pub(super) fn from_parts(
        default_tab: K,
        tabs: IndexMap<K, TabFactory>,
        settings: NavigatorSettings,
    ) -> Self {
        Self {
            default_tab,
            tabs,
            settings,
            state: Mutex::new(NavigatorState {
                stacks: StackOfStacks::new(),
                same_tab_taps: 0,
            }),
            handler: RwLock::new(None),
            events: EventStream::new(),
            scroll_to_top: EventStream::new(),
        }
    }

    /// Connect to a view container.
    ///
    /// Purges navigator views the container holds but we do not track, then
    /// either seeds the default tab or re-shows the current top.
    pub fn attach(&self, container: Arc<dyn ViewContainer>) -> Result<()> {
        let handler = TransactionHandler::new(container);

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;

            let known: Vec<Identity> = state.stacks.values().cloned().collect();
            tracing::info!("Attaching navigator ({} tracked views)", known.len());
            plan.apply(Command::RemoveUnknown { known }, Vec::new());

            match state.stacks.peek_value().cloned() {
                Some(top) => {
                    handler.require(&top)?;
                    plan.apply(Command::ShowExisting { identity: top }, Vec::new());
                }
                None => {
                    let tab = self.default_tab.clone();
                    self.seed_root(&mut state, &tab, &mut plan)?;
                }
            }
        }

        *self.handler.write() = Some(handler.clone());
        self.dispatch(&handler, plan)
    }

    /// Disconnect from the container and release every subscriber
    pub fn detach(&self) {
        self.handler.write().take();
        self.events.clear();
        self.scroll_to_top.clear();
        tracing::info!("Navigator detached");
    }

    pub fn is_attached(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Push a view onto the active tab
    pub fn push(&self, view: ViewRef) -> Result<()> {
        self.push_with(view, None, PushOptions::default())
    }

    /// Push a view onto `tab`, switching to it first
    pub fn push_to(&self, tab: K, view: ViewRef) -> Result<()> {
        self.push_with(view, Some(tab), PushOptions::default())
    }

    /// Push a view with explicit transitions and detachability
    pub fn push_with(&self, view: ViewRef, tab: Option<K>, options: PushOptions) -> Result<()> {
        let handler = self.handler()?;
        if let Some(tab) = &tab {
            self.check_tab(tab)?;
        }

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;

            let tab = match tab {
                Some(tab) => tab,
                None => self.active_tab(&state),
            };
            self.activate(&mut state, &handler, &tab, &mut plan)?;

            let detachable = options.detachable.unwrap_or(self.settings.detach_by_default);
            let identity = Identity::new(view.type_name(), detachable, options.transitions);
            tracing::debug!("Pushing {} onto tab {:?}", identity.type_name(), tab);

            state.stacks.push(tab, identity.clone());
            plan.apply(
                Command::AddAndShow { view: view.clone(), identity: identity.clone() },
                vec![NavigatorEvent::ViewAdded { view, identity }],
            );
        }

        self.dispatch(&handler, plan)
    }

    /// Pop the top view. `Ok(false)` when only one view is left anywhere.
    pub fn pop(&self) -> Result<bool> {
        self.pop_inner(None)
    }

    /// Pop the top view and hand `result` to event subscribers
    pub fn pop_with_result(&self, result: serde_json::Value) -> Result<bool> {
        self.pop_inner(Some(result))
    }

    fn pop_inner(&self, result: Option<serde_json::Value>) -> Result<bool> {
        let handler = self.handler()?;

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();

            let Some((tab, top)) = state.stacks.peek().map(|(k, v)| (k.clone(), v.clone())) else {
                return Ok(false);
            };

            // The view revealed by the pop: next one down, or the top of the
            // most recently used other tab
            let stack = state.stacks.get(&tab).unwrap_or_default();
            let next = if stack.len() >= 2 {
                Some((tab.clone(), stack[stack.len() - 2].clone()))
            } else {
                state
                    .stacks
                    .iter()
                    .rev()
                    .nth(1)
                    .and_then(|(key, stack)| stack.last().map(|top| (key.clone(), top.clone())))
            };
            let Some((next_tab, next_top)) = next else {
                tracing::debug!("Nothing to pop on tab {:?}", tab);
                return Ok(false);
            };

            let view = handler.require(&top)?;
            handler.require(&next_top)?;

            state.same_tab_taps = 0;
            state.stacks.pop();
            tracing::debug!("Popped {} from tab {:?}", top.type_name(), tab);

            if next_tab != tab {
                plan.emit(NavigatorEvent::TabSwitched { previous_tab: tab, new_tab: next_tab });
            }
            let event = match result {
                Some(result) => NavigatorEvent::ViewRemovedWithResult { view, identity: top.clone(), result },
                None => NavigatorEvent::ViewRemoved { view, identity: top.clone() },
            };
            plan.apply(Command::ShowAndRemove { show: next_top, remove: top }, vec![event]);
        }

        self.dispatch(&handler, plan)?;
        Ok(true)
    }

    /// Make `tab` active, creating its root on first visit
    pub fn switch_tab(&self, tab: K) -> Result<()> {
        let handler = self.handler()?;
        self.check_tab(&tab)?;

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;
            self.activate(&mut state, &handler, &tab, &mut plan)?;
        }

        self.dispatch(&handler, plan)
    }

    /// React to the user tapping a tab in the selector.
    ///
    /// A tap on another tab switches to it. A tap on the active tab collapses
    /// its stack to the root; once the tab is already at its root, the
    /// configured number of consecutive taps fires the scroll-to-top signal
    /// instead of producing a command.
    pub fn select_tab(&self, tab: K) -> Result<()> {
        let handler = self.handler()?;
        self.check_tab(&tab)?;

        let mut plan = Plan::new();
        let mut scroll_target = None;
        {
            let mut state = self.state.lock();

            if state.stacks.peek_key() != Some(&tab) {
                self.activate(&mut state, &handler, &tab, &mut plan)?;
                state.same_tab_taps = 1;
            } else {
                state.same_tab_taps += 1;

                if state.stacks.len(&tab) > 1 {
                    self.collapse(&mut state, &handler, &tab, false, &mut plan)?;
                } else if state.same_tab_taps >= self.settings.scroll_to_top_taps {
                    if let Some(root) = state.stacks.peek_value() {
                        scroll_target = Some(handler.require(root)?);
                    }
                }
            }
        }

        self.dispatch(&handler, plan)?;
        if let Some(view) = scroll_target {
            tracing::debug!("Scroll to top requested on tab {:?}", tab);
            self.scroll_to_top.publish(view);
        }
        Ok(())
    }

    /// Replace everything on `tab` with `view` as its new root
    pub fn add_root_view(&self, tab: K, view: ViewRef) -> Result<()> {
        self.add_root_view_with(tab, view, PushOptions::default())
    }

    pub fn add_root_view_with(&self, tab: K, view: ViewRef, options: PushOptions) -> Result<()> {
        let handler = self.handler()?;
        self.check_tab(&tab)?;

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;

            let previous = state.stacks.peek_key().cloned();
            let existing = state.stacks.get(&tab).map(<[Identity]>::to_vec).unwrap_or_default();
            let mut events = Self::removal_events(&handler, &existing)?;

            let detachable = options.detachable.unwrap_or(self.settings.detach_by_default);
            let identity = Identity::new(view.type_name(), detachable, options.transitions);

            state.stacks.remove(&tab);
            state.stacks.push(tab.clone(), identity.clone());

            if let Some(previous) = previous.filter(|previous| previous != &tab) {
                plan.emit(NavigatorEvent::TabSwitched { previous_tab: previous, new_tab: tab.clone() });
            }

            events.push(NavigatorEvent::ViewAdded { view: view.clone(), identity: identity.clone() });
            let command = if existing.is_empty() {
                Command::AddAndShow { view, identity }
            } else {
                Command::RemoveAllAndAdd { remove: existing, view, identity }
            };
            tracing::debug!("Replacing root of tab {:?}", tab);
            plan.apply(command, events);
        }

        self.dispatch(&handler, plan)
    }

    /// Drop everything above the root of `tab`, or the root too when
    /// `reset_root` is set. Switches to the tab first.
    pub fn reset(&self, tab: K, reset_root: bool) -> Result<()> {
        let handler = self.handler()?;
        self.check_tab(&tab)?;

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;

            let created = self.activate(&mut state, &handler, &tab, &mut plan)?;
            if !created {
                self.collapse(&mut state, &handler, &tab, reset_root, &mut plan)?;
            }
        }

        self.dispatch(&handler, plan)
    }

    /// Drop every tab and view, then start over on the default tab
    pub fn clear_all(&self) -> Result<()> {
        let handler = self.handler()?;

        let mut plan = Plan::new();
        {
            let mut state = self.state.lock();
            state.same_tab_taps = 0;

            let previous = state.stacks.peek_key().cloned();
            let identities: Vec<Identity> = state
                .stacks
                .iter()
                .rev()
                .flat_map(|(_, stack)| stack.iter().rev().cloned())
                .collect();
            let events = identities
                .iter()
                .map(|identity| {
                    let view = handler.require(identity)?;
                    Ok(NavigatorEvent::ViewRemoved { view, identity: identity.clone() })
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::info!("Clearing {} views across all tabs", identities.len());
            state.stacks.clear();
            plan.apply(Command::Clear { identities }, events);

            let tab = self.default_tab.clone();
            if let Some(previous) = previous.filter(|previous| previous != &tab) {
                plan.emit(NavigatorEvent::TabSwitched { previous_tab: previous, new_tab: tab.clone() });
            }
            self.seed_root(&mut state, &tab, &mut plan)?;
        }

        self.dispatch(&handler, plan)
    }

    /// The view on top of the active tab
    pub fn current_view(&self) -> Result<Option<ViewRef>> {
        let handler = self.handler()?;
        self.current_identity()
            .map(|identity| handler.require(&identity))
            .transpose()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.lock().stacks.peek_value().cloned()
    }

    pub fn current_tab(&self) -> Option<K> {
        self.state.lock().stacks.peek_key().cloned()
    }

    /// Depth of `tab`'s stack, or of the active tab when `None`
    pub fn stack_size(&self, tab: Option<&K>) -> usize {
        let state = self.state.lock();
        match tab.or_else(|| state.stacks.peek_key()) {
            Some(tab) => state.stacks.len(tab),
            None => 0,
        }
    }

    pub fn current_stack_size(&self) -> usize {
        self.stack_size(None)
    }

    /// Identities on `tab`'s stack, bottom first
    pub fn stack(&self, tab: &K) -> Vec<Identity> {
        self.state
            .lock()
            .stacks
            .get(tab)
            .map(<[Identity]>::to_vec)
            .unwrap_or_default()
    }

    /// Every identity the navigator tracks
    pub fn known_identities(&self) -> Vec<Identity> {
        self.state.lock().stacks.values().cloned().collect()
    }

    pub fn default_tab(&self) -> &K {
        &self.default_tab
    }

    /// Configured tabs in configuration order
    pub fn tabs(&self) -> impl Iterator<Item = &K> {
        self.tabs.keys()
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    /// Navigation events
    pub fn events(&self) -> &EventStream<NavigatorEvent<K>> {
        &self.events
    }

    /// Root views the user asked to scroll back to the top of
    pub fn scroll_to_top(&self) -> &EventStream<ViewRef> {
        &self.scroll_to_top
    }

    fn handler(&self) -> Result<TransactionHandler> {
        self.handler.read().clone().ok_or(NavigatorError::NotAttached)
    }

    fn check_tab(&self, tab: &K) -> Result<()> {
        if self.tabs.contains_key(tab) {
            Ok(())
        } else {
            Err(NavigatorError::UnknownTab(format!("{:?}", tab)))
        }
    }

    fn active_tab(&self, state: &NavigatorState<K>) -> K {
        state
            .stacks
            .peek_key()
            .cloned()
            .unwrap_or_else(|| self.default_tab.clone())
    }

    fn create_root(&self, tab: &K) -> Result<RootView> {
        self.tabs
            .get(tab)
            .map(|factory| factory.create(&self.settings))
            .ok_or_else(|| NavigatorError::UnknownTab(format!("{:?}", tab)))
    }

    /// Build `tab`'s root and push it; the tab must have no stack
    fn seed_root(&self, state: &mut NavigatorState<K>, tab: &K, plan: &mut Plan<K>) -> Result<()> {
        let RootView { view, detachable } = self.create_root(tab)?;
        let identity = Identity::new(view.type_name(), detachable, None);
        tracing::debug!("Creating root {} for tab {:?}", identity.type_name(), tab);

        state.stacks.push(tab.clone(), identity.clone());
        plan.apply(
            Command::AddAndShow { view: view.clone(), identity: identity.clone() },
            vec![NavigatorEvent::ViewAdded { view, identity }],
        );
        Ok(())
    }

    /// Make `tab` the active tab. Returns whether its root had to be created.
    fn activate(
        &self,
        state: &mut NavigatorState<K>,
        handler: &TransactionHandler,
        tab: &K,
        plan: &mut Plan<K>,
    ) -> Result<bool> {
        let previous = state.stacks.peek_key().cloned();
        if previous.as_ref() == Some(tab) {
            return Ok(false);
        }

        let top = state.stacks.get(tab).and_then(<[Identity]>::last).cloned();
        if let Some(top) = &top {
            handler.require(top)?;
        }

        if let Some(previous) = previous {
            tracing::debug!("Switching from tab {:?} to {:?}", previous, tab);
            plan.emit(NavigatorEvent::TabSwitched { previous_tab: previous, new_tab: tab.clone() });
        }

        match top {
            Some(top) => {
                state.stacks.move_to_top(tab);
                plan.apply(Command::ShowExisting { identity: top }, Vec::new());
                Ok(false)
            }
            None => {
                self.seed_root(state, tab, plan)?;
                Ok(true)
            }
        }
    }

    /// Collapse the active `tab` down to its root, or to a fresh root
    fn collapse(
        &self,
        state: &mut NavigatorState<K>,
        handler: &TransactionHandler,
        tab: &K,
        reset_root: bool,
        plan: &mut Plan<K>,
    ) -> Result<()> {
        let stack = state.stacks.get(tab).map(<[Identity]>::to_vec).unwrap_or_default();
        let Some(root) = stack.first().cloned() else {
            return Ok(());
        };

        if reset_root {
            let mut events = Self::removal_events(handler, &stack)?;
            let RootView { view, detachable } = self.create_root(tab)?;
            let identity = Identity::new(view.type_name(), detachable, None);

            state.stacks.remove(tab);
            state.stacks.push(tab.clone(), identity.clone());

            tracing::debug!("Resetting tab {:?} with a new root", tab);
            events.push(NavigatorEvent::ViewAdded { view: view.clone(), identity: identity.clone() });
            plan.apply(Command::RemoveAllAndAdd { remove: stack, view, identity }, events);
            return Ok(());
        }

        if stack.len() <= 1 {
            return Ok(());
        }

        handler.require(&root)?;
        let remove = stack[1..].to_vec();
        let events = Self::removal_events(handler, &remove)?;

        state.stacks.remove(tab);
        state.stacks.push(tab.clone(), root.clone());

        tracing::debug!("Resetting tab {:?} to its root ({} views removed)", tab, remove.len());
        plan.apply(Command::RemoveAllAndShowExisting { remove, show: root }, events);
        Ok(())
    }

    /// `ViewRemoved` for each identity, top of the stack first
    fn removal_events(
        handler: &TransactionHandler,
        stack: &[Identity],
    ) -> Result<Vec<NavigatorEvent<K>>> {
        stack
            .iter()
            .rev()
            .map(|identity| {
                let view = handler.require(identity)?;
                Ok(NavigatorEvent::ViewRemoved { view, identity: identity.clone() })
            })
            .collect()
    }

    fn dispatch(&self, handler: &TransactionHandler, plan: Plan<K>) -> Result<()> {
        let _hold = self.events.hold();

        for step in plan.steps {
            match step {
                Step::Emit(event) => self.events.publish(event),
                Step::Apply(command, events) => {
                    let stream = self.events.clone();
                    handler.handle(CommandWithCallback::new(
                        command,
                        Box::new(move || {
                            for event in events {
                                stream.publish(event);
                            }
                        }),
                    ))?;
                }
            }
        }

        Ok(())
    }
}
