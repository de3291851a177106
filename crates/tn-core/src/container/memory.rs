//! In-memory view container
//!
//! Keeps every hosted view with its attach/show state and the animations the
//! last transaction that touched it ran with. Useful for headless hosts and
//! for tests, and able to save and restore itself to mimic process death.

use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{Transaction, ViewContainer, ViewOp, ViewRef};

/// State of one hosted view
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: ViewRef,
    pub attached: bool,
    pub shown: bool,
    /// Enter/exit animations of the last add, show or attach
    pub executed_animations: (i32, i32),
}

impl ViewState {
    pub fn is_visible(&self) -> bool {
        self.attached && self.shown
    }
}

/// What survives when the hosting process is killed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedView {
    pub tag: String,
    pub attached: bool,
    pub shown: bool,
}

/// A [`ViewContainer`] backed by an ordered map of tags to views
#[derive(Default)]
pub struct MemoryContainer {
    views: RwLock<IndexMap<String, ViewState>>,
    commits: AtomicUsize,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a container from saved state.
    ///
    /// `rebuild` recreates the view for a saved tag; tags it returns `None`
    /// for are dropped.
    pub fn restore<F>(saved: &[SavedView], rebuild: F) -> Self
    where
        F: Fn(&str) -> Option<ViewRef>,
    {
        let views = saved
            .iter()
            .filter_map(|saved| {
                let view = rebuild(&saved.tag)?;
                let state = ViewState {
                    view,
                    attached: saved.attached,
                    shown: saved.shown,
                    executed_animations: (0, 0),
                };
                Some((saved.tag.clone(), state))
            })
            .collect();

        Self {
            views: RwLock::new(views),
            commits: AtomicUsize::new(0),
        }
    }

    /// Snapshot of every hosted view, in insertion order
    pub fn save(&self) -> Vec<SavedView> {
        self.views
            .read()
            .iter()
            .map(|(tag, state)| SavedView {
                tag: tag.clone(),
                attached: state.attached,
                shown: state.shown,
            })
            .collect()
    }

    /// Host a view without going through a transaction
    pub fn insert(&self, tag: impl Into<String>, view: ViewRef) {
        self.views.write().insert(
            tag.into(),
            ViewState {
                view,
                attached: true,
                shown: true,
                executed_animations: (0, 0),
            },
        );
    }

    pub fn state(&self, tag: &str) -> Option<ViewState> {
        self.views.read().get(tag).cloned()
    }

    pub fn tags(&self) -> Vec<String> {
        self.views.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.read().is_empty()
    }

    /// Views both attached and shown
    pub fn visible_views(&self) -> Vec<ViewRef> {
        self.collect_views(ViewState::is_visible)
    }

    pub fn hidden_views(&self) -> Vec<ViewRef> {
        self.collect_views(|state| !state.shown)
    }

    pub fn detached_views(&self) -> Vec<ViewRef> {
        self.collect_views(|state| !state.attached)
    }

    pub fn executed_animations(&self, tag: &str) -> Option<(i32, i32)> {
        self.views.read().get(tag).map(|state| state.executed_animations)
    }

    /// Number of transactions committed so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn collect_views(&self, filter: impl Fn(&ViewState) -> bool) -> Vec<ViewRef> {
        self.views
            .read()
            .values()
            .filter(|state| filter(state))
            .map(|state| state.view.clone())
            .collect()
    }
}

impl ViewContainer for MemoryContainer {
    fn find(&self, tag: &str) -> Option<ViewRef> {
        self.views.read().get(tag).map(|state| state.view.clone())
    }

    fn managed_views(&self) -> Vec<(String, ViewRef)> {
        self.views
            .read()
            .iter()
            .map(|(tag, state)| (tag.clone(), state.view.clone()))
            .collect()
    }

    fn commit(&self, transaction: Transaction) {
        let (ops, animations, callbacks) = transaction.into_parts();
        let executed = animations.unwrap_or((0, 0));

        {
            let mut views = self.views.write();
            for op in ops {
                match op {
                    ViewOp::Add { tag, view } => {
                        views.insert(
                            tag,
                            ViewState {
                                view,
                                attached: true,
                                shown: true,
                                executed_animations: executed,
                            },
                        );
                    }
                    ViewOp::Remove(tag) => {
                        views.shift_remove(&tag);
                    }
                    ViewOp::Show(tag) => {
                        if let Some(state) = views.get_mut(&tag) {
                            state.shown = true;
                            state.executed_animations = executed;
                        }
                    }
                    ViewOp::Hide(tag) => {
                        if let Some(state) = views.get_mut(&tag) {
                            state.shown = false;
                        }
                    }
                    ViewOp::Attach(tag) => {
                        if let Some(state) = views.get_mut(&tag) {
                            state.attached = true;
                            state.executed_animations = executed;
                        }
                    }
                    ViewOp::Detach(tag) => {
                        if let Some(state) = views.get_mut(&tag) {
                            state.attached = false;
                        }
                    }
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);

        for callback in callbacks {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::container::View;

    #[derive(Debug)]
    struct Page(&'static str);

    impl View for Page {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn page(name: &'static str) -> ViewRef {
        Arc::new(Page(name))
    }

    #[test]
    fn test_commit_applies_ops_in_order() {
        let container = MemoryContainer::new();
        let mut transaction = Transaction::new();
        transaction
            .add("a", page("a"))
            .add("b", page("b"))
            .hide("a")
            .set_animations(3, 4);
        container.commit(transaction);

        assert_eq!(container.len(), 2);
        assert!(!container.state("a").unwrap().shown);
        assert!(container.state("b").unwrap().is_visible());
        assert_eq!(container.executed_animations("b"), Some((3, 4)));

        let mut transaction = Transaction::new();
        transaction.remove("b").detach("a").attach("missing");
        container.commit(transaction);

        assert_eq!(container.tags(), vec!["a".to_string()]);
        assert_eq!(container.detached_views().len(), 1);
        assert_eq!(container.commit_count(), 2);
    }

    #[test]
    fn test_show_without_animations_resets_executed() {
        let container = MemoryContainer::new();
        let mut transaction = Transaction::new();
        transaction.add("a", page("a")).set_animations(1, 2);
        container.commit(transaction);

        let mut transaction = Transaction::new();
        transaction.hide("a");
        container.commit(transaction);
        let mut transaction = Transaction::new();
        transaction.show("a");
        container.commit(transaction);

        assert_eq!(container.executed_animations("a"), Some((0, 0)));
    }

    #[test]
    fn test_callbacks_run_after_ops_are_visible() {
        let container = Arc::new(MemoryContainer::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let mut transaction = Transaction::new();
        transaction.add("a", page("a"));
        {
            let container = container.clone();
            let seen = seen.clone();
            transaction.run_on_commit(Box::new(move || {
                seen.store(container.len(), Ordering::SeqCst);
            }));
        }
        container.commit(transaction);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_save_and_restore() {
        let container = MemoryContainer::new();
        let mut transaction = Transaction::new();
        transaction.add("a", page("a")).add("b", page("b")).hide("a");
        container.commit(transaction);

        let saved = container.save();
        let restored = MemoryContainer::restore(&saved, |tag| {
            (tag != "b").then(|| page("rebuilt"))
        });

        assert_eq!(restored.tags(), vec!["a".to_string()]);
        assert!(!restored.state("a").unwrap().shown);
        assert_eq!(restored.find("a").unwrap().name(), "rebuilt");
        assert!(restored.find("b").is_none());
    }
}
