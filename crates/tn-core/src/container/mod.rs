//! The boundary to whatever actually hosts the views
//!
//! The navigator never touches views directly. It hands the container a
//! [`Transaction`] describing what to add, remove, show, hide, attach or
//! detach, and the container applies it in one go.

mod memory;

use std::fmt;
use std::sync::Arc;

pub use memory::{MemoryContainer, SavedView, ViewState};

/// Content the container can host
pub trait View: fmt::Debug + Send + Sync {
    /// Name recorded in the view's identity tag
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Human readable label for logs and listings
    fn name(&self) -> &str {
        self.type_name()
    }
}

/// Shared handle to a hosted view
pub type ViewRef = Arc<dyn View>;

/// Callback run once a transaction has been applied
pub type OnCommit = Box<dyn FnOnce() + Send + 'static>;

/// A single change inside a transaction, addressed by container tag
#[derive(Debug, Clone)]
pub enum ViewOp {
    Add { tag: String, view: ViewRef },
    Remove(String),
    Show(String),
    Hide(String),
    Attach(String),
    Detach(String),
}

/// An ordered batch of view changes applied atomically
#[derive(Default)]
pub struct Transaction {
    ops: Vec<ViewOp>,
    animations: Option<(i32, i32)>,
    on_commit: Vec<OnCommit>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: impl Into<String>, view: ViewRef) -> &mut Self {
        self.ops.push(ViewOp::Add { tag: tag.into(), view });
        self
    }

    pub fn remove(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(ViewOp::Remove(tag.into()));
        self
    }

    pub fn show(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(ViewOp::Show(tag.into()));
        self
    }

    pub fn hide(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(ViewOp::Hide(tag.into()));
        self
    }

    pub fn attach(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(ViewOp::Attach(tag.into()));
        self
    }

    pub fn detach(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(ViewOp::Detach(tag.into()));
        self
    }

    /// Enter/exit animations for views added or revealed by this transaction
    pub fn set_animations(&mut self, enter: i32, exit: i32) -> &mut Self {
        self.animations = Some((enter, exit));
        self
    }

    pub fn run_on_commit(&mut self, callback: OnCommit) -> &mut Self {
        self.on_commit.push(callback);
        self
    }

    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    pub fn animations(&self) -> Option<(i32, i32)> {
        self.animations
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Split into the parts a container needs to apply it
    pub fn into_parts(self) -> (Vec<ViewOp>, Option<(i32, i32)>, Vec<OnCommit>) {
        (self.ops, self.animations, self.on_commit)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("ops", &self.ops)
            .field("animations", &self.animations)
            .field("on_commit", &self.on_commit.len())
            .finish()
    }
}

/// Something that hosts views and applies transactions to them
pub trait ViewContainer: Send + Sync {
    /// Look up a hosted view by its tag
    fn find(&self, tag: &str) -> Option<ViewRef>;

    /// Every hosted view with its tag, including views we did not add
    fn managed_views(&self) -> Vec<(String, ViewRef)>;

    /// Apply the transaction, then run its on-commit callbacks.
    ///
    /// Callbacks must run after the container has released any internal
    /// locks; they are allowed to start new transactions.
    fn commit(&self, transaction: Transaction);
}
