//! Declarative transaction commands
//!
//! A command says what the visible state should become, never how the
//! container gets there. The [`TransactionHandler`](crate::navigation::TransactionHandler)
//! owns the how.

use std::fmt;

use super::identity::Identity;
use crate::container::{OnCommit, ViewRef};

/// One visual transition requested by the navigator
#[derive(Debug, Clone)]
pub enum Command {
    /// Add a new view and show it, hiding or detaching everything else
    AddAndShow { view: ViewRef, identity: Identity },
    /// Reveal a view that is already hosted
    ShowExisting { identity: Identity },
    /// Reveal `show` and drop `remove`, using `remove`'s pop animations
    ShowAndRemove { show: Identity, remove: Identity },
    /// Drop every view the navigator owns
    Clear { identities: Vec<Identity> },
    /// Drop `remove`, then add and show a new view
    RemoveAllAndAdd {
        remove: Vec<Identity>,
        view: ViewRef,
        identity: Identity,
    },
    /// Drop `remove`, then reveal a view that is already hosted
    RemoveAllAndShowExisting { remove: Vec<Identity>, show: Identity },
    /// Drop every navigator view the container holds that is not in `known`
    RemoveUnknown { known: Vec<Identity> },
}

impl Command {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddAndShow { .. } => "AddAndShow",
            Command::ShowExisting { .. } => "ShowExisting",
            Command::ShowAndRemove { .. } => "ShowAndRemove",
            Command::Clear { .. } => "Clear",
            Command::RemoveAllAndAdd { .. } => "RemoveAllAndAdd",
            Command::RemoveAllAndShowExisting { .. } => "RemoveAllAndShowExisting",
            Command::RemoveUnknown { .. } => "RemoveUnknown",
        }
    }
}

/// A command plus the callback to run once the container committed it
pub struct CommandWithCallback {
    pub command: Command,
    pub on_commit: OnCommit,
}

impl CommandWithCallback {
    pub fn new(command: Command, on_commit: OnCommit) -> Self {
        Self { command, on_commit }
    }

    /// A command nobody needs to hear back about
    pub fn silent(command: Command) -> Self {
        Self::new(command, Box::new(|| {}))
    }
}

impl fmt::Debug for CommandWithCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandWithCallback").field(&self.command).finish()
    }
}
