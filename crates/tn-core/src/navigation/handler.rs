//! Turns commands into container transactions

use std::sync::Arc;

use ahash::AHashSet;

use super::command::{Command, CommandWithCallback};
use super::identity::Identity;
use crate::container::{OnCommit, Transaction, ViewContainer, ViewRef};
use crate::error::{NavigatorError, Result};

/// Applies commands to one view container
#[derive(Clone)]
pub struct TransactionHandler {
    container: Arc<dyn ViewContainer>,
}

impl TransactionHandler {
    pub fn new(container: Arc<dyn ViewContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Arc<dyn ViewContainer> {
        &self.container
    }

    /// Look up the hosted view for an identity
    pub fn find(&self, identity: &Identity) -> Option<ViewRef> {
        self.container.find(&identity.encode())
    }

    /// Like [`find`](Self::find), but a missing view means the container and
    /// the navigator disagree
    pub fn require(&self, identity: &Identity) -> Result<ViewRef> {
        self.find(identity)
            .ok_or_else(|| NavigatorError::MissingView(identity.encode()))
    }

    /// Build and commit the transaction for one command
    pub fn handle(&self, command: CommandWithCallback) -> Result<()> {
        let CommandWithCallback { command, on_commit } = command;
        tracing::debug!("Applying {} command", command.name());

        match command {
            Command::AddAndShow { view, identity } => {
                self.add_and_show(Vec::new(), view, &identity, on_commit)
            }
            Command::ShowExisting { identity } => self.show(Vec::new(), &identity, on_commit),
            Command::ShowAndRemove { show, remove } => {
                self.show_and_remove(&show, &remove, on_commit)
            }
            Command::Clear { identities } => self.clear(&identities, on_commit),
            Command::RemoveAllAndAdd { remove, view, identity } => {
                self.add_and_show(remove, view, &identity, on_commit)
            }
            Command::RemoveAllAndShowExisting { remove, show } => {
                self.show(remove, &show, on_commit)
            }
            Command::RemoveUnknown { known } => self.remove_unknown(&known, on_commit),
        }
    }

    fn add_and_show(
        &self,
        remove: Vec<Identity>,
        view: ViewRef,
        identity: &Identity,
        on_commit: OnCommit,
    ) -> Result<()> {
        let mut transaction = Transaction::new();
        if let Some(transitions) = identity.transitions() {
            let (enter, exit) = transitions.open();
            transaction.set_animations(enter, exit);
        }

        let removed = self.remove_present(&mut transaction, &remove);
        transaction.add(identity.encode(), view);
        self.hide_others(&mut transaction, identity, &removed);
        transaction.run_on_commit(on_commit);

        self.container.commit(transaction);
        Ok(())
    }

    fn show(&self, remove: Vec<Identity>, identity: &Identity, on_commit: OnCommit) -> Result<()> {
        self.require(identity)?;

        let mut transaction = Transaction::new();
        let removed = self.remove_present(&mut transaction, &remove);
        Self::show_or_attach(&mut transaction, identity);
        self.hide_others(&mut transaction, identity, &removed);
        transaction.run_on_commit(on_commit);

        self.container.commit(transaction);
        Ok(())
    }

    fn show_and_remove(
        &self,
        show: &Identity,
        remove: &Identity,
        on_commit: OnCommit,
    ) -> Result<()> {
        self.require(show)?;
        self.require(remove)?;

        let mut transaction = Transaction::new();
        // The view leaving decides how the pop looks
        if let Some(transitions) = remove.transitions() {
            let (enter, exit) = transitions.pop();
            transaction.set_animations(enter, exit);
        }

        let removed: AHashSet<String> = std::iter::once(remove.encode()).collect();
        transaction.remove(remove.encode());
        self.hide_others(&mut transaction, show, &removed);
        Self::show_or_attach(&mut transaction, show);
        transaction.run_on_commit(on_commit);

        self.container.commit(transaction);
        Ok(())
    }

    fn clear(&self, identities: &[Identity], on_commit: OnCommit) -> Result<()> {
        let mut transaction = Transaction::new();
        for (tag, _) in self.container.managed_views() {
            if Identity::is_ours(&tag) {
                transaction.remove(tag);
            }
        }
        tracing::debug!(
            "Clearing {} views ({} tracked by the navigator)",
            transaction.ops().len(),
            identities.len()
        );
        transaction.run_on_commit(on_commit);

        self.container.commit(transaction);
        Ok(())
    }

    fn remove_unknown(&self, known: &[Identity], on_commit: OnCommit) -> Result<()> {
        let known: AHashSet<&Identity> = known.iter().collect();

        let mut transaction = Transaction::new();
        for (tag, _) in self.container.managed_views() {
            // Foreign views are not ours to touch
            let Ok(identity) = Identity::decode(&tag) else {
                continue;
            };
            if !known.contains(&identity) {
                tracing::debug!("Removing orphaned view {}", tag);
                transaction.remove(tag);
            }
        }

        if transaction.is_empty() {
            on_commit();
            return Ok(());
        }

        tracing::warn!("Purging {} orphaned views", transaction.ops().len());
        transaction.run_on_commit(on_commit);
        self.container.commit(transaction);
        Ok(())
    }

    /// Queue removal of the views that are still hosted, returning their tags
    fn remove_present(&self, transaction: &mut Transaction, remove: &[Identity]) -> AHashSet<String> {
        let mut removed = AHashSet::new();
        for identity in remove {
            let tag = identity.encode();
            if self.container.find(&tag).is_some() {
                transaction.remove(tag.clone());
                removed.insert(tag);
            }
        }
        removed
    }

    fn show_or_attach(transaction: &mut Transaction, identity: &Identity) {
        if identity.is_detachable() {
            transaction.attach(identity.encode());
        } else {
            transaction.show(identity.encode());
        }
    }

    /// Detach or hide every other navigator view according to its own flag
    fn hide_others(&self, transaction: &mut Transaction, keep: &Identity, skip: &AHashSet<String>) {
        for (tag, _) in self.container.managed_views() {
            if skip.contains(&tag) {
                continue;
            }
            let Ok(identity) = Identity::decode(&tag) else {
                continue;
            };
            if &identity == keep {
                continue;
            }
            if identity.is_detachable() {
                transaction.detach(tag);
            } else {
                transaction.hide(tag);
            }
        }
    }
}
