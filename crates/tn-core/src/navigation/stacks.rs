//! A stack of keyed stacks
//!
//! Behaves as both a stack and a map: every key owns a stack of values, and the
//! keys themselves are ordered by how recently they were touched. The last key
//! in the map is the active one.

use std::hash::Hash;

use indexmap::IndexMap;

/// Keyed stacks ordered most-recently-touched last
#[derive(Debug, Clone)]
pub struct StackOfStacks<K, V> {
    stacks: IndexMap<K, Vec<V>>,
}

impl<K, V> Default for StackOfStacks<K, V> {
    fn default() -> Self {
        Self { stacks: IndexMap::new() }
    }
}

impl<K: Hash + Eq + Clone, V> StackOfStacks<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has a non-empty stack
    pub fn stack_exists(&self, key: &K) -> bool {
        self.stacks.get(key).is_some_and(|stack| !stack.is_empty())
    }

    /// Push a value onto the key's stack and make that stack the active one
    pub fn push(&mut self, key: K, value: V) {
        if self.stacks.contains_key(&key) {
            self.move_to_top(&key);
        }
        self.stacks.entry(key).or_default().push(value);
    }

    /// Make `key` the active stack without touching its contents
    pub fn move_to_top(&mut self, key: &K) {
        if self.peek_key() == Some(key) {
            return;
        }
        if let Some((key, stack)) = self.stacks.shift_remove_entry(key) {
            self.stacks.insert(key, stack);
        }
    }

    /// Remove the top of the active stack.
    ///
    /// Emptied stacks are dropped immediately so the next most recently
    /// touched key becomes active.
    pub fn pop(&mut self) -> Option<V> {
        let len = self.stacks.len();
        let (_, stack) = self.stacks.get_index_mut(len.checked_sub(1)?)?;
        let value = stack.pop();
        self.prune();
        value
    }

    /// Drop the key and its whole stack
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        let removed = self.stacks.shift_remove(key);
        self.prune();
        removed
    }

    /// The key's stack, bottom first
    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.stacks.get(key).map(Vec::as_slice)
    }

    /// Number of values on the key's stack
    pub fn len(&self, key: &K) -> usize {
        self.stacks.get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// The active key and the top of its stack
    pub fn peek(&self) -> Option<(&K, &V)> {
        let (key, stack) = self.stacks.last()?;
        stack.last().map(|value| (key, value))
    }

    pub fn peek_key(&self) -> Option<&K> {
        self.peek().map(|(key, _)| key)
    }

    pub fn peek_value(&self) -> Option<&V> {
        self.peek().map(|(_, value)| value)
    }

    /// Remove every key and value
    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    /// Keys from least to most recently touched
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.stacks.keys()
    }

    /// Key/stack pairs from least to most recently touched
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &[V])> {
        self.stacks.iter().map(|(key, stack)| (key, stack.as_slice()))
    }

    /// Every value of every stack
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.stacks.values().flatten()
    }

    // Only the active stack can shrink, but removing a key may expose an
    // empty one underneath, so keep going until the top is non-empty.
    fn prune(&mut self) {
        while self.stacks.last().is_some_and(|(_, stack)| stack.is_empty()) {
            self.stacks.pop();
        }
    }
}
