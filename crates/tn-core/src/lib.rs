//! Core functionality for tab based navigation
//!
//! This crate keeps one stack of views per tab, tracks which tab is active,
//! and turns navigation requests into transactions against a view container.

pub mod container;
pub mod error;
pub mod events;
pub mod navigation;
pub mod state;

// Re-export commonly used types
pub use container::{MemoryContainer, SavedView, Transaction, View, ViewContainer, ViewRef};
pub use error::{NavigatorError, Result};
pub use events::{EventRecorder, EventStream, Subscriber, Subscription};
pub use navigation::{
    Identity, Navigator, NavigatorBuilder, NavigatorEvent, PushOptions, RootView, TabKey,
    Transitions,
};
pub use state::NavigatorSettings;
