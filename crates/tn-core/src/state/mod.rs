use serde::{Deserialize, Serialize};

/// Navigator behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorSettings {
    /// Whether views pushed without an explicit flag, and roots from plain
    /// factories, are detached instead of hidden when not shown
    pub detach_by_default: bool,

    /// Consecutive taps on an already-rooted active tab before the
    /// scroll-to-top signal fires
    pub scroll_to_top_taps: usize,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            detach_by_default: false,
            scroll_to_top_taps: 3,
        }
    }
}
