use thiserror::Error;

/// Errors raised by navigator operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigatorError {
    /// The tab key was never configured
    #[error("Tab {0} is not configured")]
    UnknownTab(String),

    /// The operation needs a view container and none is attached
    #[error("Navigator is not attached to a view container")]
    NotAttached,

    /// The container lost a view the navigator still tracks
    #[error("View container has no view tagged {0}")]
    MissingView(String),
}

pub type Result<T, E = NavigatorError> = std::result::Result<T, E>;
