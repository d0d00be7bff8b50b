use thiserror::Error;

/// Why a package action did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("operation was canceled")]
    Canceled,
    #[error("operation timed out after {0} seconds")]
    TimedOut(u64),
    #[error("{tool} exited with code {exit_code:?}: {message}")]
    Failed {
        tool: String,
        exit_code: Option<i32>,
        message: String,
    },
    #[error("failed to launch {tool}: {message}")]
    Spawn { tool: String, message: String },
    #[error("invalid package id: {0:?}")]
    InvalidPackageId(String),
    #[error("action aborted: {0}")]
    Aborted(String),
}

impl ActionError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ActionError::Canceled)
    }
}
