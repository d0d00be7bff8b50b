use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub executable: String,
    pub query_timeout_secs: u64,
    pub action_timeout_secs: u64,
    pub data_dir: Option<PathBuf>,
    pub refresh_on_completion: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            executable: "winget".to_string(),
            query_timeout_secs: 10,
            action_timeout_secs: 600,
            data_dir: None,
            refresh_on_completion: true,
        }
    }
}

impl AppConfig {
    /// Bound for status queries (`list`, `upgrade` checks, `show`, `--version`).
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Bound for mutating invocations run by the queue.
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}
