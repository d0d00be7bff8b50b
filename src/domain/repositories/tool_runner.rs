use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::ActionError;
use async_trait::async_trait;
use std::time::Duration;

/// How an invocation of the external tool ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Success,
    /// Non-zero exit. `None` when the process was terminated by a signal.
    Exited(Option<i32>),
    TimedOut,
    Canceled,
    SpawnFailed(String),
}

/// Captured output of one invocation, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ProcessStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    pub fn success(text: &str) -> Self {
        Self {
            status: ProcessStatus::Success,
            stdout: text.lines().map(String::from).collect(),
            stderr: Vec::new(),
        }
    }

    pub fn failure(status: ProcessStatus, stderr: &str) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: stderr.lines().map(String::from).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessStatus::Success
    }

    /// Standard output as text, or an empty string for any unsuccessful run so
    /// that partial output is never parsed.
    pub fn text(&self) -> String {
        if !self.is_success() {
            return String::new();
        }
        let mut text = self.stdout.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }

    /// Maps the run onto the action error taxonomy.
    pub fn into_action_result(self, tool: &str, timeout: Duration) -> Result<Self, ActionError> {
        match &self.status {
            ProcessStatus::Success => Ok(self),
            ProcessStatus::Canceled => Err(ActionError::Canceled),
            ProcessStatus::TimedOut => Err(ActionError::TimedOut(timeout.as_secs())),
            ProcessStatus::SpawnFailed(message) => Err(ActionError::Spawn {
                tool: tool.to_string(),
                message: message.clone(),
            }),
            ProcessStatus::Exited(code) => {
                // The tool reports most failures on stdout, so fall back to it.
                let message = match self.stderr_text() {
                    stderr if !stderr.trim().is_empty() => stderr,
                    _ => self.stdout.join("\n"),
                };
                Err(ActionError::Failed {
                    tool: tool.to_string(),
                    exit_code: *code,
                    message: message.trim().to_string(),
                })
            }
        }
    }
}

/// Invokes the external package-manager binary.
///
/// Implementations never return errors: every failure is folded into
/// [`ProcessOutput::status`] with empty text.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn executable(&self) -> &str;

    async fn run(&self, args: &[&str], cancel: &CancellationToken, timeout: Duration)
    -> ProcessOutput;
}
