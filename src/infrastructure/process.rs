use crate::domain::cancellation::CancellationToken;
use crate::domain::repositories::{ProcessOutput, ProcessStatus, ToolRunner};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to keep draining pipes once the process is gone. A grandchild that
/// inherited the pipe would otherwise hold the reader open indefinitely.
const READER_GRACE: Duration = Duration::from_secs(2);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Spawns the external tool, one process per call.
pub struct ProcessRunner {
    executable: String,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        command
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn executable(&self) -> &str {
        &self.executable
    }

    async fn run(
        &self,
        args: &[&str],
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> ProcessOutput {
        let command_line = format!("{} {}", self.executable, args.join(" "));
        tracing::debug!("Running: {}", command_line);

        if cancel.is_cancelled() {
            tracing::debug!("Skipping {}: already canceled", command_line);
            return ProcessOutput::failure(ProcessStatus::Canceled, "");
        }

        let mut child = match self.command(args).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to launch {}: {}", command_line, e);
                return ProcessOutput::failure(ProcessStatus::SpawnFailed(e.to_string()), "");
            }
        };

        let stdout_task = child.stdout.take().map(|out| tokio::spawn(collect_lines(out)));
        let stderr_task = child.stderr.take().map(|err| tokio::spawn(collect_lines(err)));

        let status = tokio::select! {
            result = child.wait() => match result {
                Ok(exit) if exit.success() => ProcessStatus::Success,
                Ok(exit) => ProcessStatus::Exited(exit.code()),
                Err(e) => {
                    tracing::error!("Waiting on {} failed: {}", command_line, e);
                    ProcessStatus::Exited(None)
                }
            },
            _ = cancel.cancelled() => ProcessStatus::Canceled,
            _ = tokio::time::sleep(timeout) => ProcessStatus::TimedOut,
        };

        if matches!(status, ProcessStatus::Canceled | ProcessStatus::TimedOut) {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill {}: {}", command_line, e);
            }
        }

        let stdout = join_lines(stdout_task).await;
        let stderr = join_lines(stderr_task).await;

        match &status {
            ProcessStatus::Success => {
                tracing::debug!("{} returned {} lines", command_line, stdout.len());
                if cfg!(feature = "verbose-logging") {
                    tracing::debug!("Raw output of {}:\n{}", command_line, stdout.join("\n"));
                }
            }
            ProcessStatus::Exited(code) => {
                tracing::error!(
                    "{} failed with exit code {:?}: {}",
                    command_line,
                    code,
                    stderr.join("\n")
                );
            }
            ProcessStatus::TimedOut => {
                tracing::warn!("{} timed out after {:?}", command_line, timeout);
            }
            ProcessStatus::Canceled => {
                tracing::info!("{} was canceled", command_line);
            }
            ProcessStatus::SpawnFailed(_) => {}
        }

        ProcessOutput {
            status,
            stdout,
            stderr,
        }
    }
}

/// Reads a pipe to the end, one entry per line. Invalid UTF-8 is replaced
/// rather than aborting the read.
async fn collect_lines<R: AsyncRead + Unpin>(reader: R) -> Vec<String> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches('\n');
                let line = line.strip_suffix('\r').unwrap_or(line);
                lines.push(line.to_string());
            }
            Err(e) => {
                tracing::debug!("Stopped reading process output: {}", e);
                break;
            }
        }
    }

    lines
}

async fn join_lines(task: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    let Some(mut task) = task else {
        return Vec::new();
    };

    match tokio::time::timeout(READER_GRACE, &mut task).await {
        Ok(Ok(lines)) => lines,
        Ok(Err(e)) => {
            tracing::debug!("Output reader task failed: {}", e);
            Vec::new()
        }
        Err(_) => {
            task.abort();
            Vec::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh() -> ProcessRunner {
        ProcessRunner::new("sh")
    }

    #[tokio::test]
    async fn test_captures_stdout_lines() {
        let output = sh()
            .run(
                &["-c", "echo first; echo second"],
                &CancellationToken::new(),
                Duration::from_secs(5),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::Success);
        assert_eq!(output.stdout, vec!["first", "second"]);
        assert_eq!(output.text(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_returns_empty_text() {
        let output = sh()
            .run(
                &["-c", "echo partial; echo broken >&2; exit 3"],
                &CancellationToken::new(),
                Duration::from_secs(5),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::Exited(Some(3)));
        assert_eq!(output.text(), "");
        assert_eq!(output.stderr, vec!["broken"]);
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let started = Instant::now();
        let output = sh()
            .run(
                &["-c", "exec sleep 30"],
                &CancellationToken::new(),
                Duration::from_millis(100),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::TimedOut);
        assert_eq!(output.text(), "");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancellation_kills_process() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let output = sh()
            .run(&["-c", "exec sleep 30"], &token, Duration::from_secs(30))
            .await;

        assert_eq!(output.status, ProcessStatus::Canceled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_spawns_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let output = ProcessRunner::new("definitely-not-a-real-tool")
            .run(&["list"], &token, Duration::from_secs(1))
            .await;

        assert_eq!(output.status, ProcessStatus::Canceled);
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_failure() {
        let output = ProcessRunner::new("definitely-not-a-real-tool")
            .run(&["--version"], &CancellationToken::new(), Duration::from_secs(1))
            .await;

        assert!(matches!(output.status, ProcessStatus::SpawnFailed(_)));
        assert_eq!(output.text(), "");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let output = sh()
            .run(
                &["-c", "printf 'caf\\351\\n'"],
                &CancellationToken::new(),
                Duration::from_secs(5),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::Success);
        assert_eq!(output.stdout, vec!["caf\u{FFFD}"]);
    }
}
