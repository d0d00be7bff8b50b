//! Fakes for the tool boundary, shared by unit tests.

use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::Package;
use crate::domain::errors::ActionError;
use crate::domain::repositories::{
    CatalogRepository, PackageRepository, PackageStatusRepository, ProcessOutput, ProcessStatus,
    ToolRunner,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers invocations by command-line prefix; unmatched calls get empty
/// successful output. Records every call.
pub struct ScriptedRunner {
    responses: Vec<(String, ProcessOutput)>,
    calls: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            calls: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, prefix: &str, output: ProcessOutput) -> Self {
        self.responses.push((prefix.to_string(), output));
        self
    }

    pub fn respond_text(self, prefix: &str, text: &str) -> Self {
        self.respond(prefix, ProcessOutput::success(text))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    fn executable(&self) -> &str {
        "winget"
    }

    async fn run(
        &self,
        args: &[&str],
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> ProcessOutput {
        let line = args.join(" ");
        self.calls.lock().unwrap().push(line.clone());
        self.timeouts.lock().unwrap().push(timeout);

        if cancel.is_cancelled() {
            return ProcessOutput::failure(ProcessStatus::Canceled, "");
        }

        self.responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ProcessOutput::success(""))
    }
}

/// Scripted behavior of one package in [`FakeActions`].
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    /// Runs until the token is cancelled.
    BlockUntilCancelled,
    Delay(Duration),
    /// Waits for cancellation, then reports this result anyway, like a
    /// process that finished while being killed.
    IgnoreCancel(Result<(), ActionError>),
}

/// Package actions that never touch a process. Tracks call order and the
/// highest number of actions observed running at once.
pub struct FakeActions {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<String>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl FakeActions {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(id.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    async fn perform(
        &self,
        verb: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        self.calls.lock().unwrap().push(format!("{verb} {id}"));
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let behavior = self.behaviors.get(id).cloned().unwrap_or(Behavior::Succeed);
        let result = match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(ActionError::Failed {
                tool: "winget".to_string(),
                exit_code: Some(1),
                message,
            }),
            Behavior::BlockUntilCancelled => {
                cancel.cancelled().await;
                Err(ActionError::Canceled)
            }
            Behavior::IgnoreCancel(result) => {
                cancel.cancelled().await;
                result
            }
            Behavior::Delay(delay) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(()),
                    _ = cancel.cancelled() => Err(ActionError::Canceled),
                }
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl PackageRepository for FakeActions {
    async fn install_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        self.perform("install", id, cancel).await
    }

    async fn uninstall_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        self.perform("uninstall", id, cancel).await
    }

    async fn upgrade_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        self.perform("upgrade", id, cancel).await
    }
}

/// Status lookups answered from a fixed table. Ids missing from the table
/// resolve to `None`, as if the tool had failed.
pub struct FakeStatus {
    installed: HashMap<String, String>,
    resolved: Mutex<Vec<String>>,
}

impl FakeStatus {
    pub fn new() -> Self {
        Self {
            installed: HashMap::new(),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn installed(mut self, id: &str, version: &str) -> Self {
        self.installed.insert(id.to_string(), version.to_string());
        self
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageStatusRepository for FakeStatus {
    async fn resolve(&self, id: &str, _cancel: &CancellationToken) -> Option<Package> {
        self.resolved.lock().unwrap().push(id.to_string());
        let version = self.installed.get(id)?;
        Some(
            Package::new(id)
                .set_installed(true)
                .with_installed_version(version.clone())
                .with_available_version(version.clone()),
        )
    }

    async fn details(&self, _id: &str, _cancel: &CancellationToken) -> Option<Package> {
        None
    }

    async fn is_tool_available(&self) -> bool {
        true
    }
}

/// In-memory catalog; custom additions are appended to the same list.
pub struct FakeCatalog {
    packages: Mutex<Vec<Package>>,
    saved: Mutex<Option<Vec<Package>>>,
}

impl FakeCatalog {
    pub fn with_packages(packages: Vec<Package>) -> Self {
        Self {
            packages: Mutex::new(packages),
            saved: Mutex::new(None),
        }
    }

    /// Last list passed to `save_packages`.
    pub fn saved(&self) -> Option<Vec<Package>> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogRepository for FakeCatalog {
    async fn load_packages(&self) -> anyhow::Result<Vec<Package>> {
        Ok(self.packages.lock().unwrap().clone())
    }

    async fn save_packages(&self, packages: &[Package]) -> anyhow::Result<()> {
        *self.packages.lock().unwrap() = packages.to_vec();
        *self.saved.lock().unwrap() = Some(packages.to_vec());
        Ok(())
    }

    async fn add_to_custom(&self, package: Package) -> anyhow::Result<bool> {
        let mut packages = self.packages.lock().unwrap();
        if packages.iter().any(|p| p.id == package.id) {
            return Ok(false);
        }
        packages.push(package);
        Ok(true)
    }

    async fn remove_from_custom(&self, package_id: &str) -> anyhow::Result<bool> {
        let mut packages = self.packages.lock().unwrap();
        let before = packages.len();
        packages.retain(|p| p.id != package_id);
        Ok(packages.len() != before)
    }
}
