use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::ActionError;
use crate::domain::repositories::{ProcessOutput, ToolRunner};
use crate::domain::services::PackageValidator;
use std::sync::Arc;
use std::time::Duration;

const ACCEPT_SOURCE: &str = "--accept-source-agreements";
const ACCEPT_PACKAGE: &str = "--accept-package-agreements";

/// Argument lists for every tool invocation, executed through a [`ToolRunner`].
pub struct WingetCommand {
    runner: Arc<dyn ToolRunner>,
    query_timeout: Duration,
    action_timeout: Duration,
}

impl WingetCommand {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        query_timeout: Duration,
        action_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            query_timeout,
            action_timeout,
        }
    }

    pub fn tool(&self) -> &str {
        self.runner.executable()
    }

    async fn query(&self, args: &[&str], cancel: &CancellationToken) -> String {
        self.runner.run(args, cancel, self.query_timeout).await.text()
    }

    async fn execute_action(
        &self,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ActionError> {
        self.runner
            .run(args, cancel, self.action_timeout)
            .await
            .into_action_result(self.tool(), self.action_timeout)
    }

    pub async fn version(&self) -> String {
        self.query(&["--version"], &CancellationToken::new()).await
    }

    pub async fn list_exact(&self, id: &str, cancel: &CancellationToken) -> String {
        self.query(&["list", "--id", id, "--exact", ACCEPT_SOURCE], cancel)
            .await
    }

    /// Substring match, for ids that differ from the one the package registered under.
    pub async fn list_partial(&self, id: &str, cancel: &CancellationToken) -> String {
        self.query(&["list", id, ACCEPT_SOURCE], cancel).await
    }

    pub async fn upgrade_check(&self, id: &str, cancel: &CancellationToken) -> String {
        self.query(&["upgrade", "--id", id, ACCEPT_SOURCE], cancel)
            .await
    }

    pub async fn show(&self, id: &str, cancel: &CancellationToken) -> String {
        self.query(&["show", "--id", id, "--exact", ACCEPT_SOURCE], cancel)
            .await
    }

    pub async fn install(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ActionError> {
        PackageValidator::validate(id)?;
        self.execute_action(
            &["install", "--id", id, "--exact", "--silent", ACCEPT_PACKAGE, ACCEPT_SOURCE],
            cancel,
        )
        .await
    }

    pub async fn uninstall(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ActionError> {
        PackageValidator::validate(id)?;
        self.execute_action(&["uninstall", "--id", id, "--exact", "--silent"], cancel)
            .await
    }

    pub async fn upgrade(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ActionError> {
        PackageValidator::validate(id)?;
        self.execute_action(
            &["upgrade", "--id", id, "--exact", "--silent", ACCEPT_PACKAGE, ACCEPT_SOURCE],
            cancel,
        )
        .await
    }
}
