use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::ActionError;
use crate::domain::repositories::PackageRepository;
use crate::infrastructure::winget::command::WingetCommand;
use async_trait::async_trait;
use std::sync::Arc;

pub struct WingetPackageRepository {
    command: Arc<WingetCommand>,
}

impl WingetPackageRepository {
    pub fn new(command: Arc<WingetCommand>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl PackageRepository for WingetPackageRepository {
    async fn install_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        tracing::info!("Installing package {}", id);
        let output = self.command.install(id, cancel).await?;
        tracing::debug!("Install of {} printed {} lines", id, output.stdout.len());
        Ok(())
    }

    async fn uninstall_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        tracing::info!("Uninstalling package {}", id);
        let output = self.command.uninstall(id, cancel).await?;
        tracing::debug!("Uninstall of {} printed {} lines", id, output.stdout.len());
        Ok(())
    }

    async fn upgrade_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        tracing::info!("Upgrading package {}", id);
        let output = self.command.upgrade(id, cancel).await?;
        tracing::debug!("Upgrade of {} printed {} lines", id, output.stdout.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{ProcessOutput, ProcessStatus};
    use crate::test_support::ScriptedRunner;
    use std::time::Duration;

    fn repository(runner: Arc<ScriptedRunner>) -> WingetPackageRepository {
        WingetPackageRepository::new(Arc::new(WingetCommand::new(
            runner,
            Duration::from_secs(10),
            Duration::from_secs(600),
        )))
    }

    #[tokio::test]
    async fn test_actions_invoke_matching_verbs() {
        let runner = Arc::new(ScriptedRunner::new());
        let repository = repository(runner.clone());
        let cancel = CancellationToken::new();

        repository.install_package("A.A", &cancel).await.unwrap();
        repository.uninstall_package("B.B", &cancel).await.unwrap();
        repository.upgrade_package("C.C", &cancel).await.unwrap();

        let verbs: Vec<String> = runner
            .calls()
            .iter()
            .map(|c| c.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(verbs, vec!["install --id A.A", "uninstall --id B.B", "upgrade --id C.C"]);
    }

    #[tokio::test]
    async fn test_canceled_run_is_not_a_failure() {
        let runner = Arc::new(ScriptedRunner::new().respond(
            "install --id A.A",
            ProcessOutput::failure(ProcessStatus::Canceled, ""),
        ));

        let result = repository(runner)
            .install_package("A.A", &CancellationToken::new())
            .await;

        assert_eq!(result, Err(ActionError::Canceled));
    }
}
