use anyhow::{Context, Result};
use tracing::info;

use astarte_cluster::{
    GithubContentSource, GithubReleaseIndex, InstallOutcome, KubeClusterOps, OperatorInstaller,
    Readiness, StdinPrompt,
};

use super::ClusterCommands;

pub async fn handle(command: ClusterCommands) -> Result<()> {
    match command {
        ClusterCommands::InstallOperator {
            version,
            non_interactive,
        } => install_operator(version, non_interactive).await,
    }
}

async fn install_operator(version: Option<String>, non_interactive: bool) -> Result<()> {
    let github_base = std::env::var("ASTARTECTL_GITHUB_API_BASE")
        .unwrap_or_else(|_| astarte_cluster::releases::DEFAULT_GITHUB_API_BASE.to_string());
    let client = kube::Client::try_default()
        .await
        .context("could not connect to the Kubernetes cluster")?;

    let installer = OperatorInstaller::new(
        KubeClusterOps::new(client),
        GithubReleaseIndex::astarte_operator(&github_base),
        GithubContentSource::astarte_operator(&github_base),
        StdinPrompt,
    );

    match installer.install(version, non_interactive).await? {
        InstallOutcome::Declined => Ok(()),
        InstallOutcome::Installed {
            version, readiness, ..
        } => {
            info!(
                event = "install_operator.finished",
                %version,
                verified = readiness == Readiness::Ready
            );
            Ok(())
        }
    }
}
