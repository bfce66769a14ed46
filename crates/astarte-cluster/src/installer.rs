use std::time::Duration;

use futures_util::StreamExt;
use tracing::{info, warn};

use crate::content::ContentSource;
use crate::error::{ClusterError, InstallError};
use crate::manifests::{decode_manifest, ManifestKind};
use crate::ops::ClusterOps;
use crate::prompt::ConfirmPrompt;
use crate::releases::ReleaseIndex;

pub const OPERATOR_DEPLOYMENT_NAME: &str = "astarte-operator";
pub const OPERATOR_NAMESPACE: &str = "kube-system";

/// Upper bound on the post-install readiness wait.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Installation phases, in execution order. RBAC has to land before the
/// CRDs, and both before the operator deployment that uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Rbac,
    Crds,
    Deployment,
}

struct InstallStep {
    phase: Phase,
    kind: ManifestKind,
    path: &'static str,
    label: &'static str,
}

const INSTALL_STEPS: [InstallStep; 6] = [
    InstallStep {
        phase: Phase::Rbac,
        kind: ManifestKind::ServiceAccount,
        path: "deploy/service_account.yaml",
        label: "Service Account",
    },
    InstallStep {
        phase: Phase::Rbac,
        kind: ManifestKind::ClusterRole,
        path: "deploy/role.yaml",
        label: "Cluster Role",
    },
    InstallStep {
        phase: Phase::Rbac,
        kind: ManifestKind::ClusterRoleBinding,
        path: "deploy/role_binding.yaml",
        label: "Cluster Role Binding",
    },
    InstallStep {
        phase: Phase::Crds,
        kind: ManifestKind::CustomResourceDefinition,
        path: "deploy/crds/api_v1alpha1_astarte_crd.yaml",
        label: "Astarte CRD",
    },
    InstallStep {
        phase: Phase::Crds,
        kind: ManifestKind::CustomResourceDefinition,
        path: "deploy/crds/api_v1alpha1_astarte_voyager_ingress_crd.yaml",
        label: "AstarteVoyagerIngress CRD",
    },
    InstallStep {
        phase: Phase::Deployment,
        kind: ManifestKind::Deployment,
        path: "deploy/operator.yaml",
        label: "Astarte Operator Deployment",
    },
];

/// What happened to one install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub resource: &'static str,
    /// False when the resource already existed and the step was skipped
    /// with a warning.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The operator deployment reported at least one ready replica.
    Ready,
    /// The wait timed out or the watch broke; the deployment may still
    /// converge on its own.
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The user declined the confirmation prompt; nothing was mutated.
    Declined,
    Installed {
        version: String,
        steps: Vec<StepReport>,
        readiness: Readiness,
    },
}

/// Applies the operator manifests in a fixed order, tolerating resources
/// that already exist, then waits for the deployment to come up.
pub struct OperatorInstaller<C, R, S, P> {
    cluster: C,
    releases: R,
    content: S,
    prompt: P,
    watch_timeout: Duration,
}

impl<C, R, S, P> OperatorInstaller<C, R, S, P>
where
    C: ClusterOps,
    R: ReleaseIndex,
    S: ContentSource,
    P: ConfirmPrompt,
{
    pub fn new(cluster: C, releases: R, content: S, prompt: P) -> Self {
        Self {
            cluster,
            releases,
            content,
            prompt,
            watch_timeout: READINESS_TIMEOUT,
        }
    }

    pub fn with_watch_timeout(mut self, watch_timeout: Duration) -> Self {
        self.watch_timeout = watch_timeout;
        self
    }

    /// Run the whole install sequence. Steps already applied when a later
    /// step fails are left in place; the error text says so.
    pub async fn install(
        &self,
        version: Option<String>,
        non_interactive: bool,
    ) -> Result<InstallOutcome, InstallError> {
        if self
            .cluster
            .operator_deployment_exists()
            .await
            .map_err(InstallError::Precondition)?
        {
            return Err(InstallError::AlreadyInstalled);
        }

        let version = match version {
            Some(version) => version,
            None => self
                .releases
                .latest_stable()
                .await
                .map_err(InstallError::Release)?,
        };

        println!("Will install Astarte Operator version {version} in the cluster.");
        if !non_interactive
            && !self
                .prompt
                .confirm("Do you want to continue?")
                .map_err(InstallError::Confirm)?
        {
            info!(event = "install.declined", %version);
            return Ok(InstallOutcome::Declined);
        }

        let mut steps = Vec::with_capacity(INSTALL_STEPS.len());
        let mut phase = None;
        for step in &INSTALL_STEPS {
            if phase != Some(step.phase) {
                announce_phase(phase, step.phase);
                phase = Some(step.phase);
            }
            steps.push(self.apply_step(step, &version).await?);
        }

        println!("Astarte Operator successfully installed. Waiting until it is ready...");
        let readiness = self.wait_operator_ready().await;
        match readiness {
            Readiness::Ready => println!("Astarte Operator deployment ready!"),
            Readiness::Unverified => println!(
                "Could not verify if the Astarte Operator deployment was successful. \
                 It may still become ready; check the state of your cluster in a while."
            ),
        }
        info!(event = "install.finished", %version, ready = readiness == Readiness::Ready);

        Ok(InstallOutcome::Installed {
            version,
            steps,
            readiness,
        })
    }

    async fn apply_step(
        &self,
        step: &InstallStep,
        version: &str,
    ) -> Result<StepReport, InstallError> {
        let yaml = self
            .content
            .fetch(step.path, version)
            .await
            .map_err(|source| InstallError::Content {
                path: step.path,
                source,
            })?;
        let manifest = decode_manifest(&yaml).map_err(|source| InstallError::Decode {
            path: step.path,
            source,
        })?;
        if manifest.kind() != step.kind {
            return Err(InstallError::UnexpectedKind {
                path: step.path,
                expected: step.kind,
                found: manifest.kind(),
            });
        }

        match self.cluster.apply(manifest).await {
            Ok(()) => {
                info!(event = "install.step", resource = step.label, created = true);
                Ok(StepReport {
                    resource: step.label,
                    created: true,
                })
            }
            Err(ClusterError::AlreadyExists { .. }) => {
                println!("WARNING: {} already exists in the cluster.", step.label);
                warn!(event = "install.step", resource = step.label, created = false);
                Ok(StepReport {
                    resource: step.label,
                    created: false,
                })
            }
            Err(source) => Err(InstallError::Apply {
                resource: step.label,
                source,
            }),
        }
    }

    /// Time-bounded readiness wait. The timeout drops the stream, which
    /// releases the underlying watch.
    async fn wait_operator_ready(&self) -> Readiness {
        let stream = match self.cluster.watch_operator_deployments().await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(event = "install.watch_failed", %error);
                return Readiness::Unverified;
            }
        };

        let observed = tokio::time::timeout(self.watch_timeout, async move {
            let mut stream = stream;
            while let Some(status) = stream.next().await {
                if status.name == OPERATOR_DEPLOYMENT_NAME && status.ready_replicas >= 1 {
                    return true;
                }
            }
            false
        })
        .await;

        match observed {
            Ok(true) => Readiness::Ready,
            Ok(false) | Err(_) => Readiness::Unverified,
        }
    }
}

fn announce_phase(previous: Option<Phase>, next: Phase) {
    match previous {
        Some(Phase::Rbac) => println!("RBAC roles successfully installed."),
        Some(Phase::Crds) => println!("Astarte Custom Resource Definitions successfully installed."),
        _ => {}
    }
    match next {
        Phase::Rbac => println!("Installing RBAC roles..."),
        Phase::Crds => println!("Installing Astarte Custom Resource Definitions..."),
        Phase::Deployment => println!("Installing Astarte Operator..."),
    }
}
