//! Installation of the Astarte Kubernetes operator: release resolution,
//! manifest retrieval and decoding, and the ordered install sequence.

pub mod content;
pub mod error;
pub mod installer;
pub mod kube_ops;
pub mod manifests;
pub mod ops;
pub mod prompt;
pub mod releases;

pub use content::{ContentSource, GithubContentSource};
pub use error::{ClusterError, InstallError, ManifestError};
pub use installer::{
    InstallOutcome, OperatorInstaller, Readiness, StepReport, OPERATOR_DEPLOYMENT_NAME,
    OPERATOR_NAMESPACE, READINESS_TIMEOUT,
};
pub use kube_ops::KubeClusterOps;
pub use manifests::{decode_manifest, ManifestKind, OperatorManifest};
pub use ops::{ClusterOps, DeploymentStatus};
pub use prompt::{ConfirmPrompt, StdinPrompt};
pub use releases::{latest_stable_of, GithubReleaseIndex, ReleaseIndex};
