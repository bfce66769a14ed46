use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::ClusterError;
use crate::manifests::OperatorManifest;

/// One observed deployment status update from the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub name: String,
    pub ready_replicas: i32,
}

/// The cluster operations the installer sequences. Passed in explicitly so
/// tests can substitute a fake for the kube-backed implementation.
#[async_trait]
pub trait ClusterOps {
    /// Whether the operator deployment is already present.
    async fn operator_deployment_exists(&self) -> Result<bool, ClusterError>;

    /// Create one resource. An existing resource of the same name surfaces
    /// as `ClusterError::AlreadyExists`.
    async fn apply(&self, manifest: OperatorManifest) -> Result<(), ClusterError>;

    /// Subscribe to deployment status updates in the operator namespace.
    /// Dropping the stream releases the watch.
    async fn watch_operator_deployments(
        &self,
    ) -> Result<BoxStream<'static, DeploymentStatus>, ClusterError>;
}
