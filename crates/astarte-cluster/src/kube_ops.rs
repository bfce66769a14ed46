use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams, WatchEvent, WatchParams};
use kube::{Client, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ClusterError;
use crate::installer::{OPERATOR_DEPLOYMENT_NAME, OPERATOR_NAMESPACE, READINESS_TIMEOUT};
use crate::manifests::OperatorManifest;
use crate::ops::{ClusterOps, DeploymentStatus};

/// `ClusterOps` backed by a real Kubernetes cluster, everything namespaced
/// resources in `kube-system`.
#[derive(Clone)]
pub struct KubeClusterOps {
    client: Client,
}

impl KubeClusterOps {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), OPERATOR_NAMESPACE)
    }
}

async fn create_resource<K>(
    api: Api<K>,
    kind: &'static str,
    resource: K,
) -> Result<(), ClusterError>
where
    K: kube::Resource + Clone + Serialize + DeserializeOwned + std::fmt::Debug,
{
    let name = resource.name_any();
    debug!(kind, %name, "cluster.create");
    match api.create(&PostParams::default(), &resource).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(response)) if response.code == 409 => {
            Err(ClusterError::AlreadyExists { kind, name })
        }
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl ClusterOps for KubeClusterOps {
    async fn operator_deployment_exists(&self) -> Result<bool, ClusterError> {
        match self.deployments().get(OPERATOR_DEPLOYMENT_NAME).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn apply(&self, manifest: OperatorManifest) -> Result<(), ClusterError> {
        let client = self.client.clone();
        match manifest {
            OperatorManifest::ServiceAccount(resource) => {
                create_resource(
                    Api::namespaced(client, OPERATOR_NAMESPACE),
                    "Service Account",
                    resource,
                )
                .await
            }
            OperatorManifest::ClusterRole(resource) => {
                create_resource(Api::all(client), "Cluster Role", resource).await
            }
            OperatorManifest::ClusterRoleBinding(resource) => {
                create_resource(Api::all(client), "Cluster Role Binding", resource).await
            }
            OperatorManifest::CustomResourceDefinition(resource) => {
                create_resource(Api::all(client), "Custom Resource Definition", resource).await
            }
            OperatorManifest::Deployment(resource) => {
                create_resource(
                    Api::namespaced(client, OPERATOR_NAMESPACE),
                    "Deployment",
                    resource,
                )
                .await
            }
        }
    }

    async fn watch_operator_deployments(
        &self,
    ) -> Result<BoxStream<'static, DeploymentStatus>, ClusterError> {
        let params = WatchParams::default().timeout(READINESS_TIMEOUT.as_secs() as u32);
        let events = self.deployments().watch(&params, "0").await?;
        let stream = events
            .filter_map(|event| async move {
                match event {
                    Ok(WatchEvent::Added(deployment)) | Ok(WatchEvent::Modified(deployment)) => {
                        let ready_replicas = deployment
                            .status
                            .as_ref()
                            .and_then(|status| status.ready_replicas)
                            .unwrap_or(0);
                        Some(DeploymentStatus {
                            name: deployment.name_any(),
                            ready_replicas,
                        })
                    }
                    _ => None,
                }
            })
            .boxed();
        Ok(stream)
    }
}
