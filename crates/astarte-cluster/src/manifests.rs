use std::fmt;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;

use crate::error::ManifestError;

/// The resource kinds the operator installation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    ServiceAccount,
    ClusterRole,
    ClusterRoleBinding,
    CustomResourceDefinition,
    Deployment,
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManifestKind::ServiceAccount => "ServiceAccount",
            ManifestKind::ClusterRole => "ClusterRole",
            ManifestKind::ClusterRoleBinding => "ClusterRoleBinding",
            ManifestKind::CustomResourceDefinition => "CustomResourceDefinition",
            ManifestKind::Deployment => "Deployment",
        };
        f.write_str(name)
    }
}

/// A decoded operator manifest. One variant per known resource shape, so a
/// mismatched document fails at decode time instead of at the API server.
#[derive(Debug, Clone)]
pub enum OperatorManifest {
    ServiceAccount(ServiceAccount),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    CustomResourceDefinition(CustomResourceDefinition),
    Deployment(Deployment),
}

impl OperatorManifest {
    pub fn kind(&self) -> ManifestKind {
        match self {
            OperatorManifest::ServiceAccount(_) => ManifestKind::ServiceAccount,
            OperatorManifest::ClusterRole(_) => ManifestKind::ClusterRole,
            OperatorManifest::ClusterRoleBinding(_) => ManifestKind::ClusterRoleBinding,
            OperatorManifest::CustomResourceDefinition(_) => ManifestKind::CustomResourceDefinition,
            OperatorManifest::Deployment(_) => ManifestKind::Deployment,
        }
    }

    pub fn name(&self) -> String {
        match self {
            OperatorManifest::ServiceAccount(r) => r.name_any(),
            OperatorManifest::ClusterRole(r) => r.name_any(),
            OperatorManifest::ClusterRoleBinding(r) => r.name_any(),
            OperatorManifest::CustomResourceDefinition(r) => r.name_any(),
            OperatorManifest::Deployment(r) => r.name_any(),
        }
    }
}

/// Decode one YAML document into a typed manifest, dispatching on its
/// `kind` field.
pub fn decode_manifest(yaml: &str) -> Result<OperatorManifest, ManifestError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let kind = value
        .get("kind")
        .and_then(serde_yaml::Value::as_str)
        .ok_or(ManifestError::MissingKind)?
        .to_string();

    let manifest = match kind.as_str() {
        "ServiceAccount" => OperatorManifest::ServiceAccount(serde_yaml::from_value(value)?),
        "ClusterRole" => OperatorManifest::ClusterRole(serde_yaml::from_value(value)?),
        "ClusterRoleBinding" => OperatorManifest::ClusterRoleBinding(serde_yaml::from_value(value)?),
        "CustomResourceDefinition" => {
            OperatorManifest::CustomResourceDefinition(serde_yaml::from_value(value)?)
        }
        "Deployment" => OperatorManifest::Deployment(serde_yaml::from_value(value)?),
        other => return Err(ManifestError::UnsupportedKind(other.to_string())),
    };
    Ok(manifest)
}
