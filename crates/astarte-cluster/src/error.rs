use thiserror::Error;

use crate::manifests::ManifestKind;

/// Failures talking to the cluster API. `AlreadyExists` is split out so the
/// installer can downgrade it to a warning.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error(transparent)]
    Api(#[from] kube::Error),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("manifest has no kind field")]
    MissingKind,
    #[error("unsupported manifest kind \"{0}\"")]
    UnsupportedKind(String),
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Astarte Operator is already installed in your cluster")]
    AlreadyInstalled,
    #[error("could not check for an existing operator deployment: {0}")]
    Precondition(#[source] ClusterError),
    #[error("could not resolve the latest stable operator release: {0}")]
    Release(#[source] anyhow::Error),
    #[error("could not fetch manifest {path}: {source}; your deployment might be incomplete")]
    Content {
        path: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not decode manifest {path}: {source}; your deployment might be incomplete")]
    Decode {
        path: &'static str,
        #[source]
        source: ManifestError,
    },
    #[error("manifest {path} declares kind {found}, expected {expected}")]
    UnexpectedKind {
        path: &'static str,
        expected: ManifestKind,
        found: ManifestKind,
    },
    #[error("error while deploying {resource}: {source}; your deployment might be incomplete")]
    Apply {
        resource: &'static str,
        #[source]
        source: ClusterError,
    },
    #[error("could not read confirmation: {0}")]
    Confirm(#[source] std::io::Error),
}
