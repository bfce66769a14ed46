use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const ASTARTE_GITHUB_ORG: &str = "astarte-platform";
pub const OPERATOR_REPO: &str = "astarte-kubernetes-operator";

/// Read-only view over the published release tags of the operator.
#[async_trait]
pub trait ReleaseIndex {
    /// Latest stable release, semver-ordered, pre-release tags excluded.
    async fn latest_stable(&self) -> Result<String>;
}

/// Pick the highest stable version out of a tag listing. Tags that do not
/// parse as semver (with an optional `v` prefix) are skipped, and so is
/// anything carrying a pre-release component such as `-snapshot`.
pub fn latest_stable_of<'a>(tags: impl IntoIterator<Item = &'a str>) -> Option<String> {
    tags.into_iter()
        .filter_map(|tag| semver::Version::parse(tag.trim_start_matches('v')).ok())
        .filter(|version| version.pre.is_empty())
        .max()
        .map(|version| version.to_string())
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Tag listing backed by the GitHub repository API.
#[derive(Debug, Clone)]
pub struct GithubReleaseIndex {
    http: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    user_agent: String,
}

impl GithubReleaseIndex {
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            owner: owner.into(),
            repo: repo.into(),
            user_agent: format!("astartectl/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Index of the Astarte operator repository.
    pub fn astarte_operator(base_url: impl Into<String>) -> Self {
        Self::new(base_url, ASTARTE_GITHUB_ORG, OPERATOR_REPO)
    }

    async fn tags(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/tags",
            self.base_url, self.owner, self.repo
        );
        debug!(%url, "releases.list_tags");
        let response = self
            .http
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .context("failed to list release tags")?;
        if !response.status().is_success() {
            bail!("tag listing returned {}", response.status());
        }
        let tags: Vec<Tag> = response
            .json()
            .await
            .context("failed to parse tag listing")?;
        Ok(tags.into_iter().map(|tag| tag.name).collect())
    }
}

#[async_trait]
impl ReleaseIndex for GithubReleaseIndex {
    async fn latest_stable(&self) -> Result<String> {
        let tags = self.tags().await?;
        latest_stable_of(tags.iter().map(String::as_str))
            .with_context(|| format!("no stable release tag in {}/{}", self.owner, self.repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use tokio::net::TcpListener;

    #[test]
    fn stable_resolution_skips_snapshot_tags() {
        let tags = ["v1.0.0", "v1.1.0", "v1.1.0-snapshot"];
        assert_eq!(latest_stable_of(tags), Some("1.1.0".to_string()));
    }

    #[test]
    fn non_semver_tags_are_ignored() {
        let tags = ["snapshot", "v0.10.2", "release-candidate", "v0.11.0"];
        assert_eq!(latest_stable_of(tags), Some("0.11.0".to_string()));
    }

    #[test]
    fn empty_or_all_prerelease_yields_none() {
        assert_eq!(latest_stable_of([]), None);
        assert_eq!(latest_stable_of(["v1.0.0-snapshot", "v2.0.0-rc.1"]), None);
    }

    #[tokio::test]
    async fn lists_tags_from_github_shape() {
        let app = Router::new().route(
            "/repos/astarte-platform/astarte-kubernetes-operator/tags",
            get(|| async {
                Json(serde_json::json!([
                    {"name": "v1.0.0", "commit": {"sha": "aaa"}},
                    {"name": "v1.1.0", "commit": {"sha": "bbb"}},
                    {"name": "v1.1.0-snapshot", "commit": {"sha": "ccc"}}
                ]))
            }),
        );
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let index =
            GithubReleaseIndex::astarte_operator(format!("http://{}:{}", addr.ip(), addr.port()));
        assert_eq!(index.latest_stable().await.unwrap(), "1.1.0");
    }
}
