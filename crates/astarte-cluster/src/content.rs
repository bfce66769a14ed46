use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::releases::{ASTARTE_GITHUB_ORG, OPERATOR_REPO};

/// Fetches raw manifest text by repository path and release version.
#[async_trait]
pub trait ContentSource {
    async fn fetch(&self, path: &str, version: &str) -> Result<String>;
}

/// Content source backed by the GitHub contents API, pinned to the
/// `v{version}` tag. A fetch failure is an error: applying an empty
/// manifest in its place would corrupt the install sequence.
#[derive(Debug, Clone)]
pub struct GithubContentSource {
    http: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    user_agent: String,
}

impl GithubContentSource {
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

    /// Content of the Astarte operator repository.
    pub fn astarte_operator(base_url: impl Into<String>) -> Self {
        Self::new(base_url, ASTARTE_GITHUB_ORG, OPERATOR_REPO)
    }
}

#[async_trait]
impl ContentSource for GithubContentSource {
    async fn fetch(&self, path: &str, version: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, self.owner, self.repo, path
        );
        debug!(%url, %version, "content.fetch");
        let response = self
            .http
            .get(&url)
            .query(&[("ref", format!("v{version}"))])
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github.v3.raw")
            .send()
            .await
            .with_context(|| format!("failed to fetch {path}"))?;
        if !response.status().is_success() {
            bail!("content fetch for {path} returned {}", response.status());
        }
        response
            .text()
            .await
            .with_context(|| format!("failed to read {path}"))
    }
}
