use tracing::debug;

use crate::error::ClientError;
use crate::types::{ApiData, InterfaceDescription};

/// Client for the Realm Management API of a single realm.
#[derive(Debug, Clone)]
pub struct RealmManagementClient {
    http: reqwest::Client,
    base_url: String,
    realm: String,
    token: String,
}

impl RealmManagementClient {
    pub fn new(
        base_url: impl Into<String>,
        realm: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            realm: realm.into(),
            token: token.into(),
        }
    }

    /// Description of an interface at a given major version.
    pub async fn get_interface(
        &self,
        interface: &str,
        major: i32,
    ) -> Result<InterfaceDescription, ClientError> {
        let url = format!(
            "{}/v1/{}/interfaces/{}/{}",
            self.base_url,
            urlencoding::encode(&self.realm),
            urlencoding::encode(interface),
            major
        );
        debug!(%url, "realm_management.request");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }
        let envelope: ApiData<InterfaceDescription> = response.json().await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Aggregation, InterfaceType};
    use axum::{routing::get, Json, Router};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn fetches_interface_by_name_and_major() {
        let app = Router::new().route(
            "/v1/test/interfaces/com.example.Values/1",
            get(|| async {
                Json(serde_json::json!({"data": {
                    "interface_name": "com.example.Values",
                    "version_major": 1,
                    "version_minor": 4,
                    "type": "datastream"
                }}))
            }),
        );
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = RealmManagementClient::new(
            format!("http://{}:{}", addr.ip(), addr.port()),
            "test",
            "token",
        );
        let desc = client.get_interface("com.example.Values", 1).await.unwrap();
        assert_eq!(desc.interface_type, InterfaceType::Datastream);
        assert_eq!(desc.aggregation, Aggregation::Individual);
        assert_eq!(desc.version_minor, 4);
    }
}
