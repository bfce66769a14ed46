use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::paginator::{DatastreamPaginator, ResultSetOrder};
use crate::types::{AggregateDatastreamSnapshot, ApiData, DatastreamValue, DeviceDetails};

const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Client for the AppEngine API of a single realm.
#[derive(Debug, Clone)]
pub struct AppEngineClient {
    http: reqwest::Client,
    base_url: String,
    realm: String,
    token: String,
    page_size: u32,
}

impl AppEngineClient {
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
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the per-request sample limit used by paginators.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn list_devices(&self) -> Result<Vec<String>, ClientError> {
        let url = format!(
            "{}/v1/{}/devices",
            self.base_url,
            urlencoding::encode(&self.realm)
        );
        self.get_json(&url).await
    }

    pub async fn get_device(&self, device_id: &str) -> Result<DeviceDetails, ClientError> {
        let url = format!("{}/{}", self.devices_base(), urlencoding::encode(device_id));
        self.get_json(&url).await
    }

    /// Last received sample for each path of an individual datastream interface.
    pub async fn get_datastream_snapshot(
        &self,
        device_id: &str,
        interface: &str,
    ) -> Result<HashMap<String, DatastreamValue>, ClientError> {
        let url = format!(
            "{}/{}/interfaces/{}/snapshot",
            self.devices_base(),
            urlencoding::encode(device_id),
            urlencoding::encode(interface)
        );
        self.get_json(&url).await
    }

    /// Last received aggregate for an object datastream interface.
    pub async fn get_aggregate_datastream_snapshot(
        &self,
        device_id: &str,
        interface: &str,
    ) -> Result<AggregateDatastreamSnapshot, ClientError> {
        let url = format!(
            "{}/{}/interfaces/{}/aggregate",
            self.devices_base(),
            urlencoding::encode(device_id),
            urlencoding::encode(interface)
        );
        self.get_json(&url).await
    }

    /// Currently known values of a properties interface.
    pub async fn get_properties(
        &self,
        device_id: &str,
        interface: &str,
    ) -> Result<HashMap<String, serde_json::Value>, ClientError> {
        let url = format!(
            "{}/{}/interfaces/{}/properties",
            self.devices_base(),
            urlencoding::encode(device_id),
            urlencoding::encode(interface)
        );
        self.get_json(&url).await
    }

    /// Paginator over the samples of a datastream path inside the closed
    /// window `[since, to]`. `since` defaults to the epoch, `to` to now.
    pub fn datastream_time_window_paginator(
        &self,
        device_id: &str,
        interface: &str,
        path: &str,
        since: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        order: ResultSetOrder,
    ) -> DatastreamPaginator {
        DatastreamPaginator::new(self.clone(), device_id, interface, path, since, to, order)
    }

    pub(crate) fn devices_base(&self) -> String {
        format!(
            "{}/v1/{}/devices",
            self.base_url,
            urlencoding::encode(&self.realm)
        )
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get_raw(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, ClientError> {
        debug!(%url, "appengine.request");
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.get_raw(url, &[]).await?;
        let envelope: ApiData<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}:{}", addr.ip(), addr.port())
    }

    #[tokio::test]
    async fn lists_devices_from_data_envelope() {
        let app = Router::new().route(
            "/v1/test/devices",
            get(|| async { Json(serde_json::json!({"data": ["a", "b"]})) }),
        );
        let base = serve(app).await;

        let client = AppEngineClient::new(base, "test", "token");
        let devices = client.list_devices().await.unwrap();
        assert_eq!(devices, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn decodes_device_details() {
        let app = Router::new().route(
            "/v1/test/devices/2TBn-jNESuuHamE2Zo1anA",
            get(|| async {
                Json(serde_json::json!({"data": {
                    "id": "2TBn-jNESuuHamE2Zo1anA",
                    "connected": true,
                    "introspection": {
                        "com.example.Sensors": {"major": 1, "minor": 2}
                    },
                    "total_received_msgs": 42,
                    "total_received_bytes": 1024
                }}))
            }),
        );
        let base = serve(app).await;

        let client = AppEngineClient::new(base, "test", "token");
        let details = client.get_device("2TBn-jNESuuHamE2Zo1anA").await.unwrap();
        assert!(details.connected);
        assert_eq!(details.introspection["com.example.Sensors"].major, 1);
        assert_eq!(details.total_received_bytes, 1024);
    }

    #[tokio::test]
    async fn non_success_status_surfaces_body() {
        let app = Router::new().route(
            "/v1/test/devices",
            get(|| async {
                (
                    axum::http::StatusCode::FORBIDDEN,
                    Json(serde_json::json!({"errors": {"detail": "Forbidden"}})),
                )
            }),
        );
        let base = serve(app).await;

        let client = AppEngineClient::new(base, "test", "token");
        let err = client.list_devices().await.unwrap_err();
        match err {
            ClientError::UnexpectedStatus { status, body } => {
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
                assert!(body.contains("Forbidden"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
