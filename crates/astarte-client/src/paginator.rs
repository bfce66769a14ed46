use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::appengine::AppEngineClient;
use crate::error::ClientError;
use crate::types::DatastreamValue;

/// Sort order of a retrieved result set. The API sorts; the paginator only
/// forwards pages in whatever order was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetOrder {
    Ascending,
    Descending,
}

impl ResultSetOrder {
    fn as_query_value(self) -> &'static str {
        match self {
            ResultSetOrder::Ascending => "ascending",
            ResultSetOrder::Descending => "descending",
        }
    }
}

/// Continuation state. `Start` means no fetch has happened yet, so the
/// paginator reports "has more" until the API says otherwise.
#[derive(Debug, Clone)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    data: Vec<DatastreamValue>,
    #[serde(default)]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

/// Pages through the samples of one datastream path inside a closed time
/// window, hiding the continuation-link mechanics from the caller.
#[derive(Debug)]
pub struct DatastreamPaginator {
    client: AppEngineClient,
    device_id: String,
    interface: String,
    path: String,
    since: DateTime<Utc>,
    to: DateTime<Utc>,
    order: ResultSetOrder,
    cursor: Cursor,
}

impl DatastreamPaginator {
    pub(crate) fn new(
        client: AppEngineClient,
        device_id: &str,
        interface: &str,
        path: &str,
        since: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        order: ResultSetOrder,
    ) -> Self {
        Self {
            client,
            device_id: device_id.to_string(),
            interface: interface.to_string(),
            path: path.to_string(),
            since: since.unwrap_or(DateTime::UNIX_EPOCH),
            to: to.unwrap_or_else(Utc::now),
            order,
            cursor: Cursor::Start,
        }
    }

    /// True until a fetch comes back without a continuation link.
    pub fn has_next_page(&self) -> bool {
        !matches!(self.cursor, Cursor::Exhausted)
    }

    /// Fetch one page. After exhaustion this returns an empty page without
    /// touching the network.
    pub async fn get_next_page(&mut self) -> Result<Vec<DatastreamValue>, ClientError> {
        let response = match &self.cursor {
            Cursor::Exhausted => return Ok(Vec::new()),
            Cursor::Start => {
                let url = format!(
                    "{}/{}/interfaces/{}{}",
                    self.client.devices_base(),
                    urlencoding::encode(&self.device_id),
                    urlencoding::encode(&self.interface),
                    self.path
                );
                let query = [
                    ("since", self.since.to_rfc3339()),
                    ("to", self.to.to_rfc3339()),
                    ("limit", self.client.page_size().to_string()),
                    ("order", self.order.as_query_value().to_string()),
                ];
                self.client.get_raw(&url, &query).await?
            }
            Cursor::Next(link) => {
                let url = self.resolve_link(link);
                self.client.get_raw(&url, &[]).await?
            }
        };

        let page: PageResponse = response.json().await?;
        self.cursor = match page.links.next {
            Some(next) => Cursor::Next(next),
            None => Cursor::Exhausted,
        };
        debug!(
            samples = page.data.len(),
            has_next = self.has_next_page(),
            "paginator.page"
        );
        Ok(page.data)
    }

    /// Continuation links come back server-relative; absolute links are
    /// honored as-is.
    fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}{}", self.client.base_url(), link)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::{routing::get, Json, Router};
    use tokio::net::TcpListener;

    #[derive(Clone)]
    struct PagedState {
        requests: Arc<AtomicUsize>,
        pages: Arc<Vec<serde_json::Value>>,
    }

    fn sample(ts: &str, value: i64) -> serde_json::Value {
        serde_json::json!({
            "value": value,
            "timestamp": ts,
            "reception_timestamp": ts,
        })
    }

    /// Three ascending pages keyed by a `cursor` query parameter, linked via
    /// relative `links.next` entries.
    fn three_pages() -> Vec<serde_json::Value> {
        let link = |cursor: usize| {
            format!("/v1/test/devices/2TBn-jNESuuHamE2Zo1anA/interfaces/com.example.Values/my/path?cursor={cursor}")
        };
        vec![
            serde_json::json!({
                "data": [sample("2024-03-01T10:00:00Z", 1), sample("2024-03-01T10:00:01Z", 2)],
                "links": {"next": link(1)},
            }),
            serde_json::json!({
                "data": [sample("2024-03-01T10:00:02Z", 3), sample("2024-03-01T10:00:03Z", 4)],
                "links": {"next": link(2)},
            }),
            serde_json::json!({
                "data": [sample("2024-03-01T10:00:04Z", 5)],
                "links": {},
            }),
        ]
    }

    async fn handler(
        State(state): State<PagedState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        state.requests.fetch_add(1, Ordering::SeqCst);
        let index: usize = params
            .get("cursor")
            .map(|c| c.parse().unwrap())
            .unwrap_or(0);
        // The first request must be window-scoped; continuations carry the cursor.
        if index == 0 {
            assert!(params.contains_key("since"));
            assert!(params.contains_key("to"));
            assert_eq!(params.get("limit").map(String::as_str), Some("1000"));
            assert_eq!(params.get("order").map(String::as_str), Some("ascending"));
        }
        Json(state.pages[index].clone())
    }

    async fn serve(state: PagedState) -> String {
        let app = Router::new()
            .route(
                "/v1/test/devices/:device/interfaces/:interface/my/path",
                get(handler),
            )
            .with_state(state);
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}:{}", addr.ip(), addr.port())
    }

    fn paginator(client: &AppEngineClient) -> DatastreamPaginator {
        client.datastream_time_window_paginator(
            "2TBn-jNESuuHamE2Zo1anA",
            "com.example.Values",
            "/my/path",
            None,
            None,
            ResultSetOrder::Ascending,
        )
    }

    #[tokio::test]
    async fn concatenated_pages_preserve_global_order() {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = PagedState {
            requests: requests.clone(),
            pages: Arc::new(three_pages()),
        };
        let base = serve(state).await;
        let client = AppEngineClient::new(base, "test", "token");

        let mut paginator = paginator(&client);
        assert!(paginator.has_next_page(), "paginator must start hungry");

        let mut all = Vec::new();
        while paginator.has_next_page() {
            all.extend(paginator.get_next_page().await.unwrap());
        }

        let values: Vec<i64> = all.iter().map(|v| v.value.as_i64().unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        let mut sorted = all.clone();
        sorted.sort_by_key(|v| v.timestamp);
        assert_eq!(
            all.iter().map(|v| v.timestamp).collect::<Vec<_>>(),
            sorted.iter().map(|v| v.timestamp).collect::<Vec<_>>(),
        );
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_paginator_is_idempotent() {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = PagedState {
            requests: requests.clone(),
            pages: Arc::new(three_pages()),
        };
        let base = serve(state).await;
        let client = AppEngineClient::new(base, "test", "token");

        let mut paginator = paginator(&client);
        while paginator.has_next_page() {
            paginator.get_next_page().await.unwrap();
        }
        let fetched = requests.load(Ordering::SeqCst);

        let empty = paginator.get_next_page().await.unwrap();
        assert!(empty.is_empty());
        assert!(!paginator.has_next_page());
        assert_eq!(requests.load(Ordering::SeqCst), fetched, "no call after exhaustion");
    }

    #[tokio::test]
    async fn early_termination_does_not_over_fetch() {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = PagedState {
            requests: requests.clone(),
            pages: Arc::new(three_pages()),
        };
        let base = serve(state).await;
        let client = AppEngineClient::new(base, "test", "token");

        let mut paginator = paginator(&client);
        let first = paginator.get_next_page().await.unwrap();
        assert_eq!(first.len(), 2);
        drop(paginator);

        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_without_retry() {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let app = Router::new().route(
            "/v1/test/devices/:device/interfaces/:interface/my/path",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }
            }),
        );
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        let client = AppEngineClient::new(
            format!("http://{}:{}", addr.ip(), addr.port()),
            "test",
            "token",
        );

        let mut paginator = paginator(&client);
        let err = paginator.get_next_page().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { .. }));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }
}
