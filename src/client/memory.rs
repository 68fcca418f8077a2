//! In-Memory Transport
//!
//! Replays scripted upstream responses and records every request.
//! Used by tests to stand in for the Pluggy API and the enrichment service.

use async_trait::async_trait;
use reqwest::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::transport::{Transport, TransportError, UpstreamRequest, UpstreamResponse};

type RouteKey = (String, String);

/// In-memory transport
///
/// Responses are keyed by method and URL path (query ignored). Each route
/// holds a queue; the last queued response keeps answering once the
/// others are consumed. Unscripted routes answer 404.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    routes: Arc<RwLock<HashMap<RouteKey, VecDeque<UpstreamResponse>>>>,
    calls: Arc<RwLock<Vec<UpstreamRequest>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response for `method path`
    pub async fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.respond_text(method, path, status, body.to_string()).await;
    }

    /// Queue a raw text response for `method path`
    pub async fn respond_text(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        let mut routes = self.routes.write().await;
        routes
            .entry(route_key(&method, path))
            .or_default()
            .push_back(UpstreamResponse::new(status, body));
    }

    /// Every request sent so far, in order
    pub async fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.read().await.clone()
    }

    /// Number of requests sent to `method path`
    pub async fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.method == method && c.path() == path)
            .count()
    }

    /// Total number of requests sent
    pub async fn total_calls(&self) -> usize {
        self.calls.read().await.len()
    }
}

fn route_key(method: &Method, path: &str) -> RouteKey {
    (method.as_str().to_string(), path.to_string())
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let key = route_key(&request.method, &request.path());
        self.calls.write().await.push(request);

        let mut routes = self.routes.write().await;
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            UpstreamResponse::new(
                404,
                serde_json::json!({
                    "message": format!("no scripted response for {} {}", key.0, key.1)
                })
                .to_string(),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_then_sticky_last() {
        let transport = MemoryTransport::new();
        transport.respond(Method::GET, "/items/1", 200, json!({"status": "UPDATING"})).await;
        transport.respond(Method::GET, "/items/1", 200, json!({"status": "UPDATED"})).await;

        let request = UpstreamRequest::new(Method::GET, "https://api.test/items/1");
        let first = transport.send(request.clone()).await.unwrap();
        let second = transport.send(request.clone()).await.unwrap();
        let third = transport.send(request).await.unwrap();

        assert!(first.body.contains("UPDATING"));
        assert!(second.body.contains("UPDATED"));
        assert!(third.body.contains("UPDATED"));
        assert_eq!(transport.call_count(Method::GET, "/items/1").await, 3);
    }

    #[tokio::test]
    async fn test_query_is_ignored_for_matching() {
        let transport = MemoryTransport::new();
        transport.respond(Method::GET, "/items", 200, json!({"results": []})).await;

        let response = transport
            .send(UpstreamRequest::new(Method::GET, "https://api.test/items?page=2"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_404() {
        let transport = MemoryTransport::new();
        let response = transport
            .send(UpstreamRequest::new(Method::POST, "https://api.test/auth"))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(response.body.contains("POST /auth"));
        assert_eq!(transport.total_calls().await, 1);
    }
}
