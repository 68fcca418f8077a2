use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::api::server::SharedAppState;
use crate::client::SandboxItemParams;
use crate::common::error::{ErrorResponse, GatewayError, Result};
use crate::common::validation::validate_positive;
use crate::poller::{wait_for_item, WaitOptions, DEFAULT_INTERVAL_MS, DEFAULT_MAX_TRIES};

/// Upstream marker for accounts that cannot create items through the API
pub const ITEMS_API_DISABLED_MARKER: &str = "CREATE_ITEMS_API_FREE_DISABLED";

pub fn routes() -> Router<SharedAppState> {
    Router::new()
        .route("/sandbox/items", post(handle_create_item))
        .route("/sandbox/items/:item_id", get(handle_get_item))
        .route("/sandbox/items/:item_id/wait", get(handle_wait_for_item))
}

/// POST /sandbox/items
///
/// Any failure is reported as 400, or 403 when the upstream refuses API
/// item creation for the account.
async fn handle_create_item(
    State(state): State<SharedAppState>,
    body: std::result::Result<Json<SandboxItemParams>, JsonRejection>,
) -> Response {
    let params = match body {
        Ok(Json(params)) => params,
        Err(e) => return GatewayError::validation(e.body_text()).into_response(),
    };

    let mut client = state.client();
    match client.create_sandbox_item(&params).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => {
            let disabled = e
                .upstream_body()
                .map_or(false, |body| body.contains(ITEMS_API_DISABLED_MARKER));
            let status = if disabled {
                StatusCode::FORBIDDEN
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(status = status.as_u16(), error = %e, "Sandbox item creation failed");
            (status, Json(ErrorResponse::from(&e))).into_response()
        }
    }
}

/// GET /sandbox/items/:item_id
async fn handle_get_item(
    State(state): State<SharedAppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>> {
    let mut client = state.client();
    let item = client.get_item(&item_id).await?;
    Ok(Json(item))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitQuery {
    pub interval_ms: Option<u64>,
    pub max_tries: Option<u32>,
}

impl WaitQuery {
    pub fn into_options(self) -> Result<WaitOptions> {
        validate_positive(self.interval_ms, "intervalMs")
            .merge(validate_positive(self.max_tries, "maxTries"))
            .into_result()?;

        Ok(WaitOptions {
            interval: Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)),
            max_tries: self.max_tries.unwrap_or(DEFAULT_MAX_TRIES),
        })
    }
}

/// GET /sandbox/items/:item_id/wait?intervalMs&maxTries
///
/// 200 with the item once terminal, 202 `{timeout: true, last}` otherwise.
async fn handle_wait_for_item(
    State(state): State<SharedAppState>,
    Path(item_id): Path<String>,
    query: std::result::Result<Query<WaitQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Query(query) = query.map_err(|e| GatewayError::validation(e.body_text()))?;
    let options = query.into_options()?;

    let mut client = state.client();
    let outcome = wait_for_item(&mut client, &item_id, &options).await?;

    let status = if outcome.is_timeout() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.into_body())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get, post_json, script_auth, send, test_app};
    use crate::client::MemoryTransport;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_item_applies_defaults() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::POST, "/items", 200, json!({"id": "item1", "status": "UPDATING"}))
            .await;

        let (status, body) =
            send(test_app(&transport, None), post_json("/sandbox/items", json!({}))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "item1");

        let calls = transport.calls().await;
        let sent = calls[1].body.as_ref().unwrap();
        assert_eq!(sent["connectorId"], 2);
        assert_eq!(sent["parameters"]["user"], "user-ok");
        assert_eq!(sent["parameters"]["password"], "password-ok");
    }

    #[tokio::test]
    async fn test_create_item_disabled_is_403() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(
                Method::POST,
                "/items",
                403,
                json!({"code": 403, "codeDescription": "CREATE_ITEMS_API_FREE_DISABLED"}),
            )
            .await;

        let (status, body) =
            send(test_app(&transport, None), post_json("/sandbox/items", json!({}))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("CREATE_ITEMS_API_FREE_DISABLED"));
    }

    #[tokio::test]
    async fn test_create_item_other_failures_are_400() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::POST, "/items", 500, json!({"message": "connector offline"}))
            .await;

        let (status, _) =
            send(test_app(&transport, None), post_json("/sandbox/items", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            test_app(&transport, None),
            post_json("/sandbox/items", json!({"webhookUrl": "not-a-url"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_item() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::GET, "/items/item1", 200, json!({"id": "item1", "status": "UPDATED"}))
            .await;

        let (status, body) = send(test_app(&transport, None), get("/sandbox/items/item1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UPDATED");
    }

    #[tokio::test]
    async fn test_get_item_keeps_encoded_id_in_one_segment() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::GET, "/transactions", 200, json!({"results": [{"id": "tx1"}]}))
            .await;

        let (status, _) = send(
            test_app(&transport, None),
            get("/sandbox/items/..%2Ftransactions%3FaccountId=victim%23"),
        )
        .await;

        assert_ne!(status, StatusCode::OK);
        let calls = transport.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].path(), "/items/..%2Ftransactions%3FaccountId=victim%23");
        assert!(calls[1].query_param("accountId").is_none());
    }

    #[tokio::test]
    async fn test_get_item_rejects_dot_segment() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;

        let (status, body) = send(test_app(&transport, None), get("/sandbox/items/%2E%2E")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(transport.total_calls().await, 0);
    }

    #[tokio::test]
    async fn test_wait_returns_terminal_item() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        for status in ["UPDATING", "UPDATING", "LOGIN_ERROR"] {
            transport
                .respond(Method::GET, "/items/item1", 200, json!({"id": "item1", "status": status}))
                .await;
        }

        let (status, body) = send(
            test_app(&transport, None),
            get("/sandbox/items/item1/wait?intervalMs=1&maxTries=5"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "LOGIN_ERROR");
        assert_eq!(transport.call_count(Method::GET, "/items/item1").await, 3);
        assert_eq!(transport.call_count(Method::POST, "/auth").await, 1);
    }

    #[tokio::test]
    async fn test_wait_timeout_is_202() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::GET, "/items/item1", 200, json!({"id": "item1", "status": "UPDATING"}))
            .await;

        let (status, body) = send(
            test_app(&transport, None),
            get("/sandbox/items/item1/wait?intervalMs=1&maxTries=3"),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["timeout"], true);
        assert_eq!(body["last"]["status"], "UPDATING");
        assert_eq!(transport.call_count(Method::GET, "/items/item1").await, 3);
    }

    #[tokio::test]
    async fn test_wait_rejects_non_positive_query() {
        let transport = MemoryTransport::new();

        let (status, _) = send(
            test_app(&transport, None),
            get("/sandbox/items/item1/wait?maxTries=0"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(transport.total_calls().await, 0);
    }

    #[test]
    fn test_wait_query_defaults() {
        let options = WaitQuery::default().into_options().unwrap();
        assert_eq!(options.interval, Duration::from_millis(2000));
        assert_eq!(options.max_tries, 15);
    }
}
