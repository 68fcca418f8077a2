use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::api::server::SharedAppState;
use crate::common::error::Result;

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/accounts/:item_id", get(handle_accounts))
}

/// GET /accounts/:item_id
async fn handle_accounts(
    State(state): State<SharedAppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>> {
    let mut client = state.client();
    let accounts = client.list_accounts_for_item(&item_id).await?;
    Ok(Json(accounts))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, script_auth, send, test_app};
    use crate::client::MemoryTransport;
    use axum::http::StatusCode;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_accounts_for_item() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(
                Method::GET,
                "/items/item1/accounts",
                200,
                json!({"results": [{"id": "acct1", "type": "BANK"}]}),
            )
            .await;

        let (status, body) = send(test_app(&transport, None), get("/accounts/item1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "acct1");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::GET, "/items/gone/accounts", 404, json!({"message": "Item not found"}))
            .await;

        let (status, body) = send(test_app(&transport, None), get("/accounts/gone")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("404"));
        assert!(error.contains("Item not found"));
    }
}
