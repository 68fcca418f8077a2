use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::api::server::SharedAppState;

pub fn routes() -> Router<SharedAppState> {
    Router::new()
        .route("/debug/env", get(handle_debug_env))
        .route("/debug/auth", get(handle_debug_auth))
}

/// GET /debug/env
async fn handle_debug_env(State(state): State<SharedAppState>) -> impl IntoResponse {
    let upstream = &state.config.upstream;
    Json(json!({
        "baseUrl": upstream.base_url,
        "hasClientId": upstream.has_client_id(),
        "hasSecret": upstream.has_secret()
    }))
}

/// GET /debug/auth
///
/// Forces a credential exchange; only the key prefix is returned.
async fn handle_debug_auth(State(state): State<SharedAppState>) -> Response {
    let mut client = state.client();

    match client.debug_auth().await {
        Ok(info) => Json(json!({
            "ok": true,
            "keyPrefix": info.key_prefix,
            "expISO": info.exp_iso
        }))
        .into_response(),
        Err(e) => {
            let upstream = &state.config.upstream;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": e.to_string(),
                    "hasClientId": upstream.has_client_id(),
                    "hasSecret": upstream.has_secret()
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, send, test_app};
    use crate::client::MemoryTransport;
    use axum::http::StatusCode;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_debug_env() {
        let transport = MemoryTransport::new();

        let (status, body) = send(test_app(&transport, None), get("/debug/env")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"baseUrl": "https://api.pluggy.test", "hasClientId": true, "hasSecret": true})
        );
    }

    #[tokio::test]
    async fn test_debug_auth_success() {
        let transport = MemoryTransport::new();
        transport
            .respond(
                Method::POST,
                "/auth",
                200,
                json!({"apiKey": "abcdefghijklmnop", "expiresAt": "2030-01-01T00:00:00Z"}),
            )
            .await;

        let (status, body) = send(test_app(&transport, None), get("/debug/auth")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"ok": true, "keyPrefix": "abcdefgh", "expISO": "2030-01-01T00:00:00.000Z"})
        );
    }

    #[tokio::test]
    async fn test_debug_auth_failure() {
        let transport = MemoryTransport::new();
        transport
            .respond_text(Method::POST, "/auth", 401, "invalid client")
            .await;

        let (status, body) = send(test_app(&transport, None), get("/debug/auth")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
        assert_eq!(body["hasClientId"], true);
        assert!(body["error"].as_str().unwrap().contains("/auth failed (401)"));
    }
}
