use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::api::server::SharedAppState;

pub const SERVICE_NAME: &str = "pluggy-pix-starter";

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/", get(handle_health))
}

/// GET /
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "service": SERVICE_NAME
    }))
}
