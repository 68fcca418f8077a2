use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{extract_client_ip, secrets_match};
use crate::api::server::SharedAppState;
use crate::client::PixTransferRequest;
use crate::common::error::{GatewayError, Result};
use crate::common::logging::log_security_event;

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/pix/transfer", post(handle_pix_transfer))
}

#[derive(Debug, Serialize)]
pub struct PixTransferResponse {
    pub id: Option<String>,
    pub status: String,
}

/// Compare the `Authorization` header against `Bearer <secret>`
fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<()> {
    let Some(secret) = secret else {
        return Ok(());
    };

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided.map_or(false, |p| secrets_match(p, secret)) {
        return Ok(());
    }

    log_security_event(
        "pix_transfer_unauthorized",
        false,
        serde_json::json!({
            "client_ip": extract_client_ip(headers),
            "header_present": headers.contains_key(AUTHORIZATION)
        }),
        None,
    );
    Err(GatewayError::Unauthorized)
}

/// POST /pix/transfer
///
/// The bearer check runs before the body is looked at.
async fn handle_pix_transfer(
    State(state): State<SharedAppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<PixTransferRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PixTransferResponse>)> {
    authorize(&headers, state.config.api_secret_key.as_deref())?;

    let Json(request) = body.map_err(|e| GatewayError::validation(e.body_text()))?;

    let mut client = state.client();
    let result = client.create_pix_transfer(&request).await?;

    tracing::info!(
        payment_id = ?result.id,
        status = %result.status,
        "PIX transfer created"
    );

    Ok((
        StatusCode::CREATED,
        Json(PixTransferResponse {
            id: result.id,
            status: result.status,
        }),
    ))
}
