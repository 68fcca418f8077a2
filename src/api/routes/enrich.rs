use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};

use crate::api::server::SharedAppState;
use crate::common::error::{GatewayError, Result};
use crate::enrich::{enrich_all, EnrichRequest, EnrichedTransaction};

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/enrich", post(handle_enrich))
}

/// POST /enrich
async fn handle_enrich(
    body: std::result::Result<Json<EnrichRequest>, JsonRejection>,
) -> Result<Json<Vec<EnrichedTransaction>>> {
    let Json(request) = body.map_err(|e| GatewayError::validation(e.body_text()))?;
    Ok(Json(enrich_all(request.data)))
}
