use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::api::server::SharedAppState;
use crate::client::{ListEnvelope, Pagination};
use crate::common::error::{GatewayError, Result};

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/items", get(handle_list_items))
}

/// GET /items?page&pageSize
async fn handle_list_items(
    State(state): State<SharedAppState>,
    query: std::result::Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ListEnvelope<Value>>> {
    let Query(pagination) = query.map_err(|e| GatewayError::validation(e.body_text()))?;
    pagination.validate()?;

    let mut client = state.client();
    let items = client.list_items(pagination).await?;
    Ok(Json(items))
}
