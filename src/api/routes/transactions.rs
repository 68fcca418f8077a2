use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::server::SharedAppState;
use crate::client::{TransactionFilters, TransactionsResponse};
use crate::common::error::{GatewayError, Result};
use crate::common::validation::validate_positive;

pub fn routes() -> Router<SharedAppState> {
    Router::new().route("/transactions/:account_id", get(handle_list_transactions))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub latest: Option<String>,
}

impl TransactionsQuery {
    pub fn into_filters(self) -> Result<TransactionFilters> {
        validate_positive(self.page, "page")
            .merge(validate_positive(self.page_size, "pageSize"))
            .into_result()?;

        let latest = match self.latest.as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(GatewayError::validation(format!(
                    "latest must be true or false, got '{}'",
                    other
                )))
            }
        };

        Ok(TransactionFilters {
            from: self.from,
            to: self.to,
            page: self.page,
            page_size: self.page_size,
            latest,
        })
    }
}

/// GET /transactions/:account_id?from&to&page&pageSize&latest
///
/// `account_id` may be `itemId_accountId`. With `latest=true` the body is
/// the newest transaction or `null`.
async fn handle_list_transactions(
    State(state): State<SharedAppState>,
    Path(account_id): Path<String>,
    query: std::result::Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionsResponse>> {
    let Query(query) = query.map_err(|e| GatewayError::validation(e.body_text()))?;
    let filters = query.into_filters()?;

    let mut client = state.client();
    let transactions = client.list_transactions(&account_id, &filters).await?;
    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get, script_auth, send, test_app};
    use crate::client::MemoryTransport;
    use axum::http::StatusCode;
    use reqwest::Method;
    use serde_json::{json, Value};

    #[test]
    fn test_latest_flag_parsing() {
        let filters = TransactionsQuery {
            latest: Some("1".to_string()),
            ..Default::default()
        }
        .into_filters()
        .unwrap();
        assert!(filters.latest);

        let filters = TransactionsQuery::default().into_filters().unwrap();
        assert!(!filters.latest);

        let result = TransactionsQuery {
            latest: Some("yes".to_string()),
            ..Default::default()
        }
        .into_filters();
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_composite_reference_resolves_account() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(
                Method::GET,
                "/transactions",
                200,
                json!({"results": [{"id": "tx1", "amount": -10.5}], "page": 1, "total": 1, "totalPages": 1}),
            )
            .await;

        let (status, body) = send(
            test_app(&transport, None),
            get("/transactions/item1_acct1?from=2024-01-01&to=2024-01-31"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "tx1");

        let calls = transport.calls().await;
        let call = &calls[1];
        assert_eq!(call.query_param("accountId").as_deref(), Some("acct1"));
        assert_eq!(call.query_param("from").as_deref(), Some("2024-01-01"));
        assert_eq!(call.query_param("to").as_deref(), Some("2024-01-31"));
        assert_eq!(call.query_param("page").as_deref(), Some("1"));
        assert_eq!(call.query_param("pageSize").as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_latest_returns_single_transaction_or_null() {
        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(
                Method::GET,
                "/transactions",
                200,
                json!({"results": [{"id": "newest"}, {"id": "older"}]}),
            )
            .await;

        let (status, body) =
            send(test_app(&transport, None), get("/transactions/acct1?latest=true")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": "newest"}));

        let transport = MemoryTransport::new();
        script_auth(&transport).await;
        transport
            .respond(Method::GET, "/transactions", 200, json!({"results": []}))
            .await;

        let (status, body) =
            send(test_app(&transport, None), get("/transactions/acct1?latest=true")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_reference_is_400_without_upstream_call() {
        let transport = MemoryTransport::new();

        let (status, body) = send(test_app(&transport, None), get("/transactions/item1_")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_REFERENCE");
        assert_eq!(transport.total_calls().await, 0);
    }

    #[tokio::test]
    async fn test_bad_query_is_400() {
        let transport = MemoryTransport::new();

        let (status, _) =
            send(test_app(&transport, None), get("/transactions/acct1?pageSize=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(test_app(&transport, None), get("/transactions/acct1?latest=maybe")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(transport.total_calls().await, 0);
    }
}
