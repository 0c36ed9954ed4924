use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{Error, ValidationError};
use crate::service::{Dashboard, Reply};

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct OrdersQuery {
    status: Option<String>,
    source: Option<String>,
}

/// 路由与原面板保持一致
pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/get-balance/", get(get_balance))
        .route("/withdraw/", post(withdraw))
        .route("/create-order/", post(create_order))
        .route("/cancel-order/", post(cancel_order))
        .route("/orders/", get(orders))
        .with_state(dashboard)
}

fn parse_body(body: &Bytes) -> Result<Value, Reply> {
    serde_json::from_slice(body)
        .map_err(|e| Reply::from(Error::from(ValidationError::InvalidBody(e.to_string()))))
}

async fn get_balance(State(dashboard): State<Arc<Dashboard>>) -> Reply {
    dashboard.balance().await
}

async fn withdraw(State(dashboard): State<Arc<Dashboard>>, body: Bytes) -> Reply {
    match parse_body(&body) {
        Ok(body) => dashboard.withdraw(&body).await,
        Err(reply) => reply,
    }
}

async fn create_order(State(dashboard): State<Arc<Dashboard>>, body: Bytes) -> Reply {
    match parse_body(&body) {
        Ok(body) => dashboard.create_order(&body).await,
        Err(reply) => reply,
    }
}

async fn cancel_order(State(dashboard): State<Arc<Dashboard>>, body: Bytes) -> Reply {
    match parse_body(&body) {
        Ok(body) => dashboard.cancel_order(&body).await,
        Err(reply) => reply,
    }
}

async fn orders(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<OrdersQuery>,
) -> Reply {
    dashboard
        .orders(query.status.as_deref(), query.source.as_deref())
        .await
}
