mod common;

use axum::{
    body::{to_bytes, Body},
    http::Request,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use coinswitch_rs::{
    http, Dashboard, Order, OrderStore, Side, SqliteOrderStore, Status,
};
use common::FakeExchange;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn setup() -> (FakeExchange, Router, Arc<SqliteOrderStore>) {
    let exchange = FakeExchange::start().await;
    let store = Arc::new(SqliteOrderStore::in_memory().await.unwrap());
    let dashboard = Dashboard::new(Arc::new(exchange.client()), store.clone(), "trader");
    (exchange, http::router(Arc::new(dashboard)), store)
}

#[tokio::test]
async fn placing_an_order_records_it_locally() {
    let (exchange, app, store) = setup().await;
    exchange.respond(
        200,
        json!({"data": {
            "orderId": "X1",
            "instrument": "BTC/USDT",
            "side": "BUY",
            "status": "OPEN",
            "quantity": "10",
            "limitPrice": "50000"
        }})
        .to_string(),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/create-order/",
        Some(json!({
            "type": "limit",
            "side": "BUY",
            "instrument": "BTC/USDT",
            "quantity": "10",
            "limitPrice": "50000"
        })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["orderId"], "X1");

    let sent: Value = serde_json::from_slice(&exchange.requests()[0].body).unwrap();
    assert_eq!(
        sent,
        json!({
            "type": "limit",
            "side": "BUY",
            "instrument": "BTC/USDT",
            "quantityType": "quote",
            "tdsDeducted": true,
            "quantity": "10",
            "limitPrice": "50000",
            "username": "trader"
        })
    );

    let order = store.get("X1").await.unwrap().unwrap();
    assert!(order.is_local);
    assert_eq!(order.filled_quantity, Decimal::ZERO);
    assert_eq!(order.status, Status::Open);
}

#[tokio::test]
async fn withdrawal_without_address_is_rejected_before_the_exchange() {
    let (exchange, app, _) = setup().await;
    let (status, body) = send(
        &app,
        "POST",
        "/withdraw/",
        Some(json!({"assetName": "usdt", "amount": "5"})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Missing withdrawal parameters"}));
    assert!(exchange.requests().is_empty());
}

#[tokio::test]
async fn listing_updates_known_orders_and_inserts_new_ones() {
    let (exchange, app, store) = setup().await;
    let placed_at = Utc::now();
    store
        .insert(Order {
            order_id: "X1".into(),
            client_order_id: String::new(),
            created_at: placed_at,
            updated_at: placed_at,
            instrument: "BTC/USDT".into(),
            side: Side::Buy,
            status: Status::Open,
            quantity: Decimal::from(10),
            filled_quantity: Decimal::ZERO,
            limit_price: Some(Decimal::from(50000)),
            average_price: Some(Decimal::ZERO),
            is_local: true,
        })
        .await
        .unwrap();

    exchange.respond(
        200,
        json!({"data": {"orders": [
            {"orderId": "X1", "instrument": "BTC/USDT", "side": "BUY", "status": "EXECUTED",
             "quantity": "10", "filledQuantity": "10", "limitPrice": "50000",
             "averagePrice": "49995.12345678"},
            {"orderId": "R2", "instrument": "ETH/INR", "side": "SELL", "status": "OPEN",
             "quantity": 2, "limitPrice": 180000}
        ]}})
        .to_string(),
    );

    let (status, body) = send(&app, "GET", "/orders/?status=&source=", None).await;
    assert_eq!(status, 200);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    // newest first: R2 was inserted during the sweep
    assert_eq!(data[0]["order_id"], "R2");
    assert_eq!(data[0]["is_local"], false);
    assert_eq!(data[1]["order_id"], "X1");
    assert_eq!(data[1]["is_local"], true);
    assert_eq!(data[1]["status"], "FULFILLED");

    let x1 = store.get("X1").await.unwrap().unwrap();
    assert_eq!(x1.filled_quantity, Decimal::from(10));
    assert_eq!(x1.average_price.unwrap().to_string(), "49995.12345678");
    assert_eq!(x1.created_at.timestamp_micros(), placed_at.timestamp_micros());

    let r2 = store.get("R2").await.unwrap().unwrap();
    assert!(!r2.is_local);
    assert_eq!(r2.filled_quantity, Decimal::ZERO);
    assert_eq!(r2.average_price, Some(Decimal::ZERO));
}

#[tokio::test]
async fn listing_filters_by_status_and_source() {
    let (exchange, app, _) = setup().await;
    exchange.respond(
        200,
        json!({"data": {
            "orderId": "L1", "instrument": "BTC/INR", "side": "BUY",
            "status": "OPEN", "quantity": "1", "limitPrice": "10"
        }})
        .to_string(),
    );
    send(
        &app,
        "POST",
        "/create-order/",
        Some(json!({
            "type": "limit", "side": "BUY", "instrument": "BTC/INR",
            "quantity": "1", "limitPrice": "10"
        })),
    )
    .await;

    exchange.respond(
        200,
        json!({"data": {"orders": [
            {"orderId": "E1", "instrument": "BTC/INR", "side": "SELL", "status": "OPEN", "quantity": "1"},
            {"orderId": "E2", "instrument": "BTC/INR", "side": "SELL", "status": "CANCELLED", "quantity": "1"}
        ]}})
        .to_string(),
    );
    let (status, body) = send(&app, "GET", "/orders/?status=OPEN&source=local", None).await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["L1"]);
}

#[tokio::test]
async fn gateway_failure_becomes_error_reply() {
    let (exchange, app, _) = setup().await;
    exchange.respond(500, "upstream exploded");
    let (status, body) = send(&app, "POST", "/cancel-order/", Some(json!({"orderId": "X9"}))).await;
    assert_eq!(status, 502);
    assert_eq!(body["error"], "Error 500: upstream exploded");
}

#[tokio::test]
async fn balance_requires_data_field() {
    let (exchange, app, _) = setup().await;
    exchange.respond(200, r#"{"data":{"USDT":{"main_balance":"3"}}}"#);
    let (status, body) = send(&app, "GET", "/get-balance/", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["USDT"]["main_balance"], "3");

    exchange.respond(200, r#"{"message":"unauthorized"}"#);
    let (status, body) = send(&app, "GET", "/get-balance/", None).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to fetch balance");
}

#[tokio::test]
async fn malformed_json_body_is_a_validation_error() {
    let (exchange, app, _) = setup().await;
    let request = Request::builder()
        .method("POST")
        .uri("/withdraw/")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(exchange.requests().is_empty());
}
