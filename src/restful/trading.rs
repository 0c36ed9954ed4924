use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use super::models::PlaceOrderRequest;
use super::sign::{Gateway, Method};
use crate::errors::GatewayError;

pub const ORDERS_PATH: &str = "/api/v1/orders/";
pub const MY_ORDERS_PATH: &str = "/api/v1/me/orders/";

#[async_trait]
pub trait TradingApi: Gateway {
    /// 下单
    /// POST /api/v1/orders/
    async fn place_order(&self, request: &PlaceOrderRequest) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(request)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        self.call(ORDERS_PATH, Method::Post, Some(&body)).await
    }

    /// 撤单
    /// DELETE /api/v1/orders/{order_id}
    async fn cancel_order(&self, order_id: &str) -> Result<Value, GatewayError> {
        let path = format!("{}{}", ORDERS_PATH, urlencoding::encode(order_id));
        self.call(&path, Method::Delete, None).await
    }

    /// 查询订单列表
    /// GET /api/v1/me/orders/?onlyOpen=false&type=LIMIT
    async fn list_orders(&self, only_open: bool, order_type: &str) -> Result<Value, GatewayError> {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("onlyOpen".into(), only_open.to_string());
        params.insert("type".into(), order_type.into());
        let path = build_path(MY_ORDERS_PATH, &params);
        self.call(&path, Method::Get, None).await
    }
}

impl<T: Gateway + ?Sized> TradingApi for T {}

/// 构建带 query 的路径（key 按 ASCII 排序），签名使用同一字符串
pub fn build_path(path: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query_string)
}
