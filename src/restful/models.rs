use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::utils::{de_decimal_opt, de_string_lenient, de_string_opt};

/// 提现
/// POST /api/v1/me/withdrawal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub asset_name: String,
    pub chain: String,
    pub amount: i64,
    pub address: String,
    pub subaddress: String,
}

impl WithdrawRequest {
    pub fn new(asset_name: impl Into<String>, amount: i64, address: impl Into<String>) -> Self {
        WithdrawRequest {
            asset_name: asset_name.into(),
            chain: "mainnet".into(),
            amount,
            address: address.into(),
            subaddress: String::new(),
        }
    }
}

/// 下单
/// POST /api/v1/orders/
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(rename = "type")]
    pub order_type: Value,
    pub side: Value,
    pub instrument: Value,
    pub quantity_type: String, // 数量计价方式，固定为 quote
    pub tds_deducted: bool,
    pub quantity: Value,
    pub limit_price: Value,
    pub username: String,
}

/// 交易所返回的订单记录（下单响应的 data，或订单列表中的一项）
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteOrder {
    #[serde(rename = "orderId", alias = "order_id", deserialize_with = "de_string_lenient")]
    pub order_id: String,
    #[serde(
        rename = "clientOrderId",
        alias = "client_order_id",
        default,
        deserialize_with = "de_string_opt"
    )]
    pub client_order_id: Option<String>,
    #[serde(alias = "symbol")]
    pub instrument: String,
    pub side: String,
    pub status: String,
    #[serde(alias = "orig_qty", default, deserialize_with = "de_decimal_opt")]
    pub quantity: Option<Decimal>,
    #[serde(
        rename = "filledQuantity",
        alias = "exec_qty",
        default,
        deserialize_with = "de_decimal_opt"
    )]
    pub filled_quantity: Option<Decimal>,
    #[serde(
        rename = "limitPrice",
        alias = "limit_price",
        alias = "price",
        default,
        deserialize_with = "de_decimal_opt"
    )]
    pub limit_price: Option<Decimal>,
    #[serde(
        rename = "averagePrice",
        alias = "average_price",
        default,
        deserialize_with = "de_decimal_opt"
    )]
    pub average_price: Option<Decimal>,
}

/// 从订单列表响应中取出订单。
///
/// 兼容 `{"data": {"orders": [...]}}` 与 `{"data": [...]}` 两种结构，
/// 无法解析的单条记录记日志后跳过。
pub fn extract_orders(listing: &Value) -> Vec<RemoteOrder> {
    let items: &[Value] = match listing.get("data") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Object(data)) => match data.get("orders") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => {
            warn!("订单列表响应缺少 data 字段");
            &[]
        }
    };

    items
        .iter()
        .filter_map(|item| match RemoteOrder::deserialize(item) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(error = %e, "跳过无法解析的订单记录");
                None
            }
        })
        .collect()
}
