//! 面板操作：余额、提现、下单、撤单、订单列表
//!
//! 每个操作校验入参后最多发起一次交易所调用，所有错误在这里转换为
//! `{"error": ...}` 响应，不会继续向外抛出。

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::{Error, ValidationError};
use crate::orders::{OrderReconciler, OrderStore, Origin, Status};
use crate::restful::account::AccountApi;
use crate::restful::models::{extract_orders, PlaceOrderRequest, RemoteOrder, WithdrawRequest};
use crate::restful::sign::Gateway;
use crate::restful::trading::TradingApi;

/// 操作结果：HTTP 状态码 + JSON 响应体
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Reply {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

impl From<Error> for Reply {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => 400,
            Error::Gateway(_) | Error::Decode(_) => 502,
            Error::Storage(_) | Error::PrivateKeyParse(_) | Error::Config(_) => 500,
        };
        if status >= 500 {
            error!(status, error = %err, "操作失败");
        }
        Reply::error(status, err.to_string())
    }
}

pub struct Dashboard {
    gateway: Arc<dyn Gateway>,
    reconciler: OrderReconciler,
    username: String,
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::InvalidBody("expected a JSON object".into()))
}

fn present<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    body.get(field).filter(|v| !v.is_null())
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 金额必须为整数：JSON 整数、整数值的浮点数或整数字符串；超出 i64 范围视为非法
fn parse_amount(value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f > i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or(ValidationError::InvalidAmount),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| ValidationError::InvalidAmount),
        _ => Err(ValidationError::InvalidAmount),
    }
}

impl Dashboard {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn OrderStore>,
        username: impl Into<String>,
    ) -> Self {
        Dashboard {
            gateway,
            reconciler: OrderReconciler::new(store),
            username: username.into(),
        }
    }

    pub fn reconciler(&self) -> &OrderReconciler {
        &self.reconciler
    }

    /// GET balance
    #[instrument(skip(self))]
    pub async fn balance(&self) -> Reply {
        match self.gateway.balance().await {
            Ok(result) => match result.get("data") {
                Some(data) => Reply::ok(json!({ "data": data })),
                None => Reply::error(500, "Failed to fetch balance"),
            },
            Err(e) => {
                error!(error = %e, "查询余额失败");
                Reply::error(500, "Failed to fetch balance")
            }
        }
    }

    /// POST withdraw
    #[instrument(skip_all)]
    pub async fn withdraw(&self, body: &Value) -> Reply {
        self.try_withdraw(body).await.unwrap_or_else(Reply::from)
    }

    async fn try_withdraw(&self, body: &Value) -> Result<Reply, Error> {
        let body = as_object(body)?;
        let (asset_name, amount, address) = match (
            present(body, "assetName"),
            present(body, "amount"),
            present(body, "address"),
        ) {
            (Some(a), Some(m), Some(d)) => (a, m, d),
            _ => return Err(ValidationError::MissingWithdrawalParams.into()),
        };
        let amount = parse_amount(amount)?;

        let request = WithdrawRequest::new(text(asset_name), amount, text(address));
        let result = self.gateway.withdraw(&request).await?;
        info!(asset = %request.asset_name, amount, "提现请求已提交");
        Ok(Reply::ok(result))
    }

    /// POST create-order
    #[instrument(skip_all)]
    pub async fn create_order(&self, body: &Value) -> Reply {
        self.try_create_order(body).await.unwrap_or_else(Reply::from)
    }

    async fn try_create_order(&self, body: &Value) -> Result<Reply, Error> {
        let body = as_object(body)?;
        let field = |name: &str| {
            present(body, name)
                .cloned()
                .ok_or(ValidationError::MissingOrderParams)
        };
        let request = PlaceOrderRequest {
            order_type: field("type")?,
            side: field("side")?,
            instrument: field("instrument")?,
            quantity_type: "quote".into(),
            tds_deducted: true,
            quantity: field("quantity")?,
            limit_price: field("limitPrice")?,
            username: self.username.clone(),
        };

        let result = self.gateway.place_order(&request).await?;
        // 交易所已接单：订单数据无法解析时只跳过本地记录，仍原样返回结果
        if let Some(data) = result.get("data") {
            match RemoteOrder::deserialize(data) {
                Ok(placed) => {
                    self.reconciler.record_placed(&placed).await?;
                    info!(order_id = %placed.order_id, "下单成功");
                }
                Err(e) => warn!(error = %e, "下单成功但订单数据无法解析，未记录本地订单"),
            }
        }
        Ok(Reply::ok(result))
    }

    /// POST cancel-order
    #[instrument(skip_all)]
    pub async fn cancel_order(&self, body: &Value) -> Reply {
        self.try_cancel_order(body).await.unwrap_or_else(Reply::from)
    }

    async fn try_cancel_order(&self, body: &Value) -> Result<Reply, Error> {
        let body = as_object(body)?;
        let order_id = present(body, "orderId")
            .map(text)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingOrderId)?;

        let result = self.gateway.cancel_order(&order_id).await?;
        info!(%order_id, "撤单请求已提交");
        Ok(Reply::ok(result))
    }

    /// GET orders?status=&source=
    #[instrument(skip(self))]
    pub async fn orders(&self, status: Option<&str>, source: Option<&str>) -> Reply {
        self.try_orders(status, source).await.unwrap_or_else(Reply::from)
    }

    async fn try_orders(&self, status: Option<&str>, source: Option<&str>) -> Result<Reply, Error> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(s.parse::<Status>()?),
            None => None,
        };
        let origin = match source {
            Some(s) => s.parse::<Origin>()?,
            None => Origin::All,
        };

        let listing = self.gateway.list_orders(false, "LIMIT").await?;
        let remote_orders = extract_orders(&listing);
        self.reconciler.reconcile(&remote_orders).await?;

        let orders = self.reconciler.list(status, origin).await?;
        Ok(Reply::ok(json!({ "data": orders })))
    }
}
