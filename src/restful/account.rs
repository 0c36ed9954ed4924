use async_trait::async_trait;
use serde_json::Value;

use super::models::WithdrawRequest;
use super::sign::{Gateway, Method};
use crate::errors::GatewayError;

pub const BALANCE_PATH: &str = "/api/v2/me/balance/";
pub const WITHDRAW_PATH: &str = "/api/v1/me/withdrawal";

#[async_trait]
pub trait AccountApi: Gateway {
    /// 查看账户余额
    /// GET /api/v2/me/balance/
    async fn balance(&self) -> Result<Value, GatewayError> {
        self.call(BALANCE_PATH, Method::Get, None).await
    }

    /// 提现
    /// POST /api/v1/me/withdrawal
    async fn withdraw(&self, request: &WithdrawRequest) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(request)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        self.call(WITHDRAW_PATH, Method::Post, Some(&body)).await
    }
}

impl<T: Gateway + ?Sized> AccountApi for T {}
