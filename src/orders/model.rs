use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};
use crate::restful::models::RemoteOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Open,
    Fulfilled,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Fulfilled => "FULFILLED",
            Status::Cancelled => "CANCELLED",
        }
    }
}

/// 大小写不敏感；交易所侧的 EXECUTED / PARTIALLY_EXECUTED 等状态归并到三种本地状态，
/// 过期、丢弃等其它终态按已撤销处理
impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" | "NEW" | "PARTIALLY_EXECUTED" | "PARTIALLY_FILLED" => Ok(Status::Open),
            "FULFILLED" | "EXECUTED" | "FILLED" => Ok(Status::Fulfilled),
            "CANCELLED" | "CANCELED" | "PARTIALLY_CANCELLED" | "PARTIALLY_CANCELED" | "EXPIRED"
            | "DISCARDED" | "REJECTED" => Ok(Status::Cancelled),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订单来源过滤：本系统下单 / 同步发现 / 全部
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    Local,
    External,
    #[default]
    All,
}

impl FromStr for Origin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Origin::Local),
            "external" => Ok(Origin::External),
            "all" | "" => Ok(Origin::All),
            _ => Err(ValidationError::InvalidSource(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderFilter {
    pub status: Option<Status>,
    pub origin: Origin,
}

impl OrderFilter {
    pub fn new(status: Option<Status>, origin: Origin) -> Self {
        OrderFilter { status, origin }
    }

    pub fn matches(&self, order: &Order) -> bool {
        let status_ok = self.status.map_or(true, |s| order.status == s);
        let origin_ok = match self.origin {
            Origin::Local => order.is_local,
            Origin::External => !order.is_local,
            Origin::All => true,
        };
        status_ok && origin_ok
    }
}

/// 本地订单记录，order_id 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub client_order_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub instrument: String,
    pub side: Side,
    pub status: Status,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub is_local: bool,
}

/// 同步时可变的字段
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub client_order_id: String,
    pub instrument: String,
    pub side: Side,
    pub status: Status,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl OrderUpdate {
    /// 缺失的成交量、限价、均价一律按 0 处理
    pub fn from_remote(remote: &RemoteOrder, now: DateTime<Utc>) -> Result<Self, Error> {
        let side = remote
            .side
            .parse::<Side>()
            .map_err(|e| Error::decode(format!("order {}: {}", remote.order_id, e)))?;
        let status = remote
            .status
            .parse::<Status>()
            .map_err(|e| Error::decode(format!("order {}: {}", remote.order_id, e)))?;

        Ok(OrderUpdate {
            client_order_id: remote.client_order_id.clone().unwrap_or_default(),
            instrument: remote.instrument.clone(),
            side,
            status,
            quantity: remote.quantity.unwrap_or_default(),
            filled_quantity: remote.filled_quantity.unwrap_or_default(),
            limit_price: Some(remote.limit_price.unwrap_or_default()),
            average_price: Some(remote.average_price.unwrap_or_default()),
            updated_at: now,
        })
    }
}

impl Order {
    pub fn from_remote(remote: &RemoteOrder, is_local: bool, now: DateTime<Utc>) -> Result<Self, Error> {
        let update = OrderUpdate::from_remote(remote, now)?;
        Ok(Order {
            order_id: remote.order_id.clone(),
            client_order_id: update.client_order_id,
            created_at: now,
            updated_at: now,
            instrument: update.instrument,
            side: update.side,
            status: update.status,
            quantity: update.quantity,
            filled_quantity: update.filled_quantity,
            limit_price: update.limit_price,
            average_price: update.average_price,
            is_local,
        })
    }

    /// 覆盖可变字段，is_local 与 created_at 不变
    pub fn apply(&mut self, update: &OrderUpdate) {
        self.client_order_id = update.client_order_id.clone();
        self.instrument = update.instrument.clone();
        self.side = update.side;
        self.status = update.status;
        self.quantity = update.quantity;
        self.filled_quantity = update.filled_quantity;
        self.limit_price = update.limit_price;
        self.average_price = update.average_price;
        self.updated_at = update.updated_at;
    }

    pub fn update(&self) -> OrderUpdate {
        OrderUpdate {
            client_order_id: self.client_order_id.clone(),
            instrument: self.instrument.clone(),
            side: self.side,
            status: self.status,
            quantity: self.quantity,
            filled_quantity: self.filled_quantity,
            limit_price: self.limit_price,
            average_price: self.average_price,
            updated_at: self.updated_at,
        }
    }
}
