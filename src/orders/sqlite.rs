use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::model::{Order, OrderFilter, OrderUpdate, Origin, Side, Status};
use super::store::OrderStore;
use crate::errors::StorageError;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id TEXT NOT NULL UNIQUE,
    client_order_id TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    instrument TEXT NOT NULL,
    side TEXT NOT NULL,
    status TEXT NOT NULL,
    quantity TEXT NOT NULL,
    filled_quantity TEXT NOT NULL,
    limit_price TEXT,
    average_price TEXT,
    is_local INTEGER NOT NULL DEFAULT 1
)
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS orders_created_at ON orders (created_at DESC, id DESC)";

const COLUMNS: &str = "order_id, client_order_id, created_at, updated_at, instrument, side, \
     status, quantity, filled_quantity, limit_price, average_price, is_local";

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    client_order_id: String,
    created_at: i64,
    updated_at: i64,
    instrument: String,
    side: String,
    status: String,
    quantity: String,
    filled_quantity: String,
    limit_price: Option<String>,
    average_price: Option<String>,
    is_local: bool,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, StorageError> {
        let order_id = self.order_id;
        let corrupt = |reason: String| StorageError::Corrupt {
            order_id: order_id.clone(),
            reason,
        };
        let decimal = |raw: &str| {
            Decimal::from_str(raw).map_err(|e| corrupt(format!("decimal {raw}: {e}")))
        };
        let timestamp = |micros: i64| {
            DateTime::<Utc>::from_timestamp_micros(micros)
                .ok_or_else(|| corrupt(format!("timestamp {micros}")))
        };

        Ok(Order {
            client_order_id: self.client_order_id,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
            instrument: self.instrument,
            side: Side::from_str(&self.side).map_err(|e| corrupt(e.to_string()))?,
            status: Status::from_str(&self.status).map_err(|e| corrupt(e.to_string()))?,
            quantity: decimal(&self.quantity)?,
            filled_quantity: decimal(&self.filled_quantity)?,
            limit_price: self.limit_price.as_deref().map(decimal).transpose()?,
            average_price: self.average_price.as_deref().map(decimal).transpose()?,
            is_local: self.is_local,
            order_id: order_id.clone(),
        })
    }
}

/// SQLite 订单表
#[derive(Clone)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// 例如 `sqlite://orders.db?mode=rwc`
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        info!(%url, "已连接订单数据库");
        Self::from_pool(pool).await
    }

    /// 单连接内存库，连接不回收，便于测试
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;
        Ok(SqliteOrderStore { pool })
    }
}

fn opt_decimal(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.to_string())
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
        let sql = format!("SELECT {COLUMNS} FROM orders WHERE order_id = ?");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn insert(&self, order: Order) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO orders ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(order_id) DO UPDATE SET \
             client_order_id = excluded.client_order_id, \
             updated_at = excluded.updated_at, \
             instrument = excluded.instrument, \
             side = excluded.side, \
             status = excluded.status, \
             quantity = excluded.quantity, \
             filled_quantity = excluded.filled_quantity, \
             limit_price = excluded.limit_price, \
             average_price = excluded.average_price"
        );
        sqlx::query(&sql)
            .bind(&order.order_id)
            .bind(&order.client_order_id)
            .bind(order.created_at.timestamp_micros())
            .bind(order.updated_at.timestamp_micros())
            .bind(&order.instrument)
            .bind(order.side.as_str())
            .bind(order.status.as_str())
            .bind(order.quantity.to_string())
            .bind(order.filled_quantity.to_string())
            .bind(opt_decimal(order.limit_price))
            .bind(opt_decimal(order.average_price))
            .bind(order.is_local)
            .execute(&self.pool)
            .await?;
        debug!(order_id = %order.order_id, "订单已写入");
        Ok(())
    }

    async fn update(&self, order_id: &str, update: &OrderUpdate) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE orders SET client_order_id = ?, updated_at = ?, instrument = ?, side = ?, \
             status = ?, quantity = ?, filled_quantity = ?, limit_price = ?, average_price = ? \
             WHERE order_id = ?",
        )
        .bind(&update.client_order_id)
        .bind(update.updated_at.timestamp_micros())
        .bind(&update.instrument)
        .bind(update.side.as_str())
        .bind(update.status.as_str())
        .bind(update.quantity.to_string())
        .bind(update.filled_quantity.to_string())
        .bind(opt_decimal(update.limit_price))
        .bind(opt_decimal(update.average_price))
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
        let mut sql = format!("SELECT {COLUMNS} FROM orders WHERE 1 = 1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        match filter.origin {
            Origin::Local => sql.push_str(" AND is_local = 1"),
            Origin::External => sql.push_str(" AND is_local = 0"),
            Origin::All => {}
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query_as::<_, OrderRow>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
