use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;

use super::model::{Order, OrderFilter, OrderUpdate};
use crate::errors::StorageError;

/// 本地订单表，以 order_id 唯一索引
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: &str) -> Result<Option<Order>, StorageError>;

    /// 插入新记录。order_id 已存在时（并发同步竞争）原地覆盖可变字段，
    /// 保留 is_local 与 created_at。
    async fn insert(&self, order: Order) -> Result<(), StorageError>;

    /// 覆盖可变字段，记录不存在时返回 false
    async fn update(&self, order_id: &str, update: &OrderUpdate) -> Result<bool, StorageError>;

    /// 按创建时间倒序，同一时间后插入的在前
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError>;
}

#[derive(Default)]
struct MemoryInner {
    orders: HashMap<String, (u64, Order)>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryOrderStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
        Ok(self
            .inner
            .read()
            .orders
            .get(order_id)
            .map(|(_, order)| order.clone()))
    }

    async fn insert(&self, order: Order) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        if let Some((_, existing)) = inner.orders.get_mut(&order.order_id) {
            existing.apply(&order.update());
            return Ok(());
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.orders.insert(order.order_id.clone(), (seq, order));
        Ok(())
    }

    async fn update(&self, order_id: &str, update: &OrderUpdate) -> Result<bool, StorageError> {
        let mut inner = self.inner.write();
        match inner.orders.get_mut(order_id) {
            Some((_, order)) => {
                order.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
        let inner = self.inner.read();
        let mut rows: Vec<&(u64, Order)> = inner
            .orders
            .values()
            .filter(|(_, order)| filter.matches(order))
            .collect();
        rows.sort_by_key(|(seq, order)| (Reverse(order.created_at), Reverse(*seq)));
        Ok(rows.into_iter().map(|(_, order)| order.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::model::{Origin, Side, Status};
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::Decimal;

    fn order(id: &str, status: Status, is_local: bool, created_at: DateTime<Utc>) -> Order {
        Order {
            order_id: id.into(),
            client_order_id: String::new(),
            created_at,
            updated_at: created_at,
            instrument: "BTC/INR".into(),
            side: Side::Buy,
            status,
            quantity: Decimal::from(1),
            filled_quantity: Decimal::ZERO,
            limit_price: Some(Decimal::from(100)),
            average_price: Some(Decimal::ZERO),
            is_local,
        }
    }

    #[tokio::test]
    async fn insert_get_and_update() {
        let store = MemoryOrderStore::new();
        let now = Utc::now();
        store.insert(order("a", Status::Open, true, now)).await.unwrap();

        let mut update = store.get("a").await.unwrap().unwrap().update();
        update.status = Status::Cancelled;
        assert!(store.update("a", &update).await.unwrap());
        assert!(!store.update("missing", &update).await.unwrap());

        let stored = store.get("a").await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Cancelled);
        assert!(stored.is_local);
    }

    #[tokio::test]
    async fn duplicate_insert_updates_in_place() {
        let store = MemoryOrderStore::new();
        let t0 = Utc::now();
        store.insert(order("a", Status::Open, true, t0)).await.unwrap();
        store
            .insert(order("a", Status::Fulfilled, false, t0 + Duration::seconds(3)))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get("a").await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Fulfilled);
        assert!(stored.is_local);
        assert_eq!(stored.created_at, t0);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let store = MemoryOrderStore::new();
        let t0 = Utc::now();
        store.insert(order("old", Status::Open, true, t0)).await.unwrap();
        store
            .insert(order("new", Status::Open, true, t0 + Duration::seconds(10)))
            .await
            .unwrap();
        store
            .insert(order("ext", Status::Open, false, t0 + Duration::seconds(5)))
            .await
            .unwrap();
        store
            .insert(order("done", Status::Fulfilled, true, t0 + Duration::seconds(20)))
            .await
            .unwrap();

        let ids = |orders: Vec<Order>| orders.into_iter().map(|o| o.order_id).collect::<Vec<_>>();

        let all = store.list(&OrderFilter::default()).await.unwrap();
        assert_eq!(ids(all), vec!["done", "new", "ext", "old"]);

        let local_open = store
            .list(&OrderFilter::new(Some(Status::Open), Origin::Local))
            .await
            .unwrap();
        assert_eq!(ids(local_open), vec!["new", "old"]);

        let external = store
            .list(&OrderFilter::new(None, Origin::External))
            .await
            .unwrap();
        assert_eq!(ids(external), vec!["ext"]);
    }

    #[tokio::test]
    async fn same_timestamp_ties_break_by_insertion() {
        let store = MemoryOrderStore::new();
        let t0 = Utc::now();
        store.insert(order("first", Status::Open, false, t0)).await.unwrap();
        store.insert(order("second", Status::Open, false, t0)).await.unwrap();
        let listed = store.list(&OrderFilter::default()).await.unwrap();
        assert_eq!(listed[0].order_id, "second");
        assert_eq!(listed[1].order_id, "first");
    }
}
