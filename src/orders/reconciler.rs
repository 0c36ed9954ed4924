use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::model::{Order, OrderFilter, OrderUpdate, Origin, Status};
use super::store::OrderStore;
use crate::errors::{Error, StorageError};
use crate::restful::models::RemoteOrder;

/// 一次同步的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

enum Outcome {
    Inserted,
    Updated,
}

/// 将交易所订单快照合并进本地订单表，并提供过滤查询
#[derive(Clone)]
pub struct OrderReconciler {
    store: Arc<dyn OrderStore>,
}

impl OrderReconciler {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        OrderReconciler { store }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// 逐条 upsert，不删除本地多出的记录。
    ///
    /// 单条失败只记日志并继续；全部处理完后若出现过存储错误，返回第一个存储错误。
    #[instrument(skip_all, fields(count = remote_orders.len()))]
    pub async fn reconcile(
        &self,
        remote_orders: &[RemoteOrder],
    ) -> Result<ReconcileReport, StorageError> {
        let mut report = ReconcileReport::default();
        let mut storage_error = None;

        for remote in remote_orders {
            match self.reconcile_one(remote).await {
                Ok(Outcome::Inserted) => report.inserted += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Err(Error::Storage(e)) => {
                    warn!(order_id = %remote.order_id, error = %e, "订单同步写库失败");
                    report.failed += 1;
                    storage_error.get_or_insert(e);
                }
                Err(e) => {
                    warn!(order_id = %remote.order_id, error = %e, "跳过无法识别的订单");
                    report.failed += 1;
                }
            }
        }

        info!(
            inserted = report.inserted,
            updated = report.updated,
            failed = report.failed,
            "订单同步完成"
        );

        match storage_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    async fn reconcile_one(&self, remote: &RemoteOrder) -> Result<Outcome, Error> {
        let now = Utc::now();
        match self.store.get(&remote.order_id).await? {
            Some(_) => {
                let update = OrderUpdate::from_remote(remote, now)?;
                if self.store.update(&remote.order_id, &update).await? {
                    Ok(Outcome::Updated)
                } else {
                    // 读写之间被删除，按新记录处理
                    self.store.insert(Order::from_remote(remote, false, now)?).await?;
                    Ok(Outcome::Inserted)
                }
            }
            None => {
                self.store.insert(Order::from_remote(remote, false, now)?).await?;
                Ok(Outcome::Inserted)
            }
        }
    }

    pub async fn list(
        &self,
        status: Option<Status>,
        origin: Origin,
    ) -> Result<Vec<Order>, StorageError> {
        self.store.list(&OrderFilter::new(status, origin)).await
    }

    /// 下单成功后立即写入本地记录，is_local = true
    #[instrument(skip_all, fields(order_id = %remote.order_id))]
    pub async fn record_placed(&self, remote: &RemoteOrder) -> Result<Order, Error> {
        let order = Order::from_remote(remote, true, Utc::now())?;
        self.store.insert(order.clone()).await?;
        info!(instrument = %order.instrument, side = %order.side, "本地下单记录已写入");
        Ok(order)
    }
}
