//! 本地订单镜像：订单模型、存储与同步
//!
//! - `model` - 订单、方向、状态、来源过滤
//! - `store` - 存储接口与内存实现
//! - `sqlite` - SQLite 实现
//! - `reconciler` - 交易所快照合并与查询

mod model;
mod reconciler;
mod sqlite;
mod store;

pub use model::{Order, OrderFilter, OrderUpdate, Origin, Side, Status};
pub use reconciler::{OrderReconciler, ReconcileReport};
pub use sqlite::SqliteOrderStore;
pub use store::{MemoryOrderStore, OrderStore};
