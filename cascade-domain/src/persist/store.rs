//! 事务型存储协议
//!
//! 一次 `save` 独占一个事务：开启 → 刷写 → 提交/回滚，不允许嵌套或并发事务。
//!
use crate::{error::DomainResult as Result, persist::SerializedSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// 事务型存储：负责开启事务
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// 存储事务：刷写聚合状态并提交或回滚
#[async_trait]
pub trait StoreTransaction: Send {
    /// 刷写聚合状态（在提交前不可见）
    async fn flush(&mut self, snapshots: &[SerializedSnapshot]) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// 只读取已提交状态
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>>;

    async fn load_all(&self, aggregate_type: &str) -> Result<Vec<SerializedSnapshot>>;
}

#[async_trait]
impl<T> TransactionalStore for Arc<T>
where
    T: TransactionalStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        (**self).begin().await
    }
}

#[async_trait]
impl<T> SnapshotReader for Arc<T>
where
    T: SnapshotReader + ?Sized,
{
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>> {
        (**self).load(aggregate_type, aggregate_id).await
    }

    async fn load_all(&self, aggregate_type: &str) -> Result<Vec<SerializedSnapshot>> {
        (**self).load_all(aggregate_type).await
    }
}
