//! 工作单元（unit of work）
//!
//! 一次 `save` 即一次全有或全无的“分发 + 持久化”操作：
//! 开启事务 → 级联分发至不动点 → 清除未提交事件 → 刷写聚合状态 → 提交；
//! 任一步失败则回滚并向调用方返回错误。
//!
mod change_set;
mod transactional;

pub use change_set::ChangeSet;
pub use transactional::{SaveReport, TransactionalUnitOfWork, UnitOfWorkConfig};

use crate::error::DomainResult as Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 工作单元：提交一个变更集
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn save(&self, changes: &mut ChangeSet) -> Result<SaveReport>;
}

#[async_trait]
impl<T> UnitOfWork for Arc<T>
where
    T: UnitOfWork + ?Sized,
{
    async fn save(&self, changes: &mut ChangeSet) -> Result<SaveReport> {
        (**self).save(changes).await
    }
}
