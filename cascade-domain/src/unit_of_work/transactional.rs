use super::{ChangeSet, UnitOfWork};
use crate::error::DomainResult as Result;
use crate::eventing::dispatcher::DEFAULT_MAX_WAVES;
use crate::eventing::{EventDispatcher, EventHandler, HandlerRegistry};
use crate::persist::{StoreTransaction, TransactionalStore};
use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

// 导入由 bon::Builder 生成的 typestate 模块与状态转换别名
use self::transactional_unit_of_work_builder::{IsUnset, SetRegistry, State as BuilderState};

/// 基于事务型存储的工作单元
#[derive(Builder)]
pub struct TransactionalUnitOfWork {
    store: Arc<dyn TransactionalStore>,
    #[builder(setters(vis = "pub(crate)"))]
    registry: HandlerRegistry,
    #[builder(default)]
    config: UnitOfWorkConfig,
}

impl<S: BuilderState> TransactionalUnitOfWorkBuilder<S> {
    pub fn event_handlers(
        self,
        handlers: Vec<Arc<dyn EventHandler>>,
    ) -> TransactionalUnitOfWorkBuilder<SetRegistry<S>>
    where
        <S as BuilderState>::Registry: IsUnset,
    {
        self.registry(HandlerRegistry::new(handlers))
    }
}

/// 工作单元配置
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkConfig {
    /// 单次提交允许的最大级联波次
    pub max_cascade_waves: usize,
}

impl Default for UnitOfWorkConfig {
    fn default() -> Self {
        Self {
            max_cascade_waves: DEFAULT_MAX_WAVES,
        }
    }
}

/// 单次提交结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub waves: usize,
    pub dispatched: usize,
    pub flushed: usize,
}

impl TransactionalUnitOfWork {
    fn dispatcher(&self) -> Result<EventDispatcher> {
        EventDispatcher::new(self.registry.clone(), self.config.max_cascade_waves)
    }

    // 分发 → 清除 → 刷写；提交/回滚由调用方决定
    async fn stage(
        &self,
        dispatcher: &EventDispatcher,
        tx: &mut Box<dyn StoreTransaction>,
        changes: &mut ChangeSet,
    ) -> Result<SaveReport> {
        let dispatch = dispatcher.dispatch(changes).await?;

        changes.mark_committed();

        let snapshots = changes.snapshots()?;
        tx.flush(&snapshots).await?;

        Ok(SaveReport {
            waves: dispatch.waves,
            dispatched: dispatch.dispatched,
            flushed: snapshots.len(),
        })
    }
}

#[async_trait]
impl UnitOfWork for TransactionalUnitOfWork {
    #[tracing::instrument(name = "unit_of_work.save", skip_all, fields(tracked = changes.len()))]
    async fn save(&self, changes: &mut ChangeSet) -> Result<SaveReport> {
        // 配置无效时不开启事务
        let dispatcher = self.dispatcher()?;
        let mut tx = self.store.begin().await?;

        match self.stage(&dispatcher, &mut tx, changes).await {
            Ok(report) => {
                tx.commit().await?;
                debug!(
                    waves = report.waves,
                    dispatched = report.dispatched,
                    flushed = report.flushed,
                    "unit of work committed"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, fatal = err.is_fatal(), "unit of work failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
