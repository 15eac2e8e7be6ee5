//! 级联事件分发器（EventDispatcher）
//!
//! 以显式工作队列代替递归重扫：
//! 1. 扫描工作集的全部未提交事件，过滤掉本次调用已分发过的事件标识；
//! 2. 若无新事件则到达不动点；
//! 3. 否则作为新的一波依次交给匹配的处理器（逐个等待完成），然后回到 1。
//!
//! 同一波内已知的事件全部分发完毕后才开始下一波；波次超过上限视为配置错误，
//! 返回 `DomainError::CascadeDiverged` 而不是无限循环。去重集合与波次计数只在单次调用内有效。
//!
use super::{EventHandler, HandlerRegistry};
use crate::domain_event::EventId;
use crate::error::{DomainError, DomainResult as Result};
use crate::unit_of_work::ChangeSet;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// 默认最大波次
pub const DEFAULT_MAX_WAVES: usize = 32;

#[derive(Clone)]
pub struct EventDispatcher {
    registry: HandlerRegistry,
    max_waves: usize,
}

/// 单次分发结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 实际分发的波次数
    pub waves: usize,
    /// 分发的事件数（每个事件标识计一次）
    pub dispatched: usize,
}

impl EventDispatcher {
    /// 波次上限为 0 时任何事件都无法分发，直接拒绝
    pub fn new(registry: HandlerRegistry, max_waves: usize) -> Result<Self> {
        if max_waves == 0 {
            return Err(DomainError::InvalidConfig {
                reason: "max cascade waves must be at least 1".to_string(),
            });
        }
        Ok(Self { registry, max_waves })
    }

    pub fn with_handlers(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self {
            registry: HandlerRegistry::new(handlers),
            max_waves: DEFAULT_MAX_WAVES,
        }
    }

    pub fn max_waves(&self) -> usize {
        self.max_waves
    }

    /// 分发工作集中的未提交事件直到不动点
    pub async fn dispatch(&self, changes: &mut ChangeSet) -> Result<DispatchReport> {
        let mut seen: HashSet<EventId> = HashSet::new();
        let mut report = DispatchReport::default();

        loop {
            let wave: Vec<_> = changes
                .uncommitted_events()?
                .into_iter()
                .filter(|e| seen.insert(*e.event_id()))
                .collect();

            if wave.is_empty() {
                debug!(
                    waves = report.waves,
                    dispatched = report.dispatched,
                    "event cascade reached fixed point"
                );
                return Ok(report);
            }

            if report.waves == self.max_waves {
                error!(
                    limit = self.max_waves,
                    pending = wave.len(),
                    "event cascade did not converge"
                );
                return Err(DomainError::CascadeDiverged {
                    waves: report.waves + 1,
                    limit: self.max_waves,
                });
            }

            report.waves += 1;
            debug!(wave = report.waves, events = wave.len(), "dispatching event wave");

            for event in &wave {
                for handler in self.registry.matching(event.event_type()) {
                    handler.handle(event, changes).await.map_err(|err| {
                        DomainError::EventHandler {
                            handler: handler.handler_name().to_string(),
                            event_type: event.event_type().to_string(),
                            reason: format!("{err:#}"),
                        }
                    })?;
                }
                report.dispatched += 1;
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::with_handlers(Vec::new())
    }
}
