//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部事件的处理逻辑与元信息（名称、订阅类型）。
//! 处理器在提交事务内被调用，可通过 `ChangeSet` 修改或新增聚合，
//! 由此引发的事件会在下一波被分发。
//!
use crate::persist::SerializedEvent;
use crate::unit_of_work::ChangeSet;
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub enum HandledEventType {
    One(String),
    Many(Vec<String>),
    All,
}

/// 事件处理器：处理某一类型的事件
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与错误定位）
    fn handler_name(&self) -> &str;
    /// 返回该处理器支持的事件类型
    fn handled_event_type(&self) -> HandledEventType;
    /// 处理事件
    async fn handle(&self, event: &SerializedEvent, changes: &mut ChangeSet) -> anyhow::Result<()>;
}
