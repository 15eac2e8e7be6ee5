use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件标识不属于载荷：它在事件被聚合引发时分配，由 `EventEnvelope` 携带。
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件类型（形如 `OrderEvent.Created` 或自定义类型名）
    fn event_type(&self) -> &str;

    /// 事件载荷版本
    fn event_version(&self) -> usize;
}
