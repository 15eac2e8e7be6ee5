//! 事件分发模型（SerializedEvent）
//!
//! 不同聚合的事件类型各异，分发前统一转换为该形态；
//! 事件标识原样取自信封，保证同一未提交事件多次读取得到相同标识。
//!
use crate::{
    domain_event::{DomainEvent, EventEnvelope, EventId, Metadata},
    error::{DomainError, DomainResult},
};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符（去重依据）
    event_id: EventId,
    /// 事件类型，用于匹配处理器
    event_type: String,
    /// 事件载荷版本
    event_version: usize,
    /// 聚合 ID，标识事件所属的聚合根实例
    aggregate_id: String,
    /// 聚合类型
    aggregate_type: String,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 事件负载
    payload: Value,
}

impl SerializedEvent {
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 还原为强类型事件信封；事件类型不匹配时报错
    pub fn decode<E>(&self) -> DomainResult<EventEnvelope<E>>
    where
        E: DomainEvent,
    {
        let payload: E = serde_json::from_value(self.payload.clone())?;
        if payload.event_type() != self.event_type {
            return Err(DomainError::TypeMismatch {
                expected: self.event_type.clone(),
                found: payload.event_type().to_string(),
            });
        }

        let metadata = Metadata::builder()
            .event_id(self.event_id)
            .aggregate_id(self.aggregate_id.clone())
            .aggregate_type(self.aggregate_type.clone())
            .occurred_at(self.occurred_at)
            .build();

        Ok(EventEnvelope::from_parts(metadata, payload))
    }
}

impl<E> TryFrom<&EventEnvelope<E>> for SerializedEvent
where
    E: DomainEvent,
{
    type Error = serde_json::Error;

    fn try_from(envelope: &EventEnvelope<E>) -> Result<Self, Self::Error> {
        let metadata = envelope.metadata();

        Ok(SerializedEvent {
            event_id: *metadata.event_id(),
            event_type: envelope.payload().event_type().to_string(),
            event_version: envelope.payload().event_version(),
            aggregate_id: metadata.aggregate_id().to_string(),
            aggregate_type: metadata.aggregate_type().to_string(),
            occurred_at: *metadata.occurred_at(),
            payload: serde_json::to_value(envelope.payload())?,
        })
    }
}

pub fn serialize_events<E>(events: &[EventEnvelope<E>]) -> DomainResult<Vec<SerializedEvent>>
where
    E: DomainEvent,
{
    let events = events
        .iter()
        .map(SerializedEvent::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
