use super::{DomainEvent, EventId, Metadata};
use chrono::Utc;

/// 事件信封，包含事件载荷与元数据；创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope<E>
where
    E: DomainEvent,
{
    metadata: Metadata,
    payload: E,
}

impl<E> EventEnvelope<E>
where
    E: DomainEvent,
{
    /// 封装新引发的事件，分配新的事件标识与发生时间
    pub fn new(aggregate_type: &str, aggregate_id: impl Into<String>, payload: E) -> Self {
        let metadata = Metadata::builder()
            .event_id(EventId::new())
            .aggregate_id(aggregate_id.into())
            .aggregate_type(aggregate_type.to_string())
            .occurred_at(Utc::now())
            .build();

        Self { metadata, payload }
    }

    pub fn from_parts(metadata: Metadata, payload: E) -> Self {
        Self { metadata, payload }
    }

    pub fn event_id(&self) -> &EventId {
        self.metadata.event_id()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
