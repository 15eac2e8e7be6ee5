//! 领域事件（Domain Event）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）、显式分配的事件标识（`EventId`），
//! 将事件与元数据封装后的 `EventEnvelope`，以及聚合持有的未提交事件缓冲 `PendingEvents`。

mod domain_event_trait;
mod event_envelope;
mod event_id;
mod metadata;
mod pending_events;

pub use domain_event_trait::DomainEvent;
pub use event_envelope::EventEnvelope;
pub use event_id::EventId;
pub use metadata::Metadata;
pub use pending_events::PendingEvents;
