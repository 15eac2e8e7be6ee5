use super::{DomainEvent, EventEnvelope};
use std::slice::Iter;

/// 聚合持有的未提交事件，按引发顺序排列（先引发者先分发）。
///
/// - 读取（`iter`/`as_slice`）不消费事件；
/// - `mark_committed` 清空缓冲，空缓冲上重复调用为无操作；
/// - 已清空的事件不会再次出现在后续读取中。
#[derive(Debug, Clone)]
pub struct PendingEvents<E>
where
    E: DomainEvent,
{
    events: Vec<EventEnvelope<E>>,
}

impl<E> Default for PendingEvents<E>
where
    E: DomainEvent,
{
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> PendingEvents<E>
where
    E: DomainEvent,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个新引发的事件，返回其信封（已分配事件标识）
    pub fn record(
        &mut self,
        aggregate_type: &str,
        aggregate_id: impl Into<String>,
        payload: E,
    ) -> &EventEnvelope<E> {
        self.events
            .push(EventEnvelope::new(aggregate_type, aggregate_id, payload));
        &self.events[self.events.len() - 1]
    }

    /// 标记全部事件为已提交（清空）
    pub fn mark_committed(&mut self) {
        self.events.clear();
    }

    pub fn as_slice(&self) -> &[EventEnvelope<E>] {
        &self.events
    }

    pub fn iter(&self) -> Iter<'_, EventEnvelope<E>> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a, E> IntoIterator for &'a PendingEvents<E>
where
    E: DomainEvent,
{
    type Item = &'a EventEnvelope<E>;
    type IntoIter = Iter<'a, EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::PendingEvents;
    use cascade_macros::event;
    use serde::{Deserialize, Serialize};

    #[event]
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum TicketEvent {
        Opened { title: String },
        Closed,
    }

    #[test]
    fn keeps_insertion_order_and_identity_across_reads() {
        let mut pending = PendingEvents::new();
        pending.record("ticket", "t-1", TicketEvent::Opened { title: "a".into() });
        pending.record("ticket", "t-1", TicketEvent::Closed);

        let first: Vec<_> = pending.iter().map(|e| *e.event_id()).collect();
        let second: Vec<_> = pending.iter().map(|e| *e.event_id()).collect();
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
        assert_eq!(pending.as_slice()[1].payload(), &TicketEvent::Closed);
        assert_eq!(pending.as_slice()[0].metadata().aggregate_id(), "t-1");
    }

    #[test]
    fn mark_committed_is_idempotent() {
        let mut pending = PendingEvents::new();
        pending.record("ticket", "t-1", TicketEvent::Closed);

        pending.mark_committed();
        assert!(pending.is_empty());
        pending.mark_committed();
        assert!(pending.is_empty());
        assert_eq!(pending.len(), 0);
    }
}
