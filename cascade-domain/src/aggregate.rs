//! 聚合（Aggregate）抽象
//!
//! 聚合根是一致性边界，也是领域事件的来源：
//! - `apply` 将事件投影到状态（改变状态）；
//! - `raise` 投影事件并将其记入未提交事件缓冲，由工作单元在提交时统一分发；
//! - 通过 `Entity` 约束聚合具备标识与版本，通过 `HasPendingEvents` 持有未提交事件。
//!
use crate::domain_event::{DomainEvent, EventEnvelope, PendingEvents};
use crate::entity::Entity;
use serde::{Serialize, de::DeserializeOwned};

/// 持有未提交事件缓冲（通常由 `#[entity(events = ...)]` 生成）
pub trait HasPendingEvents {
    type Event: DomainEvent;

    fn pending_events(&self) -> &PendingEvents<Self::Event>;

    fn pending_events_mut(&mut self) -> &mut PendingEvents<Self::Event>;
}

/// 聚合根接口
pub trait Aggregate:
    Entity + HasPendingEvents + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const TYPE: &'static str;

    /// 应用事件，更新聚合状态
    fn apply(&mut self, event: &Self::Event);

    /// 引发事件：先投影到状态，再记入未提交事件
    fn raise(&mut self, event: Self::Event) -> &EventEnvelope<Self::Event> {
        self.apply(&event);
        let aggregate_id = self.id().to_string();
        self.pending_events_mut()
            .record(Self::TYPE, aggregate_id, event)
    }

    /// 读取未提交事件（不清除）
    fn uncommitted_events(&self) -> &[EventEnvelope<Self::Event>] {
        self.pending_events().as_slice()
    }

    /// 标记事件已提交（清除）；重复调用为无操作
    fn mark_committed(&mut self) {
        self.pending_events_mut().mark_committed();
    }
}

#[cfg(test)]
mod tests {
    use super::Aggregate;
    use crate::domain_event::DomainEvent;
    use crate::entity::Entity;
    use cascade_macros::{entity, event};
    use serde::{Deserialize, Serialize};

    #[entity(events = CounterEvent)]
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Counter {
        value: i32,
    }

    #[event(version = 1)]
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum CounterEvent {
        Added { amount: i32 },
        #[event(event_type = "counter.reset")]
        Reset,
    }

    impl Aggregate for Counter {
        const TYPE: &'static str = "counter";

        fn apply(&mut self, event: &Self::Event) {
            match event {
                CounterEvent::Added { amount } => self.value += *amount,
                CounterEvent::Reset => self.value = 0,
            }
            self.version += 1;
        }
    }

    #[test]
    fn raise_applies_and_records_in_order() {
        let mut counter = Counter::new("c-1".to_string());
        counter.raise(CounterEvent::Added { amount: 3 });
        counter.raise(CounterEvent::Reset);
        counter.raise(CounterEvent::Added { amount: 2 });

        assert_eq!(counter.value, 2);
        assert_eq!(counter.version(), 3);

        let types: Vec<_> = counter
            .uncommitted_events()
            .iter()
            .map(|e| e.payload().event_type().to_string())
            .collect();
        assert_eq!(types, ["CounterEvent.Added", "counter.reset", "CounterEvent.Added"]);
        assert!(
            counter
                .uncommitted_events()
                .iter()
                .all(|e| e.metadata().aggregate_id() == "c-1"
                    && e.metadata().aggregate_type() == "counter")
        );
    }

    #[test]
    fn mark_committed_twice_leaves_nothing() {
        let mut counter = Counter::new("c-2".to_string());
        counter.raise(CounterEvent::Added { amount: 1 });

        counter.mark_committed();
        assert!(counter.uncommitted_events().is_empty());
        counter.mark_committed();
        assert!(counter.uncommitted_events().is_empty());
        assert_eq!(counter.value, 1);
    }

    #[test]
    fn pending_events_are_not_serialized() {
        let mut counter = Counter::new("c-3".to_string());
        counter.raise(CounterEvent::Added { amount: 5 });

        let json = serde_json::to_value(&counter).unwrap();
        assert!(json.get("pending_events").is_none());

        let restored: Counter = serde_json::from_value(json).unwrap();
        assert_eq!(restored.value, 5);
        assert!(restored.uncommitted_events().is_empty());
    }
}
