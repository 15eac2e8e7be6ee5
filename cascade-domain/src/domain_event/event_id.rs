use cascade_macros::entity_id;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件标识：在事件引发时生成一次，此后每次读取都保持不变，
/// 是单次提交内去重的唯一依据。
#[entity_id]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EventId;

    #[test]
    fn ids_are_unique_and_parse_back() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);

        let parsed: EventId = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);
    }
}
