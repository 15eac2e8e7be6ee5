//! 变更集（ChangeSet）
//!
//! 一次工作单元调用的显式工作集：被跟踪的聚合以类型擦除形式保存，
//! 分发器每一波都对完整工作集重新扫描未提交事件（包括上一波处理器新跟踪的聚合），
//! 处理器通过 `&mut ChangeSet` 读取、修改或新增聚合。
//!
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{SerializedEvent, SerializedSnapshot, serialize_events};
use std::any::Any;
use std::fmt;

/// 类型擦除后的被跟踪聚合
trait Tracked: Send + Sync {
    fn aggregate_type(&self) -> &'static str;
    fn aggregate_id(&self) -> String;
    fn uncommitted_events(&self) -> Result<Vec<SerializedEvent>>;
    fn mark_committed(&mut self);
    fn snapshot(&self) -> Result<SerializedSnapshot>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<A> Tracked for A
where
    A: Aggregate,
{
    fn aggregate_type(&self) -> &'static str {
        A::TYPE
    }

    fn aggregate_id(&self) -> String {
        self.id().to_string()
    }

    fn uncommitted_events(&self) -> Result<Vec<SerializedEvent>> {
        serialize_events(Aggregate::uncommitted_events(self))
    }

    fn mark_committed(&mut self) {
        Aggregate::mark_committed(self);
    }

    fn snapshot(&self) -> Result<SerializedSnapshot> {
        SerializedSnapshot::from_aggregate(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[derive(Default)]
pub struct ChangeSet {
    entries: Vec<Box<dyn Tracked>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 跟踪一个聚合；同一 (类型, 标识) 重复跟踪会报错
    pub fn track<A>(&mut self, aggregate: A) -> Result<&mut A>
    where
        A: Aggregate,
    {
        let aggregate_id = aggregate.id().to_string();
        if self
            .entries
            .iter()
            .any(|e| e.aggregate_type() == A::TYPE && e.aggregate_id() == aggregate_id)
        {
            return Err(DomainError::AlreadyTracked {
                aggregate_type: A::TYPE.to_string(),
                aggregate_id,
            });
        }

        self.entries.push(Box::new(aggregate));
        self.entries
            .last_mut()
            .and_then(|e| e.as_any_mut().downcast_mut::<A>())
            .ok_or_else(|| DomainError::TypeMismatch {
                expected: A::TYPE.to_string(),
                found: "unknown".to_string(),
            })
    }

    pub fn contains<A>(&self, aggregate_id: &str) -> bool
    where
        A: Aggregate,
    {
        self.position::<A>(aggregate_id).is_some()
    }

    pub fn get<A>(&self, aggregate_id: &str) -> Option<&A>
    where
        A: Aggregate,
    {
        let pos = self.position::<A>(aggregate_id)?;
        self.entries[pos].as_any().downcast_ref::<A>()
    }

    pub fn get_mut<A>(&mut self, aggregate_id: &str) -> Option<&mut A>
    where
        A: Aggregate,
    {
        let pos = self.position::<A>(aggregate_id)?;
        self.entries[pos].as_any_mut().downcast_mut::<A>()
    }

    /// 遍历某一类型的全部被跟踪聚合（跟踪顺序）
    pub fn iter<A>(&self) -> impl Iterator<Item = &A>
    where
        A: Aggregate,
    {
        self.entries
            .iter()
            .filter_map(|e| e.as_any().downcast_ref::<A>())
    }

    pub fn iter_mut<A>(&mut self) -> impl Iterator<Item = &mut A>
    where
        A: Aggregate,
    {
        self.entries
            .iter_mut()
            .filter_map(|e| e.as_any_mut().downcast_mut::<A>())
    }

    /// 停止跟踪并取回聚合
    pub fn remove<A>(&mut self, aggregate_id: &str) -> Option<A>
    where
        A: Aggregate,
    {
        let pos = self.position::<A>(aggregate_id)?;
        self.entries
            .remove(pos)
            .into_any()
            .downcast::<A>()
            .ok()
            .map(|boxed| *boxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 扫描完整工作集的未提交事件：按跟踪顺序，同一聚合内先引发者在前
    pub fn uncommitted_events(&self) -> Result<Vec<SerializedEvent>> {
        let mut events = Vec::new();
        for entry in &self.entries {
            events.extend(entry.uncommitted_events()?);
        }
        Ok(events)
    }

    /// 标记全部被跟踪聚合的事件为已提交
    pub fn mark_committed(&mut self) {
        for entry in &mut self.entries {
            entry.mark_committed();
        }
    }

    /// 全部被跟踪聚合的状态快照
    pub fn snapshots(&self) -> Result<Vec<SerializedSnapshot>> {
        self.entries.iter().map(|e| e.snapshot()).collect()
    }

    fn position<A>(&self, aggregate_id: &str) -> Option<usize>
    where
        A: Aggregate,
    {
        self.entries
            .iter()
            .position(|e| e.as_any().is::<A>() && e.aggregate_id() == aggregate_id)
    }
}

impl fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|e| format!("{}/{}", e.aggregate_type(), e.aggregate_id())),
            )
            .finish()
    }
}
