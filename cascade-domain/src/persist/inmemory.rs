//! 内存版事务存储（InMemoryStore）
//!
//! 满足 `TransactionalStore` 与 `SnapshotReader` 协议的轻量实现：
//! - 事务内刷写的快照先暂存，提交时整体生效，回滚时整体丢弃；
//! - 事务串行执行：后开启的事务等待前一个提交或回滚后才开始；
//! - 刷写版本低于已提交版本的快照视为并发冲突；
//! - 支持注入一次性的刷写/提交失败，便于验证原子性。
//!
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::{SerializedSnapshot, SnapshotReader, StoreTransaction, TransactionalStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (String, String);

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    committed: Mutex<BTreeMap<Key, SerializedSnapshot>>,
    faults: Mutex<Faults>,
    gate: Arc<AsyncMutex<()>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    flush: Option<String>,
    commit: Option<String>,
}

impl Inner {
    fn committed(&self) -> Result<MutexGuard<'_, BTreeMap<Key, SerializedSnapshot>>> {
        self.committed
            .lock()
            .map_err(|_| DomainError::persistence("in-memory store lock poisoned"))
    }

    fn take_fault(&self, pick: impl FnOnce(&mut Faults) -> Option<String>) -> Result<Option<String>> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| DomainError::persistence("in-memory store lock poisoned"))?;
        Ok(pick(&mut faults))
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绕过事务直接写入已提交状态（用于准备数据）
    pub fn seed<A>(&self, aggregate: &A) -> Result<()>
    where
        A: Aggregate,
    {
        let snapshot = SerializedSnapshot::from_aggregate(aggregate)?;
        self.inner.committed()?.insert(snapshot.key(), snapshot);
        Ok(())
    }

    /// 读取已提交的聚合
    pub fn get<A>(&self, aggregate_id: &str) -> Result<Option<A>>
    where
        A: Aggregate,
    {
        let committed = self.inner.committed()?;
        committed
            .get(&(A::TYPE.to_string(), aggregate_id.to_string()))
            .map(|s| s.to_aggregate::<A>())
            .transpose()
    }

    /// 读取某一类型的全部已提交聚合
    pub fn list<A>(&self) -> Result<Vec<A>>
    where
        A: Aggregate,
    {
        let committed = self.inner.committed()?;
        committed
            .iter()
            .filter(|((ty, _), _)| ty == A::TYPE)
            .map(|(_, s)| s.to_aggregate::<A>())
            .collect()
    }

    /// 已提交快照总数
    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.committed()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// 下一次刷写失败
    pub fn fail_next_flush(&self, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.inner.take_fault(|f| f.flush.replace(reason))?;
        Ok(())
    }

    /// 下一次提交失败
    pub fn fail_next_commit(&self, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.inner.take_fault(|f| f.commit.replace(reason))?;
        Ok(())
    }

    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        // 持有闸门直到事务结束（提交、回滚或丢弃）
        let permit = self.inner.gate.clone().lock_owned().await;

        Ok(Box::new(InMemoryTransaction {
            inner: self.inner.clone(),
            staged: BTreeMap::new(),
            _permit: permit,
        }))
    }
}

#[async_trait]
impl SnapshotReader for InMemoryStore {
    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Option<SerializedSnapshot>> {
        let committed = self.inner.committed()?;
        Ok(committed
            .get(&(aggregate_type.to_string(), aggregate_id.to_string()))
            .cloned())
    }

    async fn load_all(&self, aggregate_type: &str) -> Result<Vec<SerializedSnapshot>> {
        let committed = self.inner.committed()?;
        Ok(committed
            .iter()
            .filter(|((ty, _), _)| ty == aggregate_type)
            .map(|(_, s)| s.clone())
            .collect())
    }
}

struct InMemoryTransaction {
    inner: Arc<Inner>,
    staged: BTreeMap<Key, SerializedSnapshot>,
    _permit: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn flush(&mut self, snapshots: &[SerializedSnapshot]) -> Result<()> {
        if let Some(reason) = self.inner.take_fault(|f| f.flush.take())? {
            return Err(DomainError::persistence(reason));
        }

        let committed = self.inner.committed()?;
        for snapshot in snapshots {
            if let Some(current) = committed.get(&snapshot.key()) {
                snapshot.ensure_not_stale(current)?;
            }
        }
        drop(committed);

        for snapshot in snapshots {
            self.staged.insert(snapshot.key(), snapshot.clone());
        }
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        if let Some(reason) = self.inner.take_fault(|f| f.commit.take())? {
            return Err(DomainError::transaction(reason));
        }

        let staged = std::mem::take(&mut self.staged);
        self.inner.committed()?.extend(staged);
        self.inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.staged.clear();
        self.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn snapshot(id: &str, version: usize) -> SerializedSnapshot {
        SerializedSnapshot::builder()
            .aggregate_id(id.to_string())
            .aggregate_type("widget".to_string())
            .aggregate_version(version)
            .payload(json!({ "id": id, "version": version }))
            .build()
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.flush(&[snapshot("w-1", 1)]).await.unwrap();
        assert!(store.load("widget", "w-1").await.unwrap().is_none());

        tx.commit().await.unwrap();
        let loaded = store.load("widget", "w-1").await.unwrap().unwrap();
        assert_eq!(loaded.aggregate_version(), 1);
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.flush(&[snapshot("w-1", 1)]).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.is_empty().unwrap());
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn concurrent_transactions_wait_their_turn() {
        let store = InMemoryStore::new();

        let mut first = store.begin().await.unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(20), store.begin())
                .await
                .is_err()
        );

        let second = tokio::spawn({
            let store = store.clone();
            async move {
                let mut tx = store.begin().await?;
                tx.flush(&[snapshot("w-2", 1)]).await?;
                tx.commit().await
            }
        });

        first.flush(&[snapshot("w-1", 1)]).await.unwrap();
        first.commit().await.unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.commits(), 2);
    }

    #[tokio::test]
    async fn dropped_transaction_releases_the_store() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.flush(&[snapshot("w-1", 1)]).await.unwrap();
        drop(tx);

        let next = tokio::time::timeout(Duration::from_millis(20), store.begin()).await;
        assert!(next.is_ok());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.flush(&[snapshot("w-1", 3)]).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx.flush(&[snapshot("w-1", 2)]).await.unwrap_err();
        assert!(matches!(err, DomainError::VersionConflict { actual: 3, .. }));
    }

    #[tokio::test]
    async fn injected_faults_fire_once() {
        let store = InMemoryStore::new();
        store.fail_next_flush("disk full").unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.flush(&[snapshot("w-1", 1)]).await.is_err());
        assert!(tx.flush(&[snapshot("w-1", 1)]).await.is_ok());

        store.fail_next_commit("connection reset").unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::Transaction { .. }));
        assert!(store.load_all("widget").await.unwrap().is_empty());
    }
}
