use crate::notification::{Notification, NotificationStatus};
use async_trait::async_trait;
use cascade_domain::aggregate::Aggregate;
use cascade_domain::entity::Entity;
use cascade_domain::error::DomainResult;
use cascade_domain::persist::SnapshotReader;
use std::sync::Arc;

/// 待发送通知的读取端
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 最多 `limit` 条 Pending 通知：创建时间最早者优先，同一时刻按标识排序
    async fn pending(&self, limit: usize) -> DomainResult<Vec<Notification>>;
}

#[async_trait]
impl<T> NotificationRepository for Arc<T>
where
    T: NotificationRepository + ?Sized,
{
    async fn pending(&self, limit: usize) -> DomainResult<Vec<Notification>> {
        (**self).pending(limit).await
    }
}

/// 基于快照存储的实现
pub struct SnapshotNotificationRepository<R> {
    reader: R,
}

impl<R> SnapshotNotificationRepository<R>
where
    R: SnapshotReader,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> NotificationRepository for SnapshotNotificationRepository<R>
where
    R: SnapshotReader,
{
    async fn pending(&self, limit: usize) -> DomainResult<Vec<Notification>> {
        let mut pending = Vec::new();
        for snapshot in self.reader.load_all(Notification::TYPE).await? {
            let notification: Notification = snapshot.to_aggregate()?;
            if notification.status() == NotificationStatus::Pending {
                pending.push(notification);
            }
        }

        pending.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        pending.truncate(limit);
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationDraft;
    use cascade_domain::persist::InMemoryStore;
    use chrono::{Duration, Utc};

    fn queued(minutes_ago: i64) -> Notification {
        Notification::queue(
            NotificationDraft::builder()
                .channel("sms")
                .recipient(format!("+1555000{minutes_ago:04}"))
                .body("ping")
                .created_at(Utc::now() - Duration::minutes(minutes_ago))
                .build(),
        )
    }

    #[tokio::test]
    async fn oldest_pending_first_and_bounded() {
        let store = InMemoryStore::new();
        let mut sent = queued(60);
        sent.mark_sent().unwrap();
        store.seed(&sent).unwrap();
        for minutes_ago in [5, 30, 10, 20] {
            store.seed(&queued(minutes_ago)).unwrap();
        }

        let repo = SnapshotNotificationRepository::new(store);
        let page = repo.pending(3).await.unwrap();

        let recipients: Vec<_> = page.iter().map(|n| n.recipient()).collect();
        assert_eq!(recipients, ["+15550000030", "+15550000020", "+15550000010"]);
    }
}
