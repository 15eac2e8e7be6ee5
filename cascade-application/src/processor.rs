//! 待发送通知批处理器（PendingNotificationProcessor）
//!
//! 每次运行选取一页 Pending 条目，逐条：
//! 1. 构造请求并通过渠道发送，得到显式的 `DeliveryOutcome`；
//! 2. 按结果流转为 Sent 或 Failed（每条恰好一次）；
//! 3. 立即以只包含该条目的变更集驱动一次工作单元提交。
//!
//! 单条失败不会阻塞后续条目；提交按条目进行，中途崩溃时已处理的条目持久，
//! 其余保持 Pending 等待下次运行。已发送但状态未能提交的条目可能被再次发送（至少一次）。
//! 提交本身失败则中止本次运行并向上返回。
//!
use crate::config::ProcessorConfig;
use crate::error::AppResult;
use crate::notification::{Notification, NotificationStatus};
use crate::repository::NotificationRepository;
use crate::sender::{DeliveryOutcome, NotificationSender};
use bon::Builder;
use cascade_domain::entity::Entity;
use cascade_domain::unit_of_work::{ChangeSet, UnitOfWork};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Builder)]
pub struct PendingNotificationProcessor<S>
where
    S: NotificationSender,
{
    repository: Arc<dyn NotificationRepository>,
    sender: Arc<S>,
    unit_of_work: Arc<dyn UnitOfWork>,
    #[builder(default)]
    config: ProcessorConfig,
}

/// 单次运行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// 本次选取的条目数
    pub selected: usize,
    pub sent: usize,
    pub failed: usize,
    /// 是否在处理完整页之前被取消
    pub cancelled: bool,
}

impl ProcessReport {
    pub fn processed(&self) -> usize {
        self.sent + self.failed
    }
}

impl<S> PendingNotificationProcessor<S>
where
    S: NotificationSender,
{
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// 处理一页待发送通知
    pub async fn process_pending(&self) -> AppResult<ProcessReport> {
        self.process_pending_until(&CancellationToken::new()).await
    }

    /// 处理一页待发送通知；取消信号只在条目之间检查
    #[tracing::instrument(
        name = "notifications.process_pending",
        skip_all,
        fields(page_size = self.config.page_size)
    )]
    pub async fn process_pending_until(&self, token: &CancellationToken) -> AppResult<ProcessReport> {
        let pending = self.repository.pending(self.config.page_size).await?;
        let mut report = ProcessReport {
            selected: pending.len(),
            ..ProcessReport::default()
        };

        for notification in pending {
            if token.is_cancelled() {
                report.cancelled = true;
                warn!(
                    remaining = report.selected - report.processed(),
                    "pending notification run cancelled"
                );
                break;
            }

            match self.process_one(notification).await? {
                NotificationStatus::Sent => report.sent += 1,
                _ => report.failed += 1,
            }
        }

        info!(
            selected = report.selected,
            sent = report.sent,
            failed = report.failed,
            cancelled = report.cancelled,
            "processed pending notifications"
        );
        Ok(report)
    }

    async fn process_one(&self, notification: Notification) -> AppResult<NotificationStatus> {
        let outcome = DeliveryOutcome::attempt(self.sender.as_ref(), &notification).await;

        let mut changes = ChangeSet::new();
        let item = changes.track(notification)?;
        match outcome {
            DeliveryOutcome::Delivered => item.mark_sent()?,
            DeliveryOutcome::Rejected { reason } => {
                warn!(
                    notification_id = %item.id(),
                    channel = item.channel(),
                    reason = reason.as_deref().unwrap_or_default(),
                    "notification rejected by channel"
                );
                item.mark_failed(reason)?;
            }
            DeliveryOutcome::Errored { message } => {
                error!(
                    notification_id = %item.id(),
                    channel = item.channel(),
                    error = %message,
                    "notification delivery errored"
                );
                item.mark_failed(Some(message))?;
            }
        }
        let status = item.status();

        self.unit_of_work.save(&mut changes).await?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationDraft;
    use crate::repository::SnapshotNotificationRepository;
    use crate::sender::NotificationResponse;
    use async_trait::async_trait;
    use cascade_domain::persist::InMemoryStore;
    use cascade_domain::unit_of_work::TransactionalUnitOfWork;
    use std::sync::Mutex;

    struct Ack;

    impl NotificationResponse for Ack {
        fn is_success(&self) -> bool {
            true
        }
    }

    /// 记录发送顺序，并在发送第 `cancel_after` 条后触发取消
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        type Request = String;
        type Response = Ack;

        fn to_request(&self, notification: &Notification) -> anyhow::Result<String> {
            Ok(notification.recipient().to_string())
        }

        async fn send(&self, request: String) -> anyhow::Result<Ack> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(request);
            if let Some((after, token)) = &self.cancel_after {
                if sent.len() == *after {
                    token.cancel();
                }
            }
            Ok(Ack)
        }
    }

    fn processor(
        store: &InMemoryStore,
        sender: Arc<RecordingSender>,
    ) -> PendingNotificationProcessor<RecordingSender> {
        PendingNotificationProcessor::builder()
            .repository(Arc::new(SnapshotNotificationRepository::new(store.clone())))
            .sender(sender)
            .unit_of_work(Arc::new(
                TransactionalUnitOfWork::builder()
                    .store(Arc::new(store.clone()))
                    .event_handlers(vec![])
                    .build(),
            ))
            .build()
    }

    fn seed(store: &InMemoryStore, count: usize) {
        for i in 0..count {
            let n = Notification::queue(
                NotificationDraft::builder()
                    .channel("email")
                    .recipient(format!("user{i}@example.com"))
                    .body("hi")
                    .build(),
            );
            store.seed(&n).unwrap();
        }
    }

    #[tokio::test]
    async fn cancellation_is_honoured_between_items() {
        let store = InMemoryStore::new();
        seed(&store, 5);

        let token = CancellationToken::new();
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            cancel_after: Some((2, token.clone())),
        });
        let report = processor(&store, sender.clone())
            .process_pending_until(&token)
            .await
            .unwrap();

        // 第二条在取消前已开始，会完整处理并提交
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
        assert_eq!(
            report,
            ProcessReport {
                selected: 5,
                sent: 2,
                failed: 0,
                cancelled: true
            }
        );
        assert_eq!(store.commits(), 2);
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let store = InMemoryStore::new();
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            cancel_after: None,
        });

        let report = processor(&store, sender).process_pending().await.unwrap();
        assert_eq!(report, ProcessReport::default());
        assert_eq!(store.commits(), 0);
    }
}
