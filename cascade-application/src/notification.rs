//! 待发送通知（Notification）
//!
//! 上游写入方以 Pending 状态创建条目；每次处理尝试恰好流转一次到 Sent 或 Failed。
//! Failed 条目不会被批处理器自动重选，是否重试由外部调度通过 `requeue` 决定。
//!
use bon::Builder;
use cascade_domain::aggregate::Aggregate;
use cascade_domain::entity::Entity;
use cascade_domain::error::{DomainError, DomainResult};
use cascade_macros::{entity, entity_id, event};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[entity_id]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationEvent {
    #[event(event_type = "notification.queued")]
    Queued {
        channel: String,
        recipient: String,
        subject: Option<String>,
        body: String,
        payload: Value,
        at: DateTime<Utc>,
    },
    #[event(event_type = "notification.sent")]
    Sent { at: DateTime<Utc> },
    #[event(event_type = "notification.failed")]
    Failed {
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    #[event(event_type = "notification.requeued")]
    Requeued { at: DateTime<Utc> },
}

/// 新通知的内容
#[derive(Debug, Clone, Builder)]
pub struct NotificationDraft {
    #[builder(into)]
    channel: String,
    #[builder(into)]
    recipient: String,
    #[builder(into)]
    subject: Option<String>,
    #[builder(into)]
    body: String,
    #[builder(default)]
    payload: Value,
    #[builder(default = Utc::now())]
    created_at: DateTime<Utc>,
}

#[entity(id = NotificationId, events = NotificationEvent)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notification {
    channel: String,
    recipient: String,
    subject: Option<String>,
    body: String,
    payload: Value,
    status: NotificationStatus,
    failure_message: Option<String>,
    attempts: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Notification {
    const TYPE: &'static str = "notification";

    fn apply(&mut self, event: &Self::Event) {
        match event {
            NotificationEvent::Queued {
                channel,
                recipient,
                subject,
                body,
                payload,
                at,
            } => {
                self.channel = channel.clone();
                self.recipient = recipient.clone();
                self.subject = subject.clone();
                self.body = body.clone();
                self.payload = payload.clone();
                self.status = NotificationStatus::Pending;
                self.created_at = *at;
                self.updated_at = *at;
            }
            NotificationEvent::Sent { at } => {
                self.status = NotificationStatus::Sent;
                self.failure_message = None;
                self.attempts += 1;
                self.updated_at = *at;
            }
            NotificationEvent::Failed { reason, at } => {
                self.status = NotificationStatus::Failed;
                self.failure_message = reason.clone();
                self.attempts += 1;
                self.updated_at = *at;
            }
            NotificationEvent::Requeued { at } => {
                self.status = NotificationStatus::Pending;
                self.failure_message = None;
                self.updated_at = *at;
            }
        }
        self.version += 1;
    }
}

impl Notification {
    /// 以 Pending 状态创建通知
    pub fn queue(draft: NotificationDraft) -> Self {
        let mut notification = <Self as Entity>::new(NotificationId::new());
        notification.raise(NotificationEvent::Queued {
            channel: draft.channel,
            recipient: draft.recipient,
            subject: draft.subject,
            body: draft.body,
            payload: draft.payload,
            at: draft.created_at,
        });
        notification
    }

    pub fn mark_sent(&mut self) -> DomainResult<()> {
        self.ensure_pending("mark sent")?;
        self.raise(NotificationEvent::Sent { at: Utc::now() });
        Ok(())
    }

    /// 标记失败；`reason` 为渠道给出的原因或异常信息，可为空
    pub fn mark_failed(&mut self, reason: Option<String>) -> DomainResult<()> {
        self.ensure_pending("mark failed")?;
        self.raise(NotificationEvent::Failed {
            reason,
            at: Utc::now(),
        });
        Ok(())
    }

    /// 将失败条目重新放回待发送队列
    pub fn requeue(&mut self) -> DomainResult<()> {
        if self.status != NotificationStatus::Failed {
            return Err(DomainError::invalid_state(format!(
                "cannot requeue notification {} in status {:?}",
                self.id, self.status
            )));
        }
        self.raise(NotificationEvent::Requeued { at: Utc::now() });
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> DomainResult<()> {
        if self.status == NotificationStatus::Pending {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "cannot {action} notification {} in status {:?}",
                self.id, self.status
            )))
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn status(&self) -> NotificationStatus {
        self.status
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.failure_message.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_domain::domain_event::DomainEvent;
    use serde_json::json;

    fn draft() -> NotificationDraft {
        NotificationDraft::builder()
            .channel("email")
            .recipient("ops@example.com")
            .subject("disk usage")
            .body("volume /data is 91% full")
            .payload(json!({ "volume": "/data" }))
            .build()
    }

    #[test]
    fn queued_notification_is_pending_with_one_event() {
        let n = Notification::queue(draft());

        assert_eq!(n.status(), NotificationStatus::Pending);
        assert_eq!(n.channel(), "email");
        assert_eq!(n.subject(), Some("disk usage"));
        assert_eq!(n.version(), 1);
        assert_eq!(n.created_at(), n.updated_at());

        let events = n.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload().event_type(), "notification.queued");
        assert_eq!(events[0].metadata().aggregate_id(), n.id().to_string());
    }

    #[test]
    fn exactly_one_terminal_transition_per_attempt() {
        let mut n = Notification::queue(draft());
        n.mark_failed(Some("mailbox full".into())).unwrap();

        assert_eq!(n.status(), NotificationStatus::Failed);
        assert_eq!(n.failure_message(), Some("mailbox full"));
        assert_eq!(n.attempts(), 1);

        let err = n.mark_sent().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert!(n.mark_failed(None).is_err());
        assert_eq!(n.attempts(), 1);
    }

    #[test]
    fn requeue_only_from_failed() {
        let mut n = Notification::queue(draft());
        assert!(n.requeue().is_err());

        n.mark_failed(None).unwrap();
        n.requeue().unwrap();
        assert_eq!(n.status(), NotificationStatus::Pending);
        assert_eq!(n.failure_message(), None);

        n.mark_sent().unwrap();
        assert_eq!(n.status(), NotificationStatus::Sent);
        assert_eq!(n.attempts(), 2);
        assert!(n.requeue().is_err());
    }

    #[test]
    fn snapshot_round_trip_drops_pending_events() {
        let n = Notification::queue(draft());
        let json = serde_json::to_value(&n).unwrap();
        let restored: Notification = serde_json::from_value(json).unwrap();

        assert_eq!(restored.id(), n.id());
        assert_eq!(restored.payload(), &json!({ "volume": "/data" }));
        assert!(restored.uncommitted_events().is_empty());
    }
}
