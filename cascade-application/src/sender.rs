//! 外部渠道适配器（NotificationSender）
//!
//! 适配器分两步：纯函数 `to_request` 构造请求，`send` 执行挂起的网络调用。
//! 两步中的任何失败都在单条目边界被收敛为显式的 `DeliveryOutcome`，
//! 批处理器只根据结果值决定状态流转，不依赖错误冒泡。
//!
use crate::notification::Notification;
use async_trait::async_trait;

/// 渠道响应
pub trait NotificationResponse: Send {
    fn is_success(&self) -> bool;

    /// 渠道给出的失败原因（可为空）
    fn failure_reason(&self) -> Option<String> {
        None
    }
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    type Request: Send;
    type Response: NotificationResponse;

    /// 构造请求（不产生副作用）
    fn to_request(&self, notification: &Notification) -> anyhow::Result<Self::Request>;

    async fn send(&self, request: Self::Request) -> anyhow::Result<Self::Response>;
}

/// 单条目投递结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 渠道确认成功
    Delivered,
    /// 渠道明确拒绝（未抛错）
    Rejected { reason: Option<String> },
    /// 构造请求或发送过程出错
    Errored { message: String },
}

impl DeliveryOutcome {
    /// 构造请求并发送，将所有失败收敛为结果值
    pub async fn attempt<S>(sender: &S, notification: &Notification) -> Self
    where
        S: NotificationSender + ?Sized,
    {
        match deliver(sender, notification).await {
            Ok(response) if response.is_success() => Self::Delivered,
            Ok(response) => Self::Rejected {
                reason: response.failure_reason(),
            },
            Err(err) => Self::Errored {
                message: format!("process pending notification failed: {err:#}"),
            },
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

async fn deliver<S>(sender: &S, notification: &Notification) -> anyhow::Result<S::Response>
where
    S: NotificationSender + ?Sized,
{
    let request = sender.to_request(notification)?;
    sender.send(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationDraft;
    use anyhow::{Context, bail};

    struct Reply {
        ok: bool,
        reason: Option<String>,
    }

    impl NotificationResponse for Reply {
        fn is_success(&self) -> bool {
            self.ok
        }
        fn failure_reason(&self) -> Option<String> {
            self.reason.clone()
        }
    }

    /// 按收件人决定行为
    struct ScriptedSender;

    #[async_trait]
    impl NotificationSender for ScriptedSender {
        type Request = String;
        type Response = Reply;

        fn to_request(&self, notification: &Notification) -> anyhow::Result<String> {
            if notification.recipient() == "malformed" {
                bail!("bad payload");
            }
            Ok(notification.recipient().to_string())
        }

        async fn send(&self, request: String) -> anyhow::Result<Reply> {
            match request.as_str() {
                "ok" => Ok(Reply { ok: true, reason: None }),
                "rejects" => Ok(Reply {
                    ok: false,
                    reason: Some("unknown recipient".into()),
                }),
                _ => Err(anyhow::anyhow!("connection refused")).context("smtp relay"),
            }
        }
    }

    fn to(recipient: &str) -> Notification {
        Notification::queue(
            NotificationDraft::builder()
                .channel("email")
                .recipient(recipient)
                .body("hello")
                .build(),
        )
    }

    #[tokio::test]
    async fn outcomes_are_explicit() {
        assert_eq!(
            DeliveryOutcome::attempt(&ScriptedSender, &to("ok")).await,
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            DeliveryOutcome::attempt(&ScriptedSender, &to("rejects")).await,
            DeliveryOutcome::Rejected {
                reason: Some("unknown recipient".into())
            }
        );

        let DeliveryOutcome::Errored { message } =
            DeliveryOutcome::attempt(&ScriptedSender, &to("malformed")).await
        else {
            panic!("expected an errored outcome");
        };
        assert!(message.starts_with("process pending notification failed"));
        assert!(message.contains("bad payload"));
    }

    #[tokio::test]
    async fn transport_errors_keep_their_context_chain() {
        let outcome = DeliveryOutcome::attempt(&ScriptedSender, &to("offline")).await;
        let DeliveryOutcome::Errored { message } = outcome else {
            panic!("expected an errored outcome");
        };
        assert!(message.contains("smtp relay: connection refused"));
    }
}
