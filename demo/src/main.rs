//! 本地演示：内存存储 + 控制台渠道 + 周期工作者
//!
//! `RUST_LOG=debug cargo run -p cascade-demo`
//!
use anyhow::{Result, bail};
use async_trait::async_trait;
use cascade_application::config::{POLL_INTERVAL_ENV, ProcessorConfig, WorkerConfig};
use cascade_application::notification::{Notification, NotificationDraft, NotificationEvent, NotificationStatus};
use cascade_application::repository::SnapshotNotificationRepository;
use cascade_application::sender::{NotificationResponse, NotificationSender};
use cascade_application::{NotificationWorker, PendingNotificationProcessor};
use cascade_domain::eventing::{EventHandler, HandledEventType};
use cascade_domain::persist::{InMemoryStore, SerializedEvent};
use cascade_domain::unit_of_work::{ChangeSet, TransactionalUnitOfWork};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, prelude::*};

/// 控制台渠道：收件人不含 `@` 视为拒收，正文为空视为请求构造失败
struct ConsoleChannel;

struct ConsoleReply {
    accepted: bool,
}

impl NotificationResponse for ConsoleReply {
    fn is_success(&self) -> bool {
        self.accepted
    }

    fn failure_reason(&self) -> Option<String> {
        (!self.accepted).then(|| "recipient is not an address".to_string())
    }
}

#[async_trait]
impl NotificationSender for ConsoleChannel {
    type Request = (String, String);
    type Response = ConsoleReply;

    fn to_request(&self, notification: &Notification) -> Result<Self::Request> {
        if notification.body().is_empty() {
            bail!("bad payload: empty body");
        }
        Ok((notification.recipient().to_string(), notification.body().to_string()))
    }

    async fn send(&self, request: Self::Request) -> Result<ConsoleReply> {
        let (to, body) = request;
        let accepted = to.contains('@');
        if accepted {
            info!(%to, %body, "console channel delivered");
        }
        Ok(ConsoleReply { accepted })
    }
}

/// 投递失败时给值班人员追加一条告警
struct Escalate;

#[async_trait]
impl EventHandler for Escalate {
    fn handler_name(&self) -> &str {
        "escalate"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("notification.failed".into())
    }

    async fn handle(&self, event: &SerializedEvent, changes: &mut ChangeSet) -> Result<()> {
        if let NotificationEvent::Failed { reason, .. } = event.decode::<NotificationEvent>()?.payload() {
            changes.track(Notification::queue(
                NotificationDraft::builder()
                    .channel("console")
                    .recipient("oncall@example.com")
                    .subject("delivery failed")
                    .body(format!(
                        "{}: {}",
                        event.aggregate_id(),
                        reason.as_deref().unwrap_or("rejected")
                    ))
                    .build(),
            ))?;
        }
        Ok(())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let worker_config = match std::env::var_os(POLL_INTERVAL_ENV) {
        Some(_) => WorkerConfig::from_env()?,
        None => WorkerConfig {
            interval: Duration::from_secs(1),
        },
    };

    let store = InMemoryStore::new();
    for (recipient, body) in [
        ("alice@example.com", "your export is ready"),
        ("bob", "password changed"),
        ("carol@example.com", ""),
    ] {
        store.seed(&Notification::queue(
            NotificationDraft::builder()
                .channel("console")
                .recipient(recipient)
                .body(body)
                .payload(json!({ "source": "demo" }))
                .build(),
        ))?;
    }

    let processor = PendingNotificationProcessor::builder()
        .repository(Arc::new(SnapshotNotificationRepository::new(store.clone())))
        .sender(Arc::new(ConsoleChannel))
        .unit_of_work(Arc::new(
            TransactionalUnitOfWork::builder()
                .store(Arc::new(store.clone()))
                .event_handlers(vec![Arc::new(Escalate)])
                .build(),
        ))
        .config(ProcessorConfig::from_env()?)
        .build();

    let worker = Arc::new(
        NotificationWorker::builder()
            .processor(processor)
            .config(worker_config)
            .build(),
    );
    let handle = worker.start();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = tokio::time::sleep(worker_config.interval * 3) => {}
    }
    handle.shutdown();
    handle.join().await?;

    for n in store.list::<Notification>()? {
        let status = match n.status() {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        };
        info!(
            recipient = n.recipient(),
            status,
            failure = n.failure_message().unwrap_or_default(),
            "final state"
        );
    }
    info!(commits = store.commits(), rollbacks = store.rollbacks(), "done");
    Ok(())
}
