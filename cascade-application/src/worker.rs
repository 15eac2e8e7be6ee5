//! 周期驱动（NotificationWorker）
//!
//! 单个逻辑工作者：按固定间隔触发一次批处理，错过的节拍直接跳过，
//! 同一时刻只有一批在运行。运行失败只记录日志，下一个节拍继续。
//!
use crate::config::WorkerConfig;
use crate::error::{AppError, AppResult};
use crate::processor::PendingNotificationProcessor;
use crate::sender::NotificationSender;
use bon::Builder;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Builder)]
pub struct NotificationWorker<S>
where
    S: NotificationSender,
{
    processor: PendingNotificationProcessor<S>,
    #[builder(default)]
    config: WorkerConfig,
}

impl<S> NotificationWorker<S>
where
    S: NotificationSender + 'static,
{
    /// 启动周期任务，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let run_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval = ?self.config.interval, "notification worker started");

            loop {
                tokio::select! {
                    _ = run_token.cancelled() => break,
                    _ = ticker.tick() => self.tick(&run_token).await,
                }
            }

            info!("notification worker stopped");
        });

        WorkerHandle {
            token,
            task: Some(task),
        }
    }

    async fn tick(&self, token: &CancellationToken) {
        match self.processor.process_pending_until(token).await {
            Ok(report) => debug!(?report, "notification run finished"),
            Err(err) => error!(error = %err, fatal = err.is_fatal(), "notification run failed"),
        }
    }
}

/// 运行句柄：用于优雅关闭与等待任务结束
pub struct WorkerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待任务结束；任务 panic 时返回 `AppError::Infra`
    pub async fn join(mut self) -> AppResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(|err| {
            error!(error = %err, "notification worker task failed");
            AppError::Infra(format!("notification worker task failed: {err}"))
        })
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
