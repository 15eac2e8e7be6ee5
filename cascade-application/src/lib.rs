//! 应用层：待发送通知的批量投递
//!
//! - `notification`：通知条目聚合及其状态流转；
//! - `sender`：外部渠道适配器与显式投递结果；
//! - `repository`：待处理条目的分页读取；
//! - `processor`：逐条发送、逐条提交的批处理器；
//! - `worker`：周期驱动处理器的长驻任务；
//! - `object_store`：对象存储适配器边界。
//!
pub mod config;
pub mod error;
pub mod notification;
pub mod object_store;
pub mod processor;
pub mod repository;
pub mod sender;
pub mod worker;

pub use processor::{PendingNotificationProcessor, ProcessReport};
pub use worker::{NotificationWorker, WorkerHandle};
