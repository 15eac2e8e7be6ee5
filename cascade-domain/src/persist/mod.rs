//! 持久化（persist）
//!
//! 定义事件与聚合状态在持久化/分发层的标准形态，以及事务型存储协议：
//! - `SerializedEvent`：分发给事件处理器的事件形态（携带显式事件标识）；
//! - `SerializedSnapshot`：工作单元刷写到存储的聚合状态；
//! - `TransactionalStore`/`StoreTransaction`：开启、刷写、提交、回滚；
//! - `SnapshotReader`：只读取已提交状态；
//! - `InMemoryStore`：内存实现（测试、示例与本地开发）。
//!
//! 该模块聚焦协议，具体存储后端（如 Postgres）由上层提供实现并注入。
//!
#[cfg(feature = "inmemory")]
mod inmemory;
mod serialized_event;
mod serialized_snapshot;
mod store;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
pub use serialized_event::{SerializedEvent, serialize_events};
pub use serialized_snapshot::SerializedSnapshot;
pub use store::{SnapshotReader, StoreTransaction, TransactionalStore};
