//! cascade 领域层基础库（cascade-domain）
//!
//! 提供“提交即分发”的领域层构件：
//! - 聚合（`aggregate`）与实体（`entity`）建模，聚合持有未提交的领域事件；
//! - 领域事件（`domain_event`）：显式事件标识、事件信封与未提交事件缓冲；
//! - 事件分发（`eventing`）：处理器、注册表与级联分发器（按波次直到不动点）；
//! - 工作单元（`unit_of_work`）：显式变更集与事务型提交；
//! - 持久化协议（`persist`）：分发/刷写形态、事务型存储与内存实现。
//!
//! 典型用法：
//! 1. 使用 `#[entity(events = ...)]` 与 `#[event]` 定义聚合与事件，实现 `Aggregate::apply`；
//! 2. 将要修改的聚合放入 `ChangeSet`，通过 `raise` 引发事件；
//! 3. 实现 `EventHandler` 响应事件（可继续修改工作集并引发新事件）；
//! 4. 调用 `TransactionalUnitOfWork::save` 完成分发与提交。
//!
pub mod aggregate;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod persist;
pub mod unit_of_work;

// 允许在本 crate 内部通过 ::cascade_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::cascade_domain 路径。
extern crate self as cascade_domain;
