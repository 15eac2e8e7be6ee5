//! cascade 过程宏（cascade-macros）
//!
//! - `#[entity]`：为结构体注入 `id`/`version`（以及可选的 `pending_events`）字段，
//!   并实现 `Entity`（与 `HasPendingEvents`）；
//! - `#[entity_id]`：为单字段 tuple struct 形式的标识实现 `Display`/`FromStr`；
//! - `#[event]`：为事件枚举实现 `DomainEvent`（事件类型与版本）。
//!
use proc_macro::TokenStream;

mod entity;
mod entity_id;
mod event;
mod utils;

/// 实体宏
/// - 追加字段：`id: IdType`, `version: usize`（若缺失）并置于字段最前
/// - `#[entity(events = EventType)]` 额外追加 `pending_events: PendingEvents<EventType>`，
///   并实现 `::cascade_domain::aggregate::HasPendingEvents`
/// - 自动实现 `::cascade_domain::entity::Entity`（`new/id/version`，要求 `Default`）
/// - 支持参数：`#[entity(id = IdType)]`，默认 `String`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 实体 ID 宏
/// 用于 `struct OrderId(Uuid);` 之类的单字段 tuple struct，实现：
/// - `Display`（委托内部类型）
/// - `FromStr`（委托内部类型解析）
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 事件宏，仅用于枚举：
/// - `#[event(version = N)]` 指定默认事件版本（默认 1）
/// - 事件类型默认 `Enum.Variant`，变体可通过 `#[event(event_type = "...", event_version = N)]` 覆写
#[proc_macro_attribute]
pub fn event(attr: TokenStream, item: TokenStream) -> TokenStream {
    event::expand(attr, item)
}
