//! 事件子系统（eventing）
//!
//! 提供工作单元提交时的事件分发：
//! - `EventHandler`：对某类/多类/全部事件进行处理，可修改工作集中的聚合并引发新事件；
//! - `HandlerRegistry`：按事件类型索引处理器；
//! - `EventDispatcher`：按波次分发并重新扫描工作集，直到不再出现未分发事件（不动点）。
//!
pub mod dispatcher;
pub mod handler;
pub mod registry;

pub use dispatcher::{DispatchReport, EventDispatcher};
pub use handler::{EventHandler, HandledEventType};
pub use registry::HandlerRegistry;
