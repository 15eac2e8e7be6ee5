/// 级联分发示例（内存版）
/// 下单 → 扣减库存 → 库存不足时自动生成补货单，全部在一次提交内完成
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use cascade_domain::aggregate::Aggregate;
use cascade_domain::entity::Entity;
use cascade_domain::eventing::{EventHandler, HandledEventType};
use cascade_domain::persist::{InMemoryStore, SerializedEvent};
use cascade_domain::unit_of_work::{ChangeSet, TransactionalUnitOfWork, UnitOfWork};
use cascade_macros::{entity, event};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// 聚合
// ============================================================================

#[entity(events = OrderEvent)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Order {
    lines: Vec<(String, u32)>,
}

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum OrderEvent {
    #[event(event_type = "order.placed")]
    Placed { lines: Vec<(String, u32)> },
}

impl Aggregate for Order {
    const TYPE: &'static str = "order";

    fn apply(&mut self, event: &Self::Event) {
        let OrderEvent::Placed { lines } = event;
        self.lines = lines.clone();
        self.version += 1;
    }
}

#[entity(events = InventoryEvent)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Inventory {
    on_hand: u32,
    reorder_at: u32,
}

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum InventoryEvent {
    #[event(event_type = "inventory.decremented")]
    Decremented { qty: u32 },
    #[event(event_type = "inventory.low")]
    Low { on_hand: u32 },
}

impl Aggregate for Inventory {
    const TYPE: &'static str = "inventory";

    fn apply(&mut self, event: &Self::Event) {
        if let InventoryEvent::Decremented { qty } = event {
            self.on_hand = self.on_hand.saturating_sub(*qty);
        }
        self.version += 1;
    }
}

#[entity(events = ReorderEvent)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Reorder {
    sku: String,
}

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ReorderEvent {
    #[event(event_type = "reorder.opened")]
    Opened { sku: String },
}

impl Aggregate for Reorder {
    const TYPE: &'static str = "reorder";

    fn apply(&mut self, event: &Self::Event) {
        let ReorderEvent::Opened { sku } = event;
        self.sku = sku.clone();
        self.version += 1;
    }
}

// ============================================================================
// 处理器
// ============================================================================

struct DecrementStock;

#[async_trait]
impl EventHandler for DecrementStock {
    fn handler_name(&self) -> &str {
        "decrement_stock"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("order.placed".into())
    }

    async fn handle(&self, event: &SerializedEvent, changes: &mut ChangeSet) -> AnyResult<()> {
        let OrderEvent::Placed { lines } = event.decode::<OrderEvent>()?.payload().clone();
        for (sku, qty) in lines {
            let inventory = changes
                .get_mut::<Inventory>(&sku)
                .ok_or_else(|| anyhow::anyhow!("inventory {sku} is not loaded"))?;
            inventory.raise(InventoryEvent::Decremented { qty });
            if inventory.on_hand <= inventory.reorder_at {
                let on_hand = inventory.on_hand;
                inventory.raise(InventoryEvent::Low { on_hand });
            }
        }
        Ok(())
    }
}

struct OpenReorder;

#[async_trait]
impl EventHandler for OpenReorder {
    fn handler_name(&self) -> &str {
        "open_reorder"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("inventory.low".into())
    }

    async fn handle(&self, event: &SerializedEvent, changes: &mut ChangeSet) -> AnyResult<()> {
        let sku = event.aggregate_id().to_string();
        let reorder_id = format!("reorder-{sku}");
        if !changes.contains::<Reorder>(&reorder_id) {
            changes
                .track(Reorder::new(reorder_id))?
                .raise(ReorderEvent::Opened { sku });
        }
        Ok(())
    }
}

struct PrintAll;

#[async_trait]
impl EventHandler for PrintAll {
    fn handler_name(&self) -> &str {
        "print_all"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    async fn handle(&self, event: &SerializedEvent, _changes: &mut ChangeSet) -> AnyResult<()> {
        println!(
            "  {} {}/{} {}",
            event.event_type(),
            event.aggregate_type(),
            event.aggregate_id(),
            event.payload()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let store = InMemoryStore::new();
    for (sku, on_hand) in [("apple", 10), ("pear", 3)] {
        let mut inventory = Inventory::new(sku.to_string());
        inventory.on_hand = on_hand;
        inventory.reorder_at = 2;
        store.seed(&inventory)?;
    }

    let uow = TransactionalUnitOfWork::builder()
        .store(Arc::new(store.clone()))
        .event_handlers(vec![
            Arc::new(DecrementStock),
            Arc::new(OpenReorder),
            Arc::new(PrintAll),
        ])
        .build();

    let mut changes = ChangeSet::new();
    for sku in ["apple", "pear"] {
        if let Some(inventory) = store.get::<Inventory>(sku)? {
            changes.track(inventory)?;
        }
    }
    changes
        .track(Order::new("order-1".into()))?
        .raise(OrderEvent::Placed {
            lines: vec![("apple".into(), 4), ("pear".into(), 2)],
        });

    println!("dispatching:");
    let report = uow.save(&mut changes).await?;
    println!(
        "committed: waves={}, dispatched={}, flushed={}",
        report.waves, report.dispatched, report.flushed
    );

    for inventory in store.list::<Inventory>()? {
        println!("  inventory {} on_hand={}", inventory.id(), inventory.on_hand);
    }
    for reorder in store.list::<Reorder>()? {
        println!("  reorder {} for {}", reorder.id(), reorder.sku);
    }
    Ok(())
}
